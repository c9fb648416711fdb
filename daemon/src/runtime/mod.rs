//! Container runtime collaborator boundary

pub mod docker;

use async_trait::async_trait;

use crate::errors::DaemonError;

/// A running container as seen by an update pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningContainer {
    /// Container name, leading separator stripped
    pub name: String,

    /// Image id the container was started from
    pub image_id: String,

    /// Declared image reference, as written in the container config
    pub image: String,
}

/// Operations the update workflows need from the container runtime.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List currently running containers.
    async fn list_running(&self) -> Result<Vec<RunningContainer>, DaemonError>;

    /// Pull an image reference and return the resulting image id.
    async fn pull(&self, reference: &str) -> Result<String, DaemonError>;

    /// Stop a container by name.
    async fn stop(&self, name: &str) -> Result<(), DaemonError>;
}
