//! Container stop workflow

use tracing::{error, info, warn};

use crate::errors::DaemonError;
use crate::status::OperationStatus;
use crate::update::Updater;

/// Result of one stop pass.
#[derive(Debug, Clone, Default)]
pub struct StopSummary {
    /// Containers stopped
    pub stopped: Vec<String>,

    /// Containers that could not be stopped; the pass continued
    pub failed: Vec<String>,
}

impl Updater {
    /// Stop the named containers via the runtime.
    ///
    /// A failure on a single container (unknown name included) is recorded
    /// and the pass continues. Returns `Ok(None)` when another operation
    /// holds the status guard.
    pub async fn stop_containers(
        &self,
        names: &[String],
    ) -> Result<Option<StopSummary>, DaemonError> {
        let Some(_permit) = self
            .guard()
            .acquire_scoped(OperationStatus::StoppingContainers)
        else {
            return Ok(None);
        };

        let mut summary = StopSummary::default();

        for name in names {
            info!("Stopping container: {}", name);

            match self.runtime().stop(name).await {
                Ok(()) => summary.stopped.push(name.clone()),
                Err(e) => {
                    error!("Stopping container {} failed: {}", name, e);
                    summary.failed.push(name.clone());
                }
            }
        }

        if !summary.failed.is_empty() {
            warn!(
                "Stop pass completed with failures: {} stopped, {} failed",
                summary.stopped.len(),
                summary.failed.len()
            );
        }

        Ok(Some(summary))
    }
}
