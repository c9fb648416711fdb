//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::errors::DaemonError;
use crate::portainer::client::PortainerClient;
use crate::portainer::StacksApi;
use crate::runtime::docker::DockerCli;
use crate::status::StatusGuard;
use crate::update::Updater;

/// Main application state
pub struct AppState {
    /// Single-flight operation status guard
    pub guard: Arc<StatusGuard>,

    /// Update workflow executor
    pub updater: Arc<Updater>,
}

impl AppState {
    /// Initialize application state
    pub fn init(options: &AppOptions) -> Result<AppState, DaemonError> {
        info!("Initializing application state...");

        let guard = Arc::new(StatusGuard::new());
        let runtime = Arc::new(DockerCli::new());

        let stacks_api: Option<Arc<dyn StacksApi>> = match &options.management_api.host {
            Some(host) => {
                let client = PortainerClient::new(
                    host,
                    options.management_api.ssl,
                    options.management_api.username.clone(),
                    options.management_api.password.clone(),
                )?;
                Some(Arc::new(client))
            }
            None => {
                info!("Management API host not configured, stack updates disabled.");
                None
            }
        };

        let updater = Arc::new(Updater::new(guard.clone(), runtime, stacks_api));

        Ok(AppState { guard, updater })
    }
}
