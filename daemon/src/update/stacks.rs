//! Stack redeploy workflow

use tracing::{error, info, warn};

use crate::errors::DaemonError;
use crate::status::OperationStatus;
use crate::update::Updater;

/// Result of one stack-update pass.
#[derive(Debug, Clone, Default)]
pub struct StackUpdateSummary {
    /// Stacks fetched and redeployed
    pub updated: Vec<String>,

    /// Stacks not selected by the request
    pub skipped: Vec<String>,

    /// Stacks whose fetch or redeploy failed; the pass continued
    pub failed: Vec<String>,
}

impl Updater {
    /// Redeploy the selected stacks through the management API.
    ///
    /// Authenticates, lists all stacks, then fetches and redeploys each
    /// stack named in `include_stacks` (all stacks when `None`). An
    /// authentication or listing failure aborts the whole operation; a
    /// failure on a single stack is recorded and the pass continues.
    /// Returns `Ok(None)` when another operation holds the status guard.
    pub async fn update_stacks(
        &self,
        include_stacks: Option<&[String]>,
    ) -> Result<Option<StackUpdateSummary>, DaemonError> {
        let Some(api) = self.stacks_api() else {
            return Err(DaemonError::ConfigError(
                "Management API host is not configured".to_string(),
            ));
        };

        let Some(_permit) = self
            .guard()
            .acquire_scoped(OperationStatus::UpdatingStacks)
        else {
            return Ok(None);
        };

        let token = api.authenticate().await?;

        info!("Get stacks from the management API");
        let stacks = api.list_stacks(&token).await?;

        let mut summary = StackUpdateSummary::default();

        for stack in stacks {
            let selected = include_stacks
                .map(|names| names.iter().any(|name| name == &stack.name))
                .unwrap_or(true);

            if !selected {
                info!("Skip stack {} [#{}]", stack.name, stack.id);
                summary.skipped.push(stack.name);
                continue;
            }

            info!("Get stack {} [#{}]", stack.name, stack.id);
            let content = match api.stack_file(&token, stack.id).await {
                Ok(content) => content,
                Err(e) => {
                    error!("Fetching stack {} failed: {}", stack.name, e);
                    summary.failed.push(stack.name);
                    continue;
                }
            };

            info!("Redeploy stack {} [#{}]", stack.name, stack.id);
            match api.redeploy_stack(&token, stack.id, &content).await {
                Ok(()) => summary.updated.push(stack.name),
                Err(e) => {
                    error!("Redeploying stack {} failed: {}", stack.name, e);
                    summary.failed.push(stack.name);
                }
            }
        }

        if summary.failed.is_empty() {
            info!(
                "Stack update completed: {} updated, {} skipped",
                summary.updated.len(),
                summary.skipped.len()
            );
        } else {
            warn!(
                "Stack update completed with failures: {} updated, {} skipped, {} failed",
                summary.updated.len(),
                summary.skipped.len(),
                summary.failed.len()
            );
        }

        Ok(Some(summary))
    }
}
