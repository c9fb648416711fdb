//! Update orchestration core
//!
//! [`Updater`] owns the collaborator handles and runs the three guarded
//! workflows: image update detection, stack redeploy, and container stop.
//! Every workflow funnels through the shared [`StatusGuard`]; a trigger that
//! finds the guard taken abandons its operation.

pub mod images;
pub mod stacks;
pub mod stop;

pub use images::ImageUpdateOutcome;
pub use stacks::StackUpdateSummary;
pub use stop::StopSummary;

use std::sync::Arc;

use crate::portainer::StacksApi;
use crate::runtime::ContainerRuntime;
use crate::status::{OperationStatus, StatusGuard};

/// Update workflow executor.
pub struct Updater {
    guard: Arc<StatusGuard>,
    runtime: Arc<dyn ContainerRuntime>,
    stacks_api: Option<Arc<dyn StacksApi>>,
}

impl Updater {
    pub fn new(
        guard: Arc<StatusGuard>,
        runtime: Arc<dyn ContainerRuntime>,
        stacks_api: Option<Arc<dyn StacksApi>>,
    ) -> Self {
        Self {
            guard,
            runtime,
            stacks_api,
        }
    }

    pub(crate) fn guard(&self) -> &Arc<StatusGuard> {
        &self.guard
    }

    pub(crate) fn runtime(&self) -> &dyn ContainerRuntime {
        self.runtime.as_ref()
    }

    pub(crate) fn stacks_api(&self) -> Option<&dyn StacksApi> {
        self.stacks_api.as_deref()
    }

    /// Current operation status.
    pub fn status(&self) -> OperationStatus {
        self.guard.current()
    }

    /// Force the status back to idle. Used at the orchestrator boundary
    /// after an unexpected workflow failure so a wedged status cannot
    /// outlive the call.
    pub fn reset_status(&self) {
        self.guard.release();
    }
}
