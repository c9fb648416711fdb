//! Update workflow unit tests with fake collaborators

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use stackward::errors::DaemonError;
use stackward::portainer::{Stack, StacksApi};
use stackward::runtime::{ContainerRuntime, RunningContainer};
use stackward::status::{OperationStatus, StatusGuard};
use stackward::update::Updater;

// ================================ FAKES ========================================= //

#[derive(Default)]
struct FakeRuntime {
    containers: Vec<RunningContainer>,
    /// reference -> pulled image id, or an error message
    pull_results: HashMap<String, Result<String, String>>,
    fail_stops: HashSet<String>,
    pulls: Mutex<Vec<String>>,
    stops: Mutex<Vec<String>>,
}

impl FakeRuntime {
    fn with_container(mut self, name: &str, image_id: &str, image: &str) -> Self {
        self.containers.push(RunningContainer {
            name: name.to_string(),
            image_id: image_id.to_string(),
            image: image.to_string(),
        });
        self
    }

    fn with_pull(mut self, reference: &str, image_id: &str) -> Self {
        self.pull_results
            .insert(reference.to_string(), Ok(image_id.to_string()));
        self
    }

    fn with_pull_error(mut self, reference: &str, message: &str) -> Self {
        self.pull_results
            .insert(reference.to_string(), Err(message.to_string()));
        self
    }

    fn with_failing_stop(mut self, name: &str) -> Self {
        self.fail_stops.insert(name.to_string());
        self
    }

    fn pulled(&self) -> Vec<String> {
        self.pulls.lock().unwrap().clone()
    }

    fn stopped(&self) -> Vec<String> {
        self.stops.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_running(&self) -> Result<Vec<RunningContainer>, DaemonError> {
        Ok(self.containers.clone())
    }

    async fn pull(&self, reference: &str) -> Result<String, DaemonError> {
        self.pulls.lock().unwrap().push(reference.to_string());

        match self.pull_results.get(reference) {
            Some(Ok(image_id)) => Ok(image_id.clone()),
            Some(Err(message)) => Err(DaemonError::RuntimeError(message.clone())),
            None => Err(DaemonError::RuntimeError(format!(
                "unexpected pull: {reference}"
            ))),
        }
    }

    async fn stop(&self, name: &str) -> Result<(), DaemonError> {
        self.stops.lock().unwrap().push(name.to_string());

        if self.fail_stops.contains(name) {
            Err(DaemonError::RuntimeError(format!("no such container: {name}")))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
struct FakeStacksApi {
    stacks: Vec<Stack>,
    fail_auth: bool,
    fail_redeploys: HashSet<i64>,
    fetched: Mutex<Vec<i64>>,
    redeployed: Mutex<Vec<i64>>,
}

impl FakeStacksApi {
    fn with_stack(mut self, id: i64, name: &str) -> Self {
        self.stacks.push(Stack {
            id,
            name: name.to_string(),
        });
        self
    }

    fn with_auth_failure(mut self) -> Self {
        self.fail_auth = true;
        self
    }

    fn with_failing_redeploy(mut self, id: i64) -> Self {
        self.fail_redeploys.insert(id);
        self
    }

    fn fetched_ids(&self) -> Vec<i64> {
        self.fetched.lock().unwrap().clone()
    }

    fn redeployed_ids(&self) -> Vec<i64> {
        self.redeployed.lock().unwrap().clone()
    }
}

#[async_trait]
impl StacksApi for FakeStacksApi {
    async fn authenticate(&self) -> Result<String, DaemonError> {
        if self.fail_auth {
            Err(DaemonError::AuthError("401 Unauthorized".to_string()))
        } else {
            Ok("jwt-token".to_string())
        }
    }

    async fn list_stacks(&self, _token: &str) -> Result<Vec<Stack>, DaemonError> {
        Ok(self.stacks.clone())
    }

    async fn stack_file(
        &self,
        _token: &str,
        stack_id: i64,
    ) -> Result<serde_json::Value, DaemonError> {
        self.fetched.lock().unwrap().push(stack_id);
        Ok(serde_json::json!({ "StackFileContent": "version: '3'" }))
    }

    async fn redeploy_stack(
        &self,
        _token: &str,
        stack_id: i64,
        _content: &serde_json::Value,
    ) -> Result<(), DaemonError> {
        self.redeployed.lock().unwrap().push(stack_id);

        if self.fail_redeploys.contains(&stack_id) {
            Err(DaemonError::ApiError("500 Internal Server Error".to_string()))
        } else {
            Ok(())
        }
    }
}

fn new_updater(
    runtime: Arc<FakeRuntime>,
    stacks_api: Option<Arc<FakeStacksApi>>,
) -> (Arc<StatusGuard>, Updater) {
    let guard = Arc::new(StatusGuard::new());
    let updater = Updater::new(
        guard.clone(),
        runtime,
        stacks_api.map(|api| api as Arc<dyn StacksApi>),
    );
    (guard, updater)
}

// ============================ IMAGE WORKFLOW ==================================== //

#[tokio::test]
async fn test_image_update_reports_changed_container() {
    let runtime = Arc::new(
        FakeRuntime::default()
            .with_container("web", "sha256:old", "nginx:1.25")
            .with_pull("nginx:1.25", "sha256:new"),
    );
    let (guard, updater) = new_updater(runtime.clone(), None);

    let outcome = updater.update_images().await.unwrap().unwrap();

    assert_eq!(outcome.report.len(), 1);
    let change = &outcome.report.containers[0];
    assert_eq!(change.container_name, "web");
    assert_eq!(change.image_name, "nginx:1.25");
    assert_eq!(change.image_id, "sha256:old");
    assert_eq!(change.new_image_id, "sha256:new");

    assert!(outcome.failed.is_empty());
    assert_eq!(guard.current(), OperationStatus::Idle);
}

#[tokio::test]
async fn test_image_update_empty_report_when_current() {
    let runtime = Arc::new(
        FakeRuntime::default()
            .with_container("web", "sha256:same", "nginx:1.25")
            .with_pull("nginx:1.25", "sha256:same"),
    );
    let (_guard, updater) = new_updater(runtime.clone(), None);

    let outcome = updater.update_images().await.unwrap().unwrap();

    assert!(outcome.report.is_empty());
    assert!(outcome.failed.is_empty());
}

#[tokio::test]
async fn test_image_update_appends_latest_tag() {
    let runtime = Arc::new(
        FakeRuntime::default()
            .with_container("cache", "sha256:same", "redis")
            .with_pull("redis:latest", "sha256:same"),
    );
    let (_guard, updater) = new_updater(runtime.clone(), None);

    updater.update_images().await.unwrap().unwrap();

    assert_eq!(runtime.pulled(), vec!["redis:latest".to_string()]);
}

#[tokio::test]
async fn test_image_update_isolates_pull_failures() {
    let runtime = Arc::new(
        FakeRuntime::default()
            .with_container("a", "sha256:a0", "alpha")
            .with_container("b", "sha256:b0", "beta")
            .with_container("c", "sha256:c0", "gamma")
            .with_pull("alpha:latest", "sha256:a1")
            .with_pull_error("beta:latest", "registry unreachable")
            .with_pull("gamma:latest", "sha256:c0"),
    );
    let (guard, updater) = new_updater(runtime.clone(), None);

    let outcome = updater.update_images().await.unwrap().unwrap();

    // The failing pull did not abort the scan
    assert_eq!(runtime.pulled().len(), 3);
    assert_eq!(outcome.failed, vec!["b".to_string()]);
    assert_eq!(outcome.report.len(), 1);
    assert_eq!(outcome.report.containers[0].container_name, "a");
    assert_eq!(guard.current(), OperationStatus::Idle);
}

#[tokio::test]
async fn test_image_update_rejected_while_busy() {
    let runtime = Arc::new(FakeRuntime::default());
    let (guard, updater) = new_updater(runtime.clone(), None);

    assert!(guard.try_acquire(OperationStatus::UpdatingStacks));

    let outcome = updater.update_images().await.unwrap();
    assert!(outcome.is_none());
    assert!(runtime.pulled().is_empty());

    // The rejected attempt did not disturb the holder
    assert_eq!(guard.current(), OperationStatus::UpdatingStacks);
}

// ============================ STACK WORKFLOW ==================================== //

#[tokio::test]
async fn test_stack_update_selects_included_stacks() {
    let api = Arc::new(
        FakeStacksApi::default()
            .with_stack(1, "web")
            .with_stack(2, "db"),
    );
    let (_guard, updater) = new_updater(Arc::new(FakeRuntime::default()), Some(api.clone()));

    let include = vec!["web".to_string()];
    let summary = updater.update_stacks(Some(include.as_slice())).await.unwrap().unwrap();

    // Only the selected stack is fetched and redeployed
    assert_eq!(api.fetched_ids(), vec![1]);
    assert_eq!(api.redeployed_ids(), vec![1]);

    assert_eq!(summary.updated, vec!["web".to_string()]);
    assert_eq!(summary.skipped, vec!["db".to_string()]);
    assert!(summary.failed.is_empty());
}

#[tokio::test]
async fn test_stack_update_none_means_all() {
    let api = Arc::new(
        FakeStacksApi::default()
            .with_stack(1, "web")
            .with_stack(2, "db"),
    );
    let (_guard, updater) = new_updater(Arc::new(FakeRuntime::default()), Some(api.clone()));

    let summary = updater.update_stacks(None).await.unwrap().unwrap();

    assert_eq!(api.redeployed_ids(), vec![1, 2]);
    assert_eq!(summary.updated.len(), 2);
    assert!(summary.skipped.is_empty());
}

#[tokio::test]
async fn test_stack_update_auth_failure_aborts() {
    let api = Arc::new(
        FakeStacksApi::default()
            .with_stack(1, "web")
            .with_auth_failure(),
    );
    let (guard, updater) = new_updater(Arc::new(FakeRuntime::default()), Some(api.clone()));

    let result = updater.update_stacks(None).await;
    assert!(matches!(result, Err(DaemonError::AuthError(_))));

    // Nothing was touched and the guard is released
    assert!(api.fetched_ids().is_empty());
    assert!(api.redeployed_ids().is_empty());
    assert_eq!(guard.current(), OperationStatus::Idle);
}

#[tokio::test]
async fn test_stack_update_isolates_redeploy_failures() {
    let api = Arc::new(
        FakeStacksApi::default()
            .with_stack(1, "web")
            .with_stack(2, "db")
            .with_failing_redeploy(1),
    );
    let (_guard, updater) = new_updater(Arc::new(FakeRuntime::default()), Some(api.clone()));

    let summary = updater.update_stacks(None).await.unwrap().unwrap();

    // The failing stack did not abort the rest of the batch
    assert_eq!(api.redeployed_ids(), vec![1, 2]);
    assert_eq!(summary.failed, vec!["web".to_string()]);
    assert_eq!(summary.updated, vec!["db".to_string()]);
}

#[tokio::test]
async fn test_stack_update_requires_configured_api() {
    let (_guard, updater) = new_updater(Arc::new(FakeRuntime::default()), None);

    let result = updater.update_stacks(None).await;
    assert!(matches!(result, Err(DaemonError::ConfigError(_))));
}

// ============================= STOP WORKFLOW ==================================== //

#[tokio::test]
async fn test_stop_containers() {
    let runtime = Arc::new(FakeRuntime::default());
    let (guard, updater) = new_updater(runtime.clone(), None);

    let names = vec!["cache".to_string(), "worker".to_string()];
    let summary = updater.stop_containers(&names).await.unwrap().unwrap();

    assert_eq!(runtime.stopped(), names);
    assert_eq!(summary.stopped, names);
    assert!(summary.failed.is_empty());
    assert_eq!(guard.current(), OperationStatus::Idle);
}

#[tokio::test]
async fn test_stop_containers_isolates_unknown_names() {
    let runtime = Arc::new(FakeRuntime::default().with_failing_stop("ghost"));
    let (_guard, updater) = new_updater(runtime.clone(), None);

    let names = vec!["ghost".to_string(), "cache".to_string()];
    let summary = updater.stop_containers(&names).await.unwrap().unwrap();

    // The unknown container did not abort the remaining stops
    assert_eq!(runtime.stopped(), names);
    assert_eq!(summary.failed, vec!["ghost".to_string()]);
    assert_eq!(summary.stopped, vec!["cache".to_string()]);
}
