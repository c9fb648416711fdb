//! Stack-management API collaborator boundary

pub mod client;

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::DaemonError;

/// A stack as listed by the management API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Stack {
    #[serde(rename = "Id")]
    pub id: i64,

    #[serde(rename = "Name")]
    pub name: String,
}

/// Operations the stack update workflow needs from the management API.
///
/// The deployment descriptor is carried as an opaque JSON value and sent
/// back verbatim on redeploy.
#[async_trait]
pub trait StacksApi: Send + Sync {
    /// Authenticate and obtain a bearer token.
    async fn authenticate(&self) -> Result<String, DaemonError>;

    /// List all stacks.
    async fn list_stacks(&self, token: &str) -> Result<Vec<Stack>, DaemonError>;

    /// Fetch a stack's current file content.
    async fn stack_file(&self, token: &str, stack_id: i64) -> Result<serde_json::Value, DaemonError>;

    /// Redeploy a stack with the given (round-tripped) file content.
    async fn redeploy_stack(
        &self,
        token: &str,
        stack_id: i64,
        content: &serde_json::Value,
    ) -> Result<(), DaemonError>;
}
