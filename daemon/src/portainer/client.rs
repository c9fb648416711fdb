//! Management API HTTP client

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::errors::DaemonError;
use crate::portainer::{Stack, StacksApi};

/// Endpoint the redeploy PUT is scoped to, per the API contract.
const ENDPOINT_ID: u32 = 1;

/// HTTP client for the stack-management API.
pub struct PortainerClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl PortainerClient {
    /// Create a new client for `host`, using HTTPS when `ssl` is set.
    pub fn new(
        host: &str,
        ssl: bool,
        username: String,
        password: String,
    ) -> Result<Self, DaemonError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let protocol = if ssl { "https" } else { "http" };

        Ok(Self {
            client,
            base_url: format!("{}://{}", protocol, host.trim_end_matches('/')),
            username,
            password,
        })
    }

    fn auth_url(&self) -> String {
        format!("{}/api/auth", self.base_url)
    }

    fn stacks_url(&self) -> String {
        format!("{}/api/stacks", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    jwt: String,
}

#[async_trait]
impl StacksApi for PortainerClient {
    async fn authenticate(&self) -> Result<String, DaemonError> {
        let url = self.auth_url();
        debug!("POST {}", url);

        let body = serde_json::json!({
            "Username": self.username,
            "Password": self.password,
        });

        info!("Authenticating against the management API");
        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Authentication failed: {} - {}", status, body);
            return Err(DaemonError::AuthError(format!("{}: {}", status, body)));
        }

        let auth: AuthResponse = response.json().await?;
        Ok(auth.jwt)
    }

    async fn list_stacks(&self, token: &str) -> Result<Vec<Stack>, DaemonError> {
        let url = self.stacks_url();
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Listing stacks failed: {} - {}", status, body);
            return Err(DaemonError::ApiError(format!("{}: {}", status, body)));
        }

        let stacks = response.json().await?;
        Ok(stacks)
    }

    async fn stack_file(
        &self,
        token: &str,
        stack_id: i64,
    ) -> Result<serde_json::Value, DaemonError> {
        let url = format!("{}/{}/file", self.stacks_url(), stack_id);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Fetching stack file failed: {} - {}", status, body);
            return Err(DaemonError::ApiError(format!("{}: {}", status, body)));
        }

        let content = response.json().await?;
        Ok(content)
    }

    async fn redeploy_stack(
        &self,
        token: &str,
        stack_id: i64,
        content: &serde_json::Value,
    ) -> Result<(), DaemonError> {
        let url = format!(
            "{}/{}?endpointId={}",
            self.stacks_url(),
            stack_id,
            ENDPOINT_ID
        );
        debug!("PUT {}", url);

        let response = self
            .client
            .put(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .json(content)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Redeploying stack failed: {} - {}", status, body);
            return Err(DaemonError::ApiError(format!("{}: {}", status, body)));
        }

        Ok(())
    }
}
