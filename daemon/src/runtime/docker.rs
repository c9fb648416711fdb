//! Docker CLI runtime implementation

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::errors::DaemonError;
use crate::runtime::{ContainerRuntime, RunningContainer};

/// Container runtime backed by the local `docker` binary.
pub struct DockerCli {
    docker_bin: String,
}

impl DockerCli {
    pub fn new() -> Self {
        Self {
            docker_bin: "docker".to_string(),
        }
    }

    pub fn with_binary(docker_bin: impl Into<String>) -> Self {
        Self {
            docker_bin: docker_bin.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, DaemonError> {
        debug!("{} {}", self.docker_bin, args.join(" "));

        let output = Command::new(&self.docker_bin)
            .args(args)
            .output()
            .await
            .map_err(|e| DaemonError::RuntimeError(format!("Failed to run {}: {}", self.docker_bin, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DaemonError::RuntimeError(format!(
                "{} {} failed: {}",
                self.docker_bin,
                args.first().unwrap_or(&""),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn list_running(&self) -> Result<Vec<RunningContainer>, DaemonError> {
        let ids_raw = self.run(&["ps", "-q", "--no-trunc"]).await?;
        let ids: Vec<&str> = ids_raw.split_whitespace().collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = vec![
            "inspect",
            "--format",
            "{{.Name}}\t{{.Image}}\t{{.Config.Image}}",
        ];
        args.extend(&ids);

        let inspected = self.run(&args).await?;
        let mut containers = Vec::new();

        for line in inspected.lines() {
            let mut fields = line.split('\t');

            let (Some(name), Some(image_id), Some(image)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(DaemonError::RuntimeError(format!(
                    "Unexpected inspect output: {line:?}"
                )));
            };

            containers.push(RunningContainer {
                name: name.trim_start_matches('/').to_string(),
                image_id: image_id.to_string(),
                image: image.to_string(),
            });
        }

        Ok(containers)
    }

    async fn pull(&self, reference: &str) -> Result<String, DaemonError> {
        self.run(&["pull", reference]).await?;

        let id = self
            .run(&["image", "inspect", "--format", "{{.Id}}", reference])
            .await?;

        Ok(id.trim().to_string())
    }

    async fn stop(&self, name: &str) -> Result<(), DaemonError> {
        self.run(&["stop", name]).await?;
        Ok(())
    }
}
