//! Image update detection workflow

use tracing::{error, info, warn};

use crate::errors::DaemonError;
use crate::models::report::{ImageChange, ImageChangeReport};
use crate::status::OperationStatus;
use crate::update::Updater;

/// Result of one image-update pass.
#[derive(Debug, Clone, Default)]
pub struct ImageUpdateOutcome {
    /// Containers whose pulled image differs from the running one
    pub report: ImageChangeReport,

    /// Containers whose pull failed; the pass continued without them
    pub failed: Vec<String>,
}

impl Updater {
    /// Scan running containers for images with a newer version available.
    ///
    /// Pulls every container's declared reference and compares the resulting
    /// image id against the one the container was started from. A pull
    /// failure is recorded per container and the scan continues. Returns
    /// `Ok(None)` when another operation holds the status guard.
    pub async fn update_images(&self) -> Result<Option<ImageUpdateOutcome>, DaemonError> {
        let Some(_permit) = self
            .guard()
            .acquire_scoped(OperationStatus::UpdatingImages)
        else {
            return Ok(None);
        };

        info!("Starting to look for new images");

        let containers = self.runtime().list_running().await?;

        let total = containers.len();
        let mut outcome = ImageUpdateOutcome::default();

        for (index, container) in containers.iter().enumerate() {
            let image_name = normalize_reference(&container.image);

            info!(
                "{:03}/{:03}\t{}: {}",
                index + 1,
                total,
                container.name,
                image_name
            );

            let new_image_id = match self.runtime().pull(&image_name).await {
                Ok(id) => id,
                Err(e) => {
                    error!("Pull failed for {} ({}): {}", container.name, image_name, e);
                    outcome.failed.push(container.name.clone());
                    continue;
                }
            };

            if new_image_id != container.image_id {
                info!("{}: {} - Image pulled", container.name, image_name);

                outcome.report.containers.push(ImageChange {
                    container_name: container.name.clone(),
                    image_name,
                    image_id: container.image_id.clone(),
                    new_image_id,
                });
            }
        }

        if outcome.failed.is_empty() {
            info!(
                "Image pass completed, {} of {} containers have newer images",
                outcome.report.len(),
                total
            );
        } else {
            warn!(
                "Image pass completed with {} of {} pulls failed",
                outcome.failed.len(),
                total
            );
        }

        Ok(Some(outcome))
    }
}

/// Append `:latest` when the declared reference carries no tag.
fn normalize_reference(image: &str) -> String {
    if image.contains(':') {
        image.to_string()
    } else {
        format!("{}:latest", image)
    }
}
