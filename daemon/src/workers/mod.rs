//! Background workers

pub mod dispatcher;
pub mod mqtt;
pub mod poller;

use tracing::{debug, error, info};

use crate::models::report::ImageChangeReport;
use crate::mqtt::client::MqttPublisher;
use crate::mqtt::topics::Topics;

/// Publish a non-empty image change report on the pending-images topic.
/// An empty report publishes nothing.
pub(crate) async fn publish_pending_images(
    publisher: Option<&MqttPublisher>,
    report: &ImageChangeReport,
) {
    if report.is_empty() {
        return;
    }

    let Some(publisher) = publisher else {
        debug!("Command channel disabled, not publishing image report");
        return;
    };

    match publisher.publish_json(Topics::IMAGES_PENDING, report).await {
        Ok(()) => info!(
            "Published {} pending image updates to {}",
            report.len(),
            Topics::IMAGES_PENDING
        ),
        Err(e) => error!("Failed to publish image report: {}", e),
    }
}
