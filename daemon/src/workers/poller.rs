//! Polling worker driving periodic image-update passes

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::mqtt::client::MqttPublisher;
use crate::schedule::DEFAULT_SCHEDULE_SECS;
use crate::update::Updater;
use crate::workers::publish_pending_images;

/// Poller worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Polling interval
    pub interval: Duration,

    /// Initial delay before the first pass
    pub initial_delay: Duration,

    /// Extra delay after an unexpected failure, layered on top of the
    /// regular interval
    pub recovery_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_SCHEDULE_SECS),
            initial_delay: Duration::from_secs(5),
            recovery_delay: Duration::from_secs(30),
        }
    }
}

/// Run the poller worker
pub async fn run<S, F>(
    options: &Options,
    updater: &Updater,
    publisher: Option<&MqttPublisher>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Poller worker starting...");

    // Initial delay
    tokio::select! {
        _ = &mut shutdown_signal => {
            info!("Poller worker shutting down...");
            return;
        }
        _ = sleep_fn(options.initial_delay) => {}
    }

    loop {
        match updater.update_images().await {
            Ok(Some(outcome)) => {
                if outcome.report.is_empty() {
                    debug!("No image changes found");
                } else {
                    publish_pending_images(publisher, &outcome.report).await;
                }
            }
            Ok(None) => {
                // Another operation holds the guard; skip this tick
            }
            Err(e) => {
                error!(
                    "Image update failed: {}, resuming in {:?}",
                    e, options.recovery_delay
                );
                updater.reset_status();
                sleep_fn(options.recovery_delay).await;
            }
        }

        debug!("Next pass in {:?}", options.interval);

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {}
        }
    }
}
