//! MQTT worker for the command channel
//!
//! Keeps the broker connection alive, converts inbound publishes into typed
//! commands, and forwards them to the dispatcher. On a lost connection the
//! worker retries forever with a fixed delay; the daemon has no other
//! liveness signal, so it never gives up.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::models::command::Command;
use crate::mqtt::client::MqttClient;

/// MQTT worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Delay between reconnect attempts
    pub reconnect_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(60),
        }
    }
}

/// Run the MQTT worker
pub async fn run<S, F>(
    options: &Options,
    mut client: MqttClient,
    commands: mpsc::Sender<Command>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("MQTT worker starting...");

    loop {
        // (Re)subscribe; subscriptions do not survive a reconnect
        if let Err(e) = client.subscribe_commands().await {
            error!("Failed to subscribe to command topics: {}", e);
            sleep_fn(options.reconnect_delay).await;
            continue;
        }

        // Main event loop
        loop {
            tokio::select! {
                _ = &mut shutdown_signal => {
                    info!("MQTT worker shutting down...");
                    let _ = client.disconnect().await;
                    return;
                }
                polled = client.poll() => {
                    match polled {
                        Ok(Some(msg)) => {
                            if let Some(command) = Command::from_message(&msg.topic, &msg.payload) {
                                if let Err(e) = commands.try_send(command) {
                                    warn!("Dropping command from {}: {}", msg.topic, e);
                                }
                            }
                        }
                        Ok(None) => {
                            // No message, continue
                        }
                        Err(e) => {
                            warn!(
                                "MQTT connection lost: {}, next attempt in {:?}",
                                e, options.reconnect_delay
                            );
                            break;
                        }
                    }
                }
            }
        }

        // Reconnect delay
        sleep_fn(options.reconnect_delay).await;
    }
}
