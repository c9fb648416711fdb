//! Command dispatch worker
//!
//! Consumes typed commands produced by the MQTT worker and runs the matching
//! workflows. A command that arrives while another operation holds the
//! status guard is dropped, not queued.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::models::command::{Command, StackUpdateRequest};
use crate::mqtt::client::MqttPublisher;
use crate::update::Updater;
use crate::workers::publish_pending_images;

/// Run the dispatcher worker
pub async fn run(
    updater: &Updater,
    publisher: Option<&MqttPublisher>,
    mut commands: mpsc::Receiver<Command>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Dispatcher worker starting...");

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Dispatcher worker shutting down...");
                return;
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    info!("Command channel closed, dispatcher worker stopping...");
                    return;
                };

                handle_command(updater, publisher, command).await;
            }
        }
    }
}

async fn handle_command(updater: &Updater, publisher: Option<&MqttPublisher>, command: Command) {
    match command {
        Command::UpdateImages => {
            info!("Image update command received");

            match updater.update_images().await {
                Ok(Some(outcome)) => {
                    publish_pending_images(publisher, &outcome.report).await;
                }
                Ok(None) => {
                    // Guard busy; command dropped
                }
                Err(e) => {
                    error!("Image update failed: {}", e);
                    updater.reset_status();
                }
            }
        }
        Command::UpdateStacks(request) => {
            info!("Stack update command received");
            run_stack_update(updater, request).await;
        }
    }
}

async fn run_stack_update(updater: &Updater, request: StackUpdateRequest) {
    info!("Stacks: {:?}", request.stacks);
    info!("Auto stop containers: {:?}", request.auto_stop_containers);

    match updater.update_stacks(request.stacks.as_deref()).await {
        Ok(Some(_summary)) => {
            // Stop workflow runs only after the stack update completed
            if request.auto_stop_containers.is_empty() {
                return;
            }

            if let Err(e) = updater.stop_containers(&request.auto_stop_containers).await {
                error!("Stopping containers failed: {}", e);
                updater.reset_status();
            }
        }
        Ok(None) => {
            // Guard busy; command dropped
        }
        Err(e) => {
            error!("Stack update failed: {}", e);
            updater.reset_status();
        }
    }
}
