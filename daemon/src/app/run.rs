//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::errors::DaemonError;
use crate::models::command::Command;
use crate::mqtt::client::{MqttClient, MqttPublisher};
use crate::update::Updater;
use crate::workers::{dispatcher, mqtt, poller};

/// Run the stackward daemon
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DaemonError> {
    info!("Initializing stackward daemon...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(options.lifecycle.clone());

    if let Err(e) = init(&options, shutdown_tx.clone(), &mut shutdown_manager).await {
        error!("Failed to start daemon: {}", e);
        shutdown_manager.shutdown(&shutdown_tx).await?;
        return Err(e);
    }

    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    shutdown_manager.shutdown(&shutdown_tx).await
}

/// Run a single update pass and exit (`--once`).
///
/// Scans for image updates; when changes were found and a management API is
/// configured, redeploys the selected stacks and stops the configured
/// containers. The command channel is not started.
pub async fn run_once(options: AppOptions) -> Result<(), DaemonError> {
    info!("Starting to update");

    let app_state = AppState::init(&options)?;
    let updater = app_state.updater;

    let outcome = updater.update_images().await?.ok_or_else(|| {
        DaemonError::Internal("another operation is already in progress".to_string())
    })?;

    if outcome.report.is_empty() {
        info!("No image changes found");
        return Ok(());
    }

    if options.management_api.host.is_none() {
        info!("Management API host not configured, skipping redeploy");
        return Ok(());
    }

    updater.update_stacks(options.update_stacks.as_deref()).await?;

    if !options.containers_to_stop.is_empty() {
        updater.stop_containers(&options.containers_to_stop).await?;
    }

    info!("Update completed");
    Ok(())
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), DaemonError> {
    let app_state = AppState::init(options)?;
    let updater = app_state.updater.clone();

    let mut publisher = None;

    if options.broker_address.host.is_empty() {
        info!("MQTT host not configured, command channel disabled.");
    } else {
        let client = MqttClient::new(&options.broker_address, &options.client_id)?;
        publisher = Some(client.publisher());

        let (command_tx, command_rx) = mpsc::channel(options.command_queue_capacity);

        init_mqtt_worker(
            options.mqtt_worker.clone(),
            client,
            command_tx,
            shutdown_manager,
            shutdown_tx.subscribe(),
        )?;

        init_dispatcher_worker(
            updater.clone(),
            publisher.clone(),
            command_rx,
            shutdown_manager,
            shutdown_tx.subscribe(),
        )?;
    }

    init_poller_worker(
        options.poller.clone(),
        updater,
        publisher,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    Ok(())
}

fn init_poller_worker(
    options: poller::Options,
    updater: Arc<Updater>,
    publisher: Option<MqttPublisher>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    info!("Initializing poller worker...");

    let poller_handle = tokio::spawn(async move {
        poller::run(
            &options,
            updater.as_ref(),
            publisher.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_poller_worker_handle(poller_handle)?;
    Ok(())
}

fn init_mqtt_worker(
    options: mqtt::Options,
    client: MqttClient,
    command_tx: mpsc::Sender<Command>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    info!("Initializing MQTT worker...");

    let mqtt_handle = tokio::spawn(async move {
        mqtt::run(
            &options,
            client,
            command_tx,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_mqtt_worker_handle(mqtt_handle)?;
    Ok(())
}

fn init_dispatcher_worker(
    updater: Arc<Updater>,
    publisher: Option<MqttPublisher>,
    command_rx: mpsc::Receiver<Command>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    info!("Initializing dispatcher worker...");

    let dispatcher_handle = tokio::spawn(async move {
        dispatcher::run(
            updater.as_ref(),
            publisher.as_ref(),
            command_rx,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_dispatcher_worker_handle(dispatcher_handle)?;
    Ok(())
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    lifecycle_options: LifecycleOptions,
    poller_worker_handle: Option<JoinHandle<()>>,
    mqtt_worker_handle: Option<JoinHandle<()>>,
    dispatcher_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(lifecycle_options: LifecycleOptions) -> Self {
        Self {
            lifecycle_options,
            poller_worker_handle: None,
            mqtt_worker_handle: None,
            dispatcher_worker_handle: None,
        }
    }

    pub fn with_poller_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), DaemonError> {
        if self.poller_worker_handle.is_some() {
            return Err(DaemonError::ShutdownError("poller_handle already set".to_string()));
        }
        self.poller_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_mqtt_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), DaemonError> {
        if self.mqtt_worker_handle.is_some() {
            return Err(DaemonError::ShutdownError("mqtt_handle already set".to_string()));
        }
        self.mqtt_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_dispatcher_worker_handle(
        &mut self,
        handle: JoinHandle<()>,
    ) -> Result<(), DaemonError> {
        if self.dispatcher_worker_handle.is_some() {
            return Err(DaemonError::ShutdownError("dispatcher_handle already set".to_string()));
        }
        self.dispatcher_worker_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self, shutdown_tx: &broadcast::Sender<()>) -> Result<(), DaemonError> {
        let _ = shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), DaemonError> {
        info!("Shutting down stackward daemon...");

        // 1. Poller worker
        if let Some(handle) = self.poller_worker_handle.take() {
            handle.await.map_err(|e| DaemonError::ShutdownError(e.to_string()))?;
        }

        // 2. MQTT worker
        if let Some(handle) = self.mqtt_worker_handle.take() {
            handle.await.map_err(|e| DaemonError::ShutdownError(e.to_string()))?;
        }

        // 3. Dispatcher worker
        if let Some(handle) = self.dispatcher_worker_handle.take() {
            handle.await.map_err(|e| DaemonError::ShutdownError(e.to_string()))?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
