//! Stackward - Entry Point
//!
//! A daemon that watches a fleet of running containers, pulls newer versions
//! of their images, and redeploys affected stacks through a management API,
//! driven by a polling schedule and by commands arriving over MQTT.

use std::collections::HashMap;
use std::env;

use stackward::app::options::{AppOptions, ManagementApiOptions};
use stackward::app::run::{run, run_once};
use stackward::logs::{init_logging, LogOptions};
use stackward::mqtt::client::MqttAddress;
use stackward::schedule::Schedule;
use stackward::settings::Settings;
use stackward::utils::version_info;
use stackward::workers::poller;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    // Load configuration from the environment
    let settings = Settings::from_env();

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    info!("Loading configuration");

    let schedule = Schedule::parse(&settings.interval);
    info!(
        "Polling every {} seconds ({})",
        schedule.as_secs(),
        settings.interval
    );

    let options = AppOptions {
        management_api: ManagementApiOptions {
            host: settings.management_api.host.clone(),
            ssl: settings.management_api.ssl,
            username: settings.management_api.username.clone(),
            password: settings.management_api.password.clone(),
        },
        broker_address: MqttAddress {
            host: settings.mqtt_broker.host.clone(),
            port: settings.mqtt_broker.port,
            username: settings.mqtt_broker.username.clone(),
            password: settings.mqtt_broker.password.clone(),
            use_tls: settings.mqtt_broker.tls,
            ca_cert_path: settings.mqtt_broker.ca_cert_path.clone(),
        },
        poller: poller::Options {
            interval: schedule.interval(),
            ..Default::default()
        },
        containers_to_stop: settings.containers_to_stop.clone(),
        update_stacks: settings.update_stacks.clone(),
        ..Default::default()
    };

    // Single pass mode
    if cli_args.contains_key("once") {
        if let Err(e) = run_once(options).await {
            error!("Update pass failed: {e}");
            std::process::exit(1);
        }
        return;
    }

    // Run the daemon
    let result = run(options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the daemon: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
