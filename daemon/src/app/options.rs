//! Application configuration options

use std::time::Duration;

use crate::mqtt::client::MqttAddress;
use crate::workers::{mqtt, poller};

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Management API configuration
    pub management_api: ManagementApiOptions,

    /// MQTT broker address; command channel is disabled when the host is
    /// empty
    pub broker_address: MqttAddress,

    /// MQTT client id
    pub client_id: String,

    /// Poller worker options
    pub poller: poller::Options,

    /// MQTT worker options
    pub mqtt_worker: mqtt::Options,

    /// Bound of the inbound command queue
    pub command_queue_capacity: usize,

    /// Containers stopped after a one-shot stack update (`--once`)
    pub containers_to_stop: Vec<String>,

    /// Stacks updated in one-shot mode; `None` means all stacks
    pub update_stacks: Option<Vec<String>>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            management_api: ManagementApiOptions::default(),
            broker_address: MqttAddress::default(),
            client_id: "stackward".to_string(),
            poller: poller::Options::default(),
            mqtt_worker: mqtt::Options::default(),
            command_queue_capacity: 8,
            containers_to_stop: Vec::new(),
            update_stacks: None,
        }
    }
}

/// Lifecycle options for the daemon
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Management API options
#[derive(Debug, Clone, Default)]
pub struct ManagementApiOptions {
    /// API host; stack updates are disabled when absent
    pub host: Option<String>,

    /// Use HTTPS
    pub ssl: bool,

    /// API credentials
    pub username: String,
    pub password: String,
}
