//! Environment-backed daemon settings

use std::env;

use crate::logs::LogLevel;
use crate::schedule::DEFAULT_SCHEDULE;

/// Daemon settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Log level (the DEBUG flag selects `Debug`, nothing else)
    pub log_level: LogLevel,

    /// MQTT broker configuration
    pub mqtt_broker: MqttBrokerSettings,

    /// Stack-management API configuration
    pub management_api: ManagementApiSettings,

    /// Raw polling interval string (`D:H:M:S`)
    pub interval: String,

    /// Containers stopped after a one-shot stack update
    pub containers_to_stop: Vec<String>,

    /// Stacks updated in one-shot mode; `None` means all stacks
    pub update_stacks: Option<Vec<String>>,
}

impl Settings {
    /// Build settings from the process environment.
    pub fn from_env() -> Settings {
        let log_level = if env_flag("DEBUG") {
            LogLevel::Debug
        } else {
            LogLevel::Info
        };

        Settings {
            log_level,
            mqtt_broker: MqttBrokerSettings::from_env(),
            management_api: ManagementApiSettings::from_env(),
            interval: env_string("INTERVAL").unwrap_or_else(|| DEFAULT_SCHEDULE.to_string()),
            containers_to_stop: env_list("CONTAINERS_TO_STOP").unwrap_or_default(),
            update_stacks: env_list("UPDATE_STACKS"),
        }
    }
}

/// MQTT broker settings
#[derive(Debug, Clone)]
pub struct MqttBrokerSettings {
    /// Broker host; when empty the command channel is disabled
    pub host: String,

    /// Broker port
    pub port: u16,

    /// Broker credentials
    pub username: Option<String>,
    pub password: Option<String>,

    /// Use TLS
    pub tls: bool,

    /// Optional path to a PEM-encoded CA certificate for broker TLS
    /// verification. When absent, the system certificate store is used.
    pub ca_cert_path: Option<String>,
}

impl MqttBrokerSettings {
    fn from_env() -> MqttBrokerSettings {
        MqttBrokerSettings {
            host: env_string("MQTT_BROKER_HOST").unwrap_or_default(),
            port: env_string("MQTT_BROKER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1883),
            username: env_string("MQTT_BROKER_USERNAME"),
            password: env_string("MQTT_BROKER_PASSWORD"),
            tls: env_flag("MQTT_BROKER_TLS"),
            ca_cert_path: env_string("MQTT_BROKER_CA_CERT"),
        }
    }
}

/// Stack-management API settings
#[derive(Debug, Clone)]
pub struct ManagementApiSettings {
    /// API host; when absent, stack updates are disabled
    pub host: Option<String>,

    /// Use HTTPS
    pub ssl: bool,

    /// API credentials
    pub username: String,
    pub password: String,
}

impl ManagementApiSettings {
    fn from_env() -> ManagementApiSettings {
        ManagementApiSettings {
            host: env_string("PORTAINER_HOST"),
            ssl: env_flag("PORTAINER_SSL"),
            username: env_string("PORTAINER_USERNAME").unwrap_or_default(),
            password: env_string("PORTAINER_PASSWORD").unwrap_or_default(),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

fn env_list(name: &str) -> Option<Vec<String>> {
    let raw = env_string(name)?;
    let items: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
