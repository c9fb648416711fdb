//! MQTT client implementation

use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::DaemonError;
use crate::mqtt::topics::Topics;

/// MQTT broker address
#[derive(Debug, Clone)]
pub struct MqttAddress {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    /// Optional path to a PEM-encoded CA certificate for broker verification.
    /// When `None` and `use_tls` is `true`, the system certificate store is used.
    pub ca_cert_path: Option<String>,
}

impl Default for MqttAddress {
    fn default() -> Self {
        Self {
            host: "".to_string(),
            port: 1883,
            username: None,
            password: None,
            use_tls: false,
            ca_cert_path: None,
        }
    }
}

/// MQTT client wrapper
pub struct MqttClient {
    client: AsyncClient,
    eventloop: EventLoop,
}

impl MqttClient {
    /// Create a new MQTT client. The connection itself is established lazily
    /// by the event loop on the first poll.
    pub fn new(address: &MqttAddress, client_id: &str) -> Result<Self, DaemonError> {
        if address.host.is_empty() {
            return Err(DaemonError::MqttError("MQTT host is not configured".to_string()));
        }

        let mut options = MqttOptions::new(client_id, &address.host, address.port);
        options.set_keep_alive(std::time::Duration::from_secs(30));

        if let (Some(username), Some(password)) = (&address.username, &address.password) {
            options.set_credentials(username, password);
        }

        if address.use_tls {
            use rumqttc::{TlsConfiguration, Transport};
            use rustls::ClientConfig;
            use std::sync::Arc;

            let mut root_cert_store = rustls::RootCertStore::empty();

            if let Some(ref ca_path) = address.ca_cert_path {
                let ca_pem = std::fs::read(ca_path)
                    .map_err(|e| DaemonError::MqttError(format!("Failed to read CA cert {ca_path}: {e}")))?;
                let mut cursor = std::io::Cursor::new(ca_pem);
                for cert in rustls_pemfile::certs(&mut cursor).flatten() {
                    let _ = root_cert_store.add(cert);
                }
            } else {
                for cert in rustls_native_certs::load_native_certs().unwrap_or_default() {
                    let _ = root_cert_store.add(cert);
                }
            }

            let client_config = ClientConfig::builder()
                .with_root_certificates(root_cert_store)
                .with_no_client_auth();

            options.set_transport(Transport::tls_with_config(TlsConfiguration::Rustls(
                Arc::new(client_config),
            )));
        }

        let (client, eventloop) = AsyncClient::new(options, 10);

        Ok(Self { client, eventloop })
    }

    /// A cheap clonable handle for publishing from other tasks.
    pub fn publisher(&self) -> MqttPublisher {
        MqttPublisher {
            client: self.client.clone(),
        }
    }

    /// Subscribe to the inbound command topics
    pub async fn subscribe_commands(&mut self) -> Result<(), DaemonError> {
        for topic in Topics::subscriptions() {
            self.client
                .subscribe(topic, QoS::AtLeastOnce)
                .await
                .map_err(|e| DaemonError::MqttError(e.to_string()))?;
            info!("Subscribed to: {}", topic);
        }
        Ok(())
    }

    /// Poll for events
    pub async fn poll(&mut self) -> Result<Option<MqttMessage>, DaemonError> {
        match self.eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let topic = publish.topic.clone();
                let payload = publish.payload.to_vec();

                debug!("Received message on topic: {}", topic);

                Ok(Some(MqttMessage { topic, payload }))
            }
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    info!("MQTT broker connected");
                    Ok(None)
                } else {
                    Err(DaemonError::MqttError(
                        describe_connect_code(ack.code).to_string(),
                    ))
                }
            }
            Ok(Event::Incoming(Packet::SubAck(_))) => {
                debug!("Subscription acknowledged");
                Ok(None)
            }
            Ok(_) => Ok(None),
            Err(e) => {
                warn!("MQTT poll error: {}", e);
                Err(DaemonError::MqttError(e.to_string()))
            }
        }
    }

    /// Disconnect from broker
    pub async fn disconnect(&mut self) -> Result<(), DaemonError> {
        self.client
            .disconnect()
            .await
            .map_err(|e| DaemonError::MqttError(e.to_string()))?;
        info!("MQTT disconnected");
        Ok(())
    }
}

/// Clonable publish-only handle backed by the shared client.
///
/// Publishes issued while the broker is unreachable are buffered in the
/// client's request queue and flushed once the event loop reconnects.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    /// Publish a JSON payload to a topic
    pub async fn publish_json<T: Serialize>(
        &self,
        topic: &str,
        payload: &T,
    ) -> Result<(), DaemonError> {
        let payload = serde_json::to_vec(payload)?;

        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| DaemonError::MqttError(e.to_string()))?;

        debug!("Published to: {}", topic);
        Ok(())
    }
}

/// MQTT message
#[derive(Debug, Clone)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl MqttMessage {
    /// Parse payload as JSON
    pub fn parse_json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, DaemonError> {
        serde_json::from_slice(&self.payload).map_err(|e| DaemonError::MqttError(e.to_string()))
    }
}

/// Map a broker ConnAck reason code to a human-readable message.
fn describe_connect_code(code: ConnectReturnCode) -> &'static str {
    match code {
        ConnectReturnCode::Success => "Connection accepted",
        ConnectReturnCode::RefusedProtocolVersion => "Connection refused: unacceptable protocol version",
        ConnectReturnCode::BadClientId => "Connection refused: identifier rejected",
        ConnectReturnCode::ServiceUnavailable => "Connection refused: broker unavailable",
        ConnectReturnCode::BadUserNamePassword => "Connection refused: bad username or password",
        ConnectReturnCode::NotAuthorized => "Connection refused: not authorized",
        #[allow(unreachable_patterns)]
        _ => "Connection refused: unknown error",
    }
}
