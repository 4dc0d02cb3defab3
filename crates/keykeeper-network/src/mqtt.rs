//! One-shot MQTT publisher.
//!
//! Each unlock opens its own broker connection, publishes, waits for the
//! acknowledgement its QoS level calls for, and disconnects. Unlocks are
//! rare and a long-lived connection would need its own reconnect handling,
//! so nothing is kept between calls.
//!
//! # Acknowledgement per QoS
//!
//! | QoS | Done when |
//! |-----|-----------|
//! | 0   | publish written to the socket |
//! | 1   | `PUBACK` received |
//! | 2   | `PUBCOMP` received |

use crate::error::NotifyError;
use crate::traits::Notifier;
use keykeeper_core::constants::{
    DEFAULT_MQTT_HOST, DEFAULT_MQTT_PAYLOAD, DEFAULT_MQTT_PORT, DEFAULT_MQTT_TOPIC,
    DEFAULT_PUBLISH_TIMEOUT_MS,
};
use keykeeper_core::{QosLevel, UnlockRequest};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Broker and message settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    /// Broker host name or address
    pub host: String,

    /// Broker port
    pub port: u16,

    /// Topic the door listens on
    pub topic: String,

    /// Delivery guarantee
    pub qos: QosLevel,

    /// Message body
    pub payload: Vec<u8>,

    /// Bound on connect + publish + acknowledgement
    pub timeout: Duration,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MQTT_HOST.to_string(),
            port: DEFAULT_MQTT_PORT,
            topic: DEFAULT_MQTT_TOPIC.to_string(),
            qos: QosLevel::ExactlyOnce,
            payload: DEFAULT_MQTT_PAYLOAD.to_vec(),
            timeout: Duration::from_millis(DEFAULT_PUBLISH_TIMEOUT_MS),
        }
    }
}

impl MqttConfig {
    /// Set the broker address
    pub fn broker(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Set the topic
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Set the QoS level
    pub fn qos(mut self, qos: QosLevel) -> Self {
        self.qos = qos;
        self
    }

    /// Set the message body
    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Set the publish timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Publishes the configured message once per unlock.
#[derive(Debug, Clone)]
pub struct MqttNotifier {
    config: MqttConfig,
}

impl MqttNotifier {
    pub fn new(config: MqttConfig) -> Self {
        Self { config }
    }

    /// Connect, publish, await the acknowledgement and disconnect.
    ///
    /// # Errors
    ///
    /// [`NotifyError::Timeout`] if the whole exchange exceeds the configured
    /// timeout, otherwise the client or connection error that ended it.
    pub async fn publish(&self) -> Result<(), NotifyError> {
        let client_id = format!("keykeeper-{}", uuid::Uuid::new_v4().simple());
        let mut options = MqttOptions::new(client_id, self.config.host.clone(), self.config.port);
        options.set_keep_alive(Duration::from_secs(5));
        options.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(options, 10);
        let qos = mqtt_qos(self.config.qos);

        debug!(host = %self.config.host, port = self.config.port, "Connecting to broker");

        let exchange = async {
            client
                .publish(self.config.topic.clone(), qos, false, self.config.payload.clone())
                .await?;
            wait_for_ack(&mut eventloop, qos).await
        };

        let result = match tokio::time::timeout(self.config.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(self.config.timeout.as_millis() as u64)),
        };

        if result.is_ok() {
            close(&client, &mut eventloop).await;
        }
        result
    }
}

impl Notifier for MqttNotifier {
    async fn notify(&mut self, request: &UnlockRequest) -> Result<(), NotifyError> {
        self.publish().await?;
        info!(
            topic = %self.config.topic,
            qos = self.config.qos.to_u8(),
            address = %request.address,
            "Unlock published"
        );
        Ok(())
    }
}

fn mqtt_qos(level: QosLevel) -> QoS {
    match level {
        QosLevel::AtMostOnce => QoS::AtMostOnce,
        QosLevel::AtLeastOnce => QoS::AtLeastOnce,
        QosLevel::ExactlyOnce => QoS::ExactlyOnce,
    }
}

/// Drive the event loop until the publish is complete for its QoS.
async fn wait_for_ack(eventloop: &mut EventLoop, qos: QoS) -> Result<(), NotifyError> {
    loop {
        let event = eventloop.poll().await?;
        debug!(?event, "MQTT event");
        let done = match (qos, &event) {
            (QoS::AtMostOnce, Event::Outgoing(Outgoing::Publish(_))) => true,
            (QoS::AtLeastOnce, Event::Incoming(Packet::PubAck(_))) => true,
            (QoS::ExactlyOnce, Event::Incoming(Packet::PubComp(_))) => true,
            _ => false,
        };
        if done {
            return Ok(());
        }
    }
}

/// Best-effort clean disconnect, bounded at 500ms.
async fn close(client: &AsyncClient, eventloop: &mut EventLoop) {
    if let Err(e) = client.disconnect().await {
        warn!(error = %e, "Failed to queue MQTT disconnect");
        return;
    }

    let drain = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    };
    if tokio::time::timeout(Duration::from_millis(500), drain).await.is_err() {
        debug!("MQTT disconnect timed out");
    }
}
