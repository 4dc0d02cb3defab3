use thiserror::Error;

/// Errors from delivering an unlock notification.
///
/// The controller logs these and keeps running: a broker outage must not
/// take the door reader down with it.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No acknowledgement within the publish timeout
    #[error("Publish timeout after {0}ms")]
    Timeout(u64),

    /// Broker unreachable or connection dropped
    #[error("Broker connection failed: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    /// Request could not be queued on the client
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// Notifier refused the request
    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}
