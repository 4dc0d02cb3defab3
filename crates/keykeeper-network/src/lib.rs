//! Unlock notification for the keykeeper controller.
//!
//! When a coin authenticates, the controller tells the door to open by
//! publishing a short MQTT message. This crate provides the [`Notifier`]
//! boundary and its implementations:
//!
//! - [`MqttNotifier`]: one connection per unlock, waits for the QoS
//!   acknowledgement, then disconnects
//! - [`DryRunNotifier`]: logs instead of publishing
//! - [`mock::RecordingNotifier`]: records requests for tests
//!
//! # Example
//!
//! ```no_run
//! use keykeeper_core::{QosLevel, UnlockRequest};
//! use keykeeper_network::{MqttConfig, MqttNotifier, Notifier};
//!
//! # async fn example() -> Result<(), keykeeper_network::NotifyError> {
//! let config = MqttConfig::default()
//!     .broker("localhost", 1883)
//!     .topic("Things/Door")
//!     .qos(QosLevel::ExactlyOnce);
//!
//! let mut notifier = MqttNotifier::new(config);
//! notifier
//!     .notify(&UnlockRequest { address: "C4:8B:42:80:CC:CA".into(), battery_level: 87 })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod dry_run;
mod error;
pub mod mock;
mod mqtt;
mod notifiers;
mod traits;

pub use dry_run::DryRunNotifier;
pub use error::NotifyError;
pub use mqtt::{MqttConfig, MqttNotifier};
pub use notifiers::AnyNotifier;
pub use traits::Notifier;
