//! Enum wrapper for notifier dispatch.
//!
//! [`Notifier`] uses native `async fn` and cannot be boxed, so the binary
//! picks its implementation through this enum instead of `Box<dyn Notifier>`.

use crate::dry_run::DryRunNotifier;
use crate::error::NotifyError;
use crate::mqtt::{MqttConfig, MqttNotifier};
use crate::traits::Notifier;
use keykeeper_core::UnlockRequest;

/// Any of the production notifiers.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyNotifier {
    /// Publishes to the broker
    Mqtt(MqttNotifier),

    /// Logs only
    DryRun(DryRunNotifier),
}

impl AnyNotifier {
    /// MQTT publisher, or a dry run of it when `dry_run` is set.
    pub fn from_config(config: MqttConfig, dry_run: bool) -> Self {
        if dry_run {
            Self::DryRun(DryRunNotifier::new(config))
        } else {
            Self::Mqtt(MqttNotifier::new(config))
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun(_))
    }
}

impl Notifier for AnyNotifier {
    async fn notify(&mut self, request: &UnlockRequest) -> Result<(), NotifyError> {
        match self {
            Self::Mqtt(notifier) => notifier.notify(request).await,
            Self::DryRun(notifier) => notifier.notify(request).await,
        }
    }
}
