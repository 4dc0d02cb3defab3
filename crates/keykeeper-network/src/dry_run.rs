use crate::error::NotifyError;
use crate::mqtt::MqttConfig;
use crate::traits::Notifier;
use keykeeper_core::UnlockRequest;
use tracing::info;

/// Logs what would be published instead of talking to a broker.
///
/// Lets a new site be commissioned with the real central attached but the
/// door still locked.
#[derive(Debug, Clone)]
pub struct DryRunNotifier {
    config: MqttConfig,
    count: usize,
}

impl DryRunNotifier {
    pub fn new(config: MqttConfig) -> Self {
        Self { config, count: 0 }
    }

    /// Unlocks that would have been published so far.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Notifier for DryRunNotifier {
    async fn notify(&mut self, request: &UnlockRequest) -> Result<(), NotifyError> {
        self.count += 1;
        info!(
            topic = %self.config.topic,
            host = %self.config.host,
            port = self.config.port,
            qos = self.config.qos.to_u8(),
            payload = %String::from_utf8_lossy(&self.config.payload),
            address = %request.address,
            "Dry run, not publishing"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_never_fails() {
        let mut notifier = DryRunNotifier::new(MqttConfig::default());
        let request = UnlockRequest {
            address: "C4:8B:42:80:CC:CA".to_string(),
            battery_level: 87,
        };
        notifier.notify(&request).await.unwrap();
        notifier.notify(&request).await.unwrap();
        assert_eq!(notifier.count(), 2);
    }
}
