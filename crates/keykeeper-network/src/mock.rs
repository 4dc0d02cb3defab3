//! Recording notifier for testing.

use crate::error::NotifyError;
use crate::traits::Notifier;
use keykeeper_core::UnlockRequest;
use std::sync::{Arc, Mutex};

/// Notifier that records every request and optionally fails.
///
/// Clones share the same log, so a test can keep one clone and hand the
/// other to the code under test.
///
/// ```
/// use keykeeper_core::UnlockRequest;
/// use keykeeper_network::{Notifier, mock::RecordingNotifier};
///
/// #[tokio::main]
/// async fn main() {
///     let recorder = RecordingNotifier::new();
///     let mut notifier = recorder.clone();
///
///     let request = UnlockRequest { address: "A1".into(), battery_level: 90 };
///     notifier.notify(&request).await.unwrap();
///
///     assert_eq!(recorder.requests(), vec![request]);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    requests: Arc<Mutex<Vec<UnlockRequest>>>,
    failure: Option<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifier that records requests but reports every one as failed.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<UnlockRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&mut self, request: &UnlockRequest) -> Result<(), NotifyError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());
        match &self.failure {
            Some(message) => Err(NotifyError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}
