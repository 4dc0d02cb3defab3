use keykeeper_hardware::HardwareError;
use keykeeper_storage::{MismatchError, StorageError};
use thiserror::Error;

/// Why a session or the whole supervisor stopped.
#[derive(Debug, Error)]
pub enum CentralError {
    /// Transport fault; the session is retried after a backoff
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    /// Central disagrees with the roster
    #[error(transparent)]
    Mismatch(#[from] MismatchError),

    /// Roster unusable
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CentralError {
    /// Whether the controller must stop instead of reconnecting.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Hardware(_))
    }
}

pub type Result<T> = std::result::Result<T, CentralError>;
