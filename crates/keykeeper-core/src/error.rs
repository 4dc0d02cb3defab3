use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid BLE address: {0}")]
    InvalidAddress(String),

    #[error("Invalid key fragment: {0}")]
    InvalidKeyFragment(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Invalid QoS level: {0} (expected 0, 1 or 2)")]
    InvalidQos(u8),
}

pub type Result<T> = std::result::Result<T, Error>;
