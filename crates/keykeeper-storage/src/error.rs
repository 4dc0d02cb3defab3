use thiserror::Error;

/// Failures reading the local authorization store.
///
/// All of them are startup-fatal: the controller refuses to run against a
/// roster it could not read in full.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File missing or unreadable
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Another process holds the roster lock
    #[error("{path} is locked by another process")]
    Locked { path: String },

    /// Identity file has no parseable first line
    #[error("No central identity in {path}")]
    MissingIdentity { path: String },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Disagreement between what the central reports and the local roster.
///
/// Either the roster or the central's bond table has been tampered with or
/// has drifted; the controller stops rather than unlock on stale data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MismatchError {
    /// The three lists differ in length
    #[error("Record count mismatch: {bonds} bonds, {spacekeys} spacekeys, {coins} coins")]
    Count {
        bonds: usize,
        spacekeys: usize,
        coins: usize,
    },

    /// Addresses at one position disagree
    #[error("Address mismatch at index {index}: coin {coin}, bond {bond}, spacekey {spacekey}")]
    Address {
        index: usize,
        coin: String,
        bond: String,
        spacekey: String,
    },

    /// Key fragment at one position disagrees with the roster
    #[error("Spacekey fragment mismatch at index {index} for {address}")]
    Fragment { index: usize, address: String },

    /// The central reports a different identity than expected
    #[error("Central identity mismatch: expected {expected}, reported {reported}")]
    Identity { expected: String, reported: String },
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
