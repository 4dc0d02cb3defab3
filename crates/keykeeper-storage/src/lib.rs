//! Local authorization store for the keykeeper controller.
//!
//! The store is the site's ground truth: which coins were provisioned, with
//! which keys, and which central they were paired to. It is read once at
//! startup ([`CoinDatabase::load`]) and then used to cross-check what the
//! central reports about itself ([`validate_enumeration`],
//! [`validate_identity`]).
//!
//! # Examples
//!
//! ```no_run
//! use keykeeper_storage::{CoinDatabase, StoreConfig};
//!
//! # fn example() -> Result<(), keykeeper_storage::StorageError> {
//! let db = CoinDatabase::load(&StoreConfig::in_dir("/var/lib/keykeeper"))?;
//! println!("{} coins", db.coins().len());
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod error;
pub mod validator;

pub use database::{CoinDatabase, StoreConfig};
pub use error::{MismatchError, StorageError, StorageResult};
pub use validator::{validate_enumeration, validate_identity};
