//! Controller logic for the keykeeper central.
//!
//! Ties the console transport, the roster and the notifier together:
//!
//! - [`enumeration`]: runs the `stats` dumps over a console
//! - [`session`]: folds console events into per-session state
//! - [`supervisor`]: opens the console, validates, runs the event loop and
//!   reconnects after faults
//!
//! # Example
//!
//! ```no_run
//! use keykeeper_central::{CentralConfig, Supervisor};
//! use keykeeper_hardware::{SerialConfig, SerialConnector};
//! use keykeeper_network::{MqttConfig, MqttNotifier};
//! use keykeeper_storage::{CoinDatabase, StoreConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let database = CoinDatabase::load(&StoreConfig::default())?;
//! let mut supervisor = Supervisor::new(
//!     SerialConnector::new(SerialConfig::default()),
//!     MqttNotifier::new(MqttConfig::default()),
//!     database,
//!     CentralConfig::default(),
//! )?;
//!
//! supervisor.run(CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod enumeration;
pub mod error;
pub mod session;
pub mod supervisor;

pub use enumeration::{Enumeration, enumerate, request_dump};
pub use error::{CentralError, Result};
pub use session::{Session, SessionState};
pub use supervisor::{CentralConfig, Supervisor, SupervisorState};
