//! Console transport layer for the keykeeper controller.
//!
//! The central is reached through a line-oriented shell on a USB serial port.
//! This crate hides that port behind two traits so the controller logic never
//! touches a file descriptor:
//!
//! - [`ConsoleTransport`]: send one command, read one decoded line.
//! - [`ConsoleConnector`]: open a fresh console, once per session.
//!
//! [`SerialConnector`] opens the real device; [`mock::MockConnector`] hands
//! out scripted consoles for tests.
//!
//! # Example
//!
//! ```no_run
//! use keykeeper_hardware::{ConsoleConnector, ConsoleTransport, SerialConfig, SerialConnector};
//! use keykeeper_protocol::ConsoleCommand;
//!
//! #[tokio::main]
//! async fn main() -> keykeeper_hardware::Result<()> {
//!     let mut connector = SerialConnector::new(SerialConfig::new("/dev/ttyACM0"));
//!     let mut console = connector.connect().await?;
//!
//!     console.send(ConsoleCommand::BleStart).await?;
//!     loop {
//!         println!("{}", console.read_line().await?);
//!     }
//! }
//! ```
//!
//! # Errors
//!
//! Every [`HardwareError`] is recoverable from the controller's point of
//! view: the session is dropped and the port reopened after a backoff.

pub mod error;
pub mod mock;
pub mod serial;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use serial::{SerialConfig, SerialConnector, SerialConsole};
pub use traits::{ConsoleConnector, ConsoleTransport};
pub use types::DeviceInfo;
