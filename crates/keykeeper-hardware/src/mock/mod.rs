//! Mock console implementations for testing and development.
//!
//! These stand in for the USB serial port so the controller can be exercised
//! without a keykeeper board attached.

pub mod console;

pub use console::{MockConnector, MockConsole, MockConsoleHandle};
