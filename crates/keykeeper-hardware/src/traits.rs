//! Console transport trait definitions.
//!
//! These traits are the boundary between the console protocol logic and
//! whatever carries the bytes. The supervisor and the enumeration client are
//! generic over them, so the same code drives a USB serial port in production
//! and a scripted mock in tests.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::DeviceInfo;
use keykeeper_protocol::ConsoleCommand;

/// A line-oriented console connection to the central.
///
/// # Object Safety
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters:
///
/// ```no_run
/// use keykeeper_hardware::traits::ConsoleTransport;
/// use keykeeper_hardware::error::Result;
/// use keykeeper_protocol::ConsoleCommand;
///
/// async fn start<C: ConsoleTransport>(console: &mut C) -> Result<String> {
///     console.send(ConsoleCommand::BleStart).await?;
///     console.read_line().await
/// }
/// ```
///
/// # Errors
///
/// Loss of the device must surface as
/// [`HardwareError::Disconnected`](crate::HardwareError::Disconnected) so the
/// supervisor can tell it apart from protocol-level failures.
pub trait ConsoleTransport: Send {
    /// Write one command, CRLF-terminated.
    async fn send(&mut self, command: ConsoleCommand) -> Result<()>;

    /// Wait for the next decoded line.
    ///
    /// This is the controller's only suspension point and may wait
    /// indefinitely while the central is silent. Callers that need to stay
    /// responsive race it against their cancellation signal.
    async fn read_line(&mut self) -> Result<String>;

    /// Description of this console for logs.
    fn info(&self) -> DeviceInfo;
}

/// Opens a fresh console for every session.
///
/// USB re-enumeration invalidates the old file descriptor, so the supervisor
/// never reuses a console across a fault; it asks the connector for a new one.
pub trait ConsoleConnector {
    type Console: ConsoleTransport;

    /// Open the console.
    async fn connect(&mut self) -> Result<Self::Console>;
}
