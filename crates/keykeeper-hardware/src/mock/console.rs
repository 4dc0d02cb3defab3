//! Mock console implementation for testing and development.
//!
//! A [`MockConsole`] replays lines pushed through its [`MockConsoleHandle`]
//! and records every command written to it. Dropping or disconnecting the
//! handle makes the next read fail with
//! [`HardwareError::Disconnected`](crate::HardwareError::Disconnected), the
//! same way an unplugged serial adapter does.

use crate::{
    HardwareError, Result,
    traits::{ConsoleConnector, ConsoleTransport},
    types::DeviceInfo,
};
use keykeeper_protocol::ConsoleCommand;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

type SentLog = Arc<Mutex<Vec<ConsoleCommand>>>;

/// Mock console for testing and development.
///
/// # Examples
///
/// ```
/// use keykeeper_hardware::mock::MockConsole;
/// use keykeeper_hardware::traits::ConsoleTransport;
/// use keykeeper_protocol::ConsoleCommand;
///
/// #[tokio::main]
/// async fn main() -> keykeeper_hardware::Result<()> {
///     let (mut console, handle) = MockConsole::new();
///
///     console.send(ConsoleCommand::BleStart).await?;
///     handle.push_line("<inf> app: Bluetooth initialized")?;
///
///     assert_eq!(console.read_line().await?, "<inf> app: Bluetooth initialized");
///     assert_eq!(handle.sent_commands(), vec![ConsoleCommand::BleStart]);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockConsole {
    line_rx: mpsc::UnboundedReceiver<String>,
    sent: SentLog,
    name: String,
}

impl MockConsole {
    /// Create a new mock console with the default name.
    pub fn new() -> (Self, MockConsoleHandle) {
        Self::with_name("mock-console".to_string())
    }

    /// Create a new mock console with a custom name.
    pub fn with_name(name: String) -> (Self, MockConsoleHandle) {
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let sent = SentLog::default();

        let console = Self {
            line_rx,
            sent: Arc::clone(&sent),
            name: name.clone(),
        };

        let handle = MockConsoleHandle {
            line_tx: Some(line_tx),
            sent,
            name,
        };

        (console, handle)
    }

    /// Console that yields `lines` and then reports a disconnect.
    ///
    /// The returned handle can still inspect sent commands.
    pub fn scripted<I, S>(lines: I) -> (Self, MockConsoleHandle)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (console, mut handle) = Self::new();
        for line in lines {
            // The receiver is alive in `console`; the send cannot fail.
            let _ = handle.push_line(line);
        }
        handle.disconnect();
        (console, handle)
    }
}

impl ConsoleTransport for MockConsole {
    async fn send(&mut self, command: ConsoleCommand) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(command);
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String> {
        self.line_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(self.name.clone()))
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new("mock", self.name.clone())
    }
}

/// Handle for driving a [`MockConsole`].
#[derive(Debug)]
pub struct MockConsoleHandle {
    line_tx: Option<mpsc::UnboundedSender<String>>,
    sent: SentLog,
    name: String,
}

impl MockConsoleHandle {
    /// Queue one line for the console to read.
    pub fn push_line(&self, line: impl Into<String>) -> Result<()> {
        let tx = self
            .line_tx
            .as_ref()
            .ok_or_else(|| HardwareError::disconnected(self.name.clone()))?;
        tx.send(line.into())
            .map_err(|_| HardwareError::disconnected(self.name.clone()))
    }

    /// Queue several lines in order.
    pub fn push_lines<I, S>(&self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.push_line(line)?;
        }
        Ok(())
    }

    /// Simulate unplugging the device once queued lines are consumed.
    pub fn disconnect(&mut self) {
        self.line_tx = None;
    }

    /// Commands written to the console so far, in order.
    pub fn sent_commands(&self) -> Vec<ConsoleCommand> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

enum Slot {
    Console(MockConsole),
    Failure(String),
}

/// Connector handing out prepared mock consoles, one per connect.
///
/// Once every prepared slot is used, `connect` never completes, which
/// parks the caller until it is cancelled.
pub struct MockConnector {
    slots: VecDeque<Slot>,
    attempts: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self {
            slots: VecDeque::new(),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Append a console to hand out.
    pub fn push_console(&mut self, console: MockConsole) -> &mut Self {
        self.slots.push_back(Slot::Console(console));
        self
    }

    /// Append an open failure.
    pub fn push_failure(&mut self, message: impl Into<String>) -> &mut Self {
        self.slots.push_back(Slot::Failure(message.into()));
        self
    }

    /// Counter of connect calls, shared so it stays readable after the
    /// connector is moved.
    pub fn attempts(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleConnector for MockConnector {
    type Console = MockConsole;

    async fn connect(&mut self) -> Result<MockConsole> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.slots.pop_front() {
            Some(Slot::Console(console)) => Ok(console),
            Some(Slot::Failure(message)) => Err(HardwareError::open_failed("mock", message)),
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lines_are_read_in_order() {
        let (mut console, handle) = MockConsole::new();
        handle.push_lines(["first", "second"]).unwrap();

        assert_eq!(console.read_line().await.unwrap(), "first");
        assert_eq!(console.read_line().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_disconnect_after_queued_lines() {
        let (mut console, mut handle) = MockConsole::with_name("acm0".to_string());
        handle.push_line("done").unwrap();
        handle.disconnect();

        assert_eq!(console.read_line().await.unwrap(), "done");
        let err = console.read_line().await.unwrap_err();
        assert!(matches!(err, HardwareError::Disconnected { ref device } if device == "acm0"));
        assert!(handle.push_line("late").is_err());
    }

    #[tokio::test]
    async fn test_scripted_console() {
        let (mut console, handle) = MockConsole::scripted(["a", "b"]);
        console.send(ConsoleCommand::Reboot).await.unwrap();

        assert_eq!(console.read_line().await.unwrap(), "a");
        assert_eq!(console.read_line().await.unwrap(), "b");
        assert!(console.read_line().await.is_err());
        assert_eq!(handle.sent_commands(), vec![ConsoleCommand::Reboot]);
    }

    #[tokio::test]
    async fn test_connector_hands_out_slots_in_order() {
        let (console, _handle) = MockConsole::with_name("second".to_string());
        let mut connector = MockConnector::new();
        connector.push_failure("no such device").push_console(console);
        let attempts = connector.attempts();

        assert!(matches!(
            connector.connect().await,
            Err(HardwareError::OpenFailed { .. })
        ));
        let console = connector.connect().await.unwrap();
        assert_eq!(console.info().path, "second");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_connector_pends() {
        let mut connector = MockConnector::new();
        let result = tokio::time::timeout(Duration::from_secs(60), connector.connect()).await;
        assert!(result.is_err());
    }
}
