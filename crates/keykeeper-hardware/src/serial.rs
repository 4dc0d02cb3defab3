//! USB serial transport for the keykeeper central.
//!
//! The board enumerates as a CDC-ACM device. Its stable by-id path is a
//! symlink that udev re-points whenever the board re-enumerates, so the link
//! is resolved again on every open instead of once at startup.

use crate::{
    HardwareError, Result,
    traits::{ConsoleConnector, ConsoleTransport},
    types::DeviceInfo,
};
use futures::{SinkExt, StreamExt};
use keykeeper_protocol::{ConsoleCodec, ConsoleCommand};
use keykeeper_core::constants::{DEFAULT_BAUD_RATE, DEFAULT_DEVICE_PATH};
use std::path::PathBuf;
use std::time::Duration;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tokio_util::codec::Framed;
use tracing::{debug, info, trace};

/// Serial port settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, usually a `/dev/serial/by-id/` symlink.
    pub device_path: PathBuf,

    /// Line speed. CDC-ACM ignores it but the driver requires one.
    pub baud_rate: u32,

    /// Bound on a single command write.
    pub write_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device_path: PathBuf::from(DEFAULT_DEVICE_PATH),
            baud_rate: DEFAULT_BAUD_RATE,
            write_timeout: Duration::from_secs(1),
        }
    }
}

impl SerialConfig {
    /// Create config for the given device path with default settings.
    pub fn new(device_path: impl Into<PathBuf>) -> Self {
        Self {
            device_path: device_path.into(),
            ..Default::default()
        }
    }

    /// Set the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

/// An open serial console.
pub struct SerialConsole {
    framed: Framed<SerialStream, ConsoleCodec>,
    info: DeviceInfo,
    write_timeout: Duration,
}

impl SerialConsole {
    /// Resolve the configured path and open the port.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let configured = config.device_path.display().to_string();
        let resolved = std::fs::canonicalize(&config.device_path)
            .map_err(|e| HardwareError::open_failed(&configured, e.to_string()))?;
        let resolved = resolved.to_string_lossy().into_owned();

        debug!(path = %configured, resolved = %resolved, "Resolved console device");

        let stream = tokio_serial::new(&resolved, config.baud_rate)
            .open_native_async()
            .map_err(|e| HardwareError::open_failed(&resolved, e.to_string()))?;

        let info = DeviceInfo::new("serial", configured).with_baud_rate(config.baud_rate);
        info!(device = %info, "Console opened");

        Ok(Self {
            framed: Framed::new(stream, ConsoleCodec::new()),
            info,
            write_timeout: config.write_timeout,
        })
    }
}

impl ConsoleTransport for SerialConsole {
    async fn send(&mut self, command: ConsoleCommand) -> Result<()> {
        trace!(%command, "Writing console command");
        match tokio::time::timeout(self.write_timeout, self.framed.send(command)).await {
            Ok(result) => result.map_err(HardwareError::from),
            Err(_) => Err(HardwareError::timeout(self.write_timeout.as_millis() as u64)),
        }
    }

    async fn read_line(&mut self) -> Result<String> {
        match self.framed.next().await {
            Some(Ok(line)) => Ok(line),
            Some(Err(e)) => Err(HardwareError::from(e)),
            None => Err(HardwareError::disconnected(self.info.path.clone())),
        }
    }

    fn info(&self) -> DeviceInfo {
        self.info.clone()
    }
}

/// Opens a [`SerialConsole`] from a fixed config on every connect.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    config: SerialConfig,
}

impl SerialConnector {
    pub fn new(config: SerialConfig) -> Self {
        Self { config }
    }
}

impl ConsoleConnector for SerialConnector {
    type Console = SerialConsole;

    async fn connect(&mut self) -> Result<SerialConsole> {
        SerialConsole::open(&self.config)
    }
}
