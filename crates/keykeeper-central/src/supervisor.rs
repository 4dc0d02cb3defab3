//! Connection supervisor: keeps a session with the central alive forever.
//!
//! # State Machine
//!
//! ```text
//!   ┌────────┐     ┌─────────┐  opened   ┌─────────┐
//!   │ Closed │────>│ Opening │──────────>│ Running │
//!   └────────┘     └─────────┘           └─────────┘
//!                    ^     │ open failed      │ transport fault
//!                    │     v                  │
//!                  ┌─────────┐                │
//!                  │ Backoff │<───────────────┘
//!                  └─────────┘
//! ```
//!
//! A session runs in order:
//!
//! 1. two empty lines to clear half-typed shell input
//! 2. `ble_start`
//! 3. with validation: `stats bonds`, `stats spacekey`, roster check
//! 4. one line at a time: classify, update the session, notify on unlock
//!
//! A transport fault ends the session and, after the backoff, a fresh
//! console is opened with a fresh session. A roster or identity mismatch
//! ends [`Supervisor::run`] with an error. Cancelling the shutdown token
//! is observed while opening, reading and backing off; if a console is
//! open the central is sent `reboot` before returning.

use crate::enumeration::enumerate;
use crate::error::Result;
use crate::session::Session;
use keykeeper_core::CentralIdentity;
use keykeeper_core::constants::{DEFAULT_REBOOT_TIMEOUT_MS, DEFAULT_RECONNECT_BACKOFF_SECS};
use keykeeper_hardware::{ConsoleConnector, ConsoleTransport, DeviceInfo};
use keykeeper_network::Notifier;
use keykeeper_protocol::{ConsoleCommand, classify};
use keykeeper_storage::{CoinDatabase, validate_enumeration};
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Supervisor behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralConfig {
    /// Enumerate and check the central against the roster each session
    pub validate: bool,

    /// Wait between a fault and the next open
    pub reconnect_backoff: Duration,

    /// Bound on the `reboot` write at shutdown
    pub reboot_timeout: Duration,

    /// Print every console line to stdout
    pub echo_lines: bool,
}

impl Default for CentralConfig {
    fn default() -> Self {
        Self {
            validate: true,
            reconnect_backoff: Duration::from_secs(DEFAULT_RECONNECT_BACKOFF_SECS),
            reboot_timeout: Duration::from_millis(DEFAULT_REBOOT_TIMEOUT_MS),
            echo_lines: true,
        }
    }
}

impl CentralConfig {
    /// Enable or disable roster validation
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Set the reconnect backoff
    pub fn reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    /// Set the reboot timeout
    pub fn reboot_timeout(mut self, timeout: Duration) -> Self {
        self.reboot_timeout = timeout;
        self
    }

    /// Enable or disable stdout echo
    pub fn echo_lines(mut self, echo: bool) -> Self {
        self.echo_lines = echo;
        self
    }
}

/// Where the supervisor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Closed,
    Opening,
    Running,
    Backoff,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SupervisorState::Closed => "Closed",
            SupervisorState::Opening => "Opening",
            SupervisorState::Running => "Running",
            SupervisorState::Backoff => "Backoff",
        };
        f.write_str(name)
    }
}

/// Owns the connector, the notifier and the roster for the process lifetime.
pub struct Supervisor<C, N> {
    connector: C,
    notifier: N,
    database: CoinDatabase,
    config: CentralConfig,
    state: SupervisorState,
}

impl<C, N> Supervisor<C, N>
where
    C: ConsoleConnector,
    N: Notifier,
{
    /// # Errors
    ///
    /// [`StorageError::MissingIdentity`](keykeeper_storage::StorageError::MissingIdentity)
    /// if validation is enabled but the roster has no central identity.
    pub fn new(
        connector: C,
        notifier: N,
        database: CoinDatabase,
        config: CentralConfig,
    ) -> Result<Self> {
        if config.validate {
            database.require_identity()?;
        }
        Ok(Self {
            connector,
            notifier,
            database,
            config,
            state: SupervisorState::Closed,
        })
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Run sessions until shutdown or a fatal error.
    ///
    /// Returns `Ok(())` after a shutdown request and the fatal error
    /// otherwise. Transport faults never end this call.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        info!(validate = self.config.validate, "Supervisor starting");

        loop {
            self.state = SupervisorState::Opening;
            let opened = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                opened = self.connector.connect() => Some(opened),
            };
            let Some(opened) = opened else {
                self.close();
                return Ok(());
            };

            let outcome = match opened {
                Ok(mut console) => {
                    self.state = SupervisorState::Running;
                    info!(device = %console.info(), "Connected to central");
                    let outcome = self.run_session(&mut console, &shutdown).await;
                    if outcome.is_ok() {
                        self.reboot(&mut console).await;
                    }
                    outcome
                }
                Err(e) => Err(e.into()),
            };

            match outcome {
                Ok(()) => {
                    self.close();
                    return Ok(());
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Stopping");
                    self.close();
                    return Err(e);
                }
                Err(e) => warn!(error = %e, "Lost connection, reconnecting"),
            }

            self.state = SupervisorState::Backoff;
            let cancelled = tokio::select! {
                biased;
                _ = shutdown.cancelled() => true,
                _ = tokio::time::sleep(self.config.reconnect_backoff) => false,
            };
            if cancelled {
                self.close();
                return Ok(());
            }
        }
    }

    fn close(&mut self) {
        self.state = SupervisorState::Closed;
        info!("Supervisor stopped");
    }

    fn expected_identity(&self) -> Option<CentralIdentity> {
        if self.config.validate {
            self.database.identity().cloned()
        } else {
            None
        }
    }

    /// One session over an open console. `Ok` only on shutdown.
    async fn run_session(
        &mut self,
        console: &mut C::Console,
        shutdown: &CancellationToken,
    ) -> Result<()> {
        let mut console = EchoConsole {
            inner: console,
            echo: self.config.echo_lines,
        };
        let mut session = Session::new(self.expected_identity());

        console.send(ConsoleCommand::Blank).await?;
        console.send(ConsoleCommand::Blank).await?;
        console.send(ConsoleCommand::BleStart).await?;
        info!("Central scanning");

        if self.config.validate {
            let enumeration = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Ok(()),
                enumeration = enumerate(&mut console) => enumeration?,
            };
            validate_enumeration(
                &enumeration.bonds,
                &enumeration.spacekeys,
                self.database.coins(),
            )?;
            info!(coins = self.database.coins().len(), "Central matches roster");

            for line in &enumeration.passthrough {
                self.handle_line(&mut session, line).await?;
            }
        }

        loop {
            let line = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Ok(()),
                line = console.read_line() => line?,
            };
            self.handle_line(&mut session, &line).await?;
        }
    }

    async fn handle_line(&mut self, session: &mut Session, line: &str) -> Result<()> {
        let event = classify(line);
        let Some(request) = session.handle(&event)? else {
            return Ok(());
        };

        info!(
            coin = %self.database.display_name(&request.address),
            battery = request.battery_level,
            "Coin authenticated"
        );
        if let Err(e) = self.notifier.notify(&request).await {
            error!(error = %e, "Failed to send unlock notification");
        }
        Ok(())
    }

    async fn reboot(&self, console: &mut C::Console) {
        match tokio::time::timeout(self.config.reboot_timeout, console.send(ConsoleCommand::Reboot))
            .await
        {
            Ok(Ok(())) => info!("Central reboot requested"),
            Ok(Err(e)) => warn!(error = %e, "Failed to reboot central"),
            Err(_) => warn!(
                timeout_ms = self.config.reboot_timeout.as_millis() as u64,
                "Central reboot timed out"
            ),
        }
    }
}

/// Logs, and optionally prints, every line read through it.
struct EchoConsole<'a, T> {
    inner: &'a mut T,
    echo: bool,
}

impl<T: ConsoleTransport> ConsoleTransport for EchoConsole<'_, T> {
    async fn send(&mut self, command: ConsoleCommand) -> keykeeper_hardware::Result<()> {
        self.inner.send(command).await
    }

    async fn read_line(&mut self) -> keykeeper_hardware::Result<String> {
        let line = self.inner.read_line().await?;
        debug!(line = %line, "Received");
        if self.echo {
            println!("{line}");
        }
        Ok(line)
    }

    fn info(&self) -> DeviceInfo {
        self.inner.info()
    }
}
