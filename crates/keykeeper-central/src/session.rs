//! Per-session state folded from console events.
//!
//! # State Machine
//!
//! ```text
//!            Connected(addr)
//!   ┌──────┐ ───────────────> ┌─────────────────┐
//!   │ Idle │                  │ DeviceConnected │
//!   └──────┘ <─────────────── └─────────────────┘
//!            Disconnected
//! ```
//!
//! Battery reports update the level in either state. An authentication
//! yields an [`UnlockRequest`] built from whatever the session currently
//! holds; the firmware only authenticates connected coins, so in practice
//! the address is set.

use keykeeper_core::{CentralIdentity, UnlockRequest};
use keykeeper_protocol::ConsoleEvent;
use keykeeper_storage::{MismatchError, validate_identity};
use std::fmt;
use tracing::{debug, info};

/// Connection state of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No coin connected
    #[default]
    Idle,

    /// A coin is connected
    DeviceConnected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::DeviceConnected => write!(f, "DeviceConnected"),
        }
    }
}

/// State of one open console session.
///
/// # Examples
///
/// ```
/// use keykeeper_central::Session;
/// use keykeeper_protocol::classify;
///
/// let mut session = Session::new(None);
/// for line in [
///     "<inf> app: Connected: [c4:8b:42:80:cc:ca]",
///     "<inf> app: Battery Level: 87%",
/// ] {
///     session.handle(&classify(line)).unwrap();
/// }
///
/// let unlock = session
///     .handle(&classify("<inf> app: KEY AUTHENTICATED. OPEN DOOR PLEASE."))
///     .unwrap()
///     .unwrap();
/// assert_eq!(unlock.address, "C4:8B:42:80:CC:CA");
/// assert_eq!(unlock.battery_level, 87);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
    connected_address: String,
    battery_level: u16,
    expected_identity: Option<CentralIdentity>,
}

impl Session {
    /// Fresh session. With `expected_identity` set, identity reports from
    /// the central are checked against it.
    pub fn new(expected_identity: Option<CentralIdentity>) -> Self {
        Self {
            expected_identity,
            ..Default::default()
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Address of the connected coin, empty when none.
    pub fn connected_address(&self) -> &str {
        &self.connected_address
    }

    /// Last reported battery level, 0 when unknown.
    pub fn battery_level(&self) -> u16 {
        self.battery_level
    }

    /// Apply one event.
    ///
    /// Returns the unlock to deliver for an authentication, `None` for
    /// every other event.
    ///
    /// # Errors
    ///
    /// [`MismatchError::Identity`] when the central reports an identity
    /// other than the expected one.
    pub fn handle(&mut self, event: &ConsoleEvent) -> Result<Option<UnlockRequest>, MismatchError> {
        match event {
            ConsoleEvent::Identity { address, qualifier } => {
                if let Some(expected) = &self.expected_identity {
                    validate_identity(expected, address)?;
                }
                info!(address = %address, kind = %qualifier, "Central identity");
            }
            ConsoleEvent::Connected { address } => {
                self.state = SessionState::DeviceConnected;
                self.connected_address = address.to_ascii_uppercase();
                info!(address = %self.connected_address, "Coin connected");
            }
            ConsoleEvent::BatteryLevel { percent } => {
                self.battery_level = *percent;
                debug!(battery = percent, "Battery level");
            }
            ConsoleEvent::Authenticated => {
                return Ok(Some(UnlockRequest {
                    address: self.connected_address.clone(),
                    battery_level: self.battery_level,
                }));
            }
            ConsoleEvent::Disconnected { address, reason } => {
                info!(address = %address, reason, "Coin disconnected");
                self.state = SessionState::Idle;
                self.connected_address.clear();
                self.battery_level = 0;
            }
            ConsoleEvent::DeviceFound { .. } | ConsoleEvent::Unrecognized => {}
        }
        Ok(None)
    }
}
