//! Core constants for the keykeeper console protocol.
//!
//! This module defines the protocol-level constants shared by every crate in
//! the workspace: console command strings, record widths of the local
//! authorization files, and the defaults of every configuration surface.
//!
//! # Console Protocol
//!
//! The central exposes a Zephyr shell over USB CDC-ACM. Commands are plain
//! ASCII terminated by CRLF; responses are free-form log lines, some of them
//! color-coded with ANSI escape sequences:
//!
//! ```text
//! uart:~$ stats bonds
//! [C4:8B:42:80:CC:CA] keys: 34, flags: 17
//! done
//! [00:00:12.345,000] <inf> app: Connected: [C4:8B:42:80:CC:CA]
//! ```
//!
//! # Usage
//!
//! ```
//! use keykeeper_core::constants::*;
//!
//! assert_eq!(CMD_STATS_BONDS, "stats bonds");
//! assert_eq!(DUMP_END_MARKER, "done");
//!
//! use std::time::Duration;
//! let backoff = Duration::from_secs(DEFAULT_RECONNECT_BACKOFF_SECS);
//! assert_eq!(backoff.as_secs(), 5);
//! ```

// ============================================================================
// Console Commands
// ============================================================================

/// Starts the BLE stack (scanning and connecting to coins).
pub const CMD_BLE_START: &str = "ble_start";

/// Dumps the bonds stored on the central, one `[addr] keys: .., flags: ..`
/// line per bond, followed by [`DUMP_END_MARKER`].
pub const CMD_STATS_BONDS: &str = "stats bonds";

/// Dumps the first byte of every stored spacekey, one `[addr] : XX...` line
/// per coin, followed by [`DUMP_END_MARKER`].
pub const CMD_STATS_SPACEKEY: &str = "stats spacekey";

/// Reboots the central. Sent best-effort on shutdown.
pub const CMD_REBOOT: &str = "reboot";

/// Terminator appended to every command written to the console.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Literal line closing a `stats` dump.
pub const DUMP_END_MARKER: &str = "done";

// ============================================================================
// Record Widths
// ============================================================================

/// Length of a textual BLE address (`AA:BB:CC:DD:EE:FF`).
pub const ADDRESS_LENGTH: usize = 17;

/// Number of bytes in a BLE address.
pub const ADDRESS_BYTES: usize = 6;

/// Hex length of an identity resolving key (16 bytes).
pub const IRK_HEX_LENGTH: usize = 32;

/// Hex length of a long term key (16 bytes).
pub const LTK_HEX_LENGTH: usize = 32;

/// Hex length of a spacekey (32 bytes).
pub const SPACEKEY_HEX_LENGTH: usize = 64;

/// Hex length of the spacekey prefix reported by `stats spacekey`.
pub const KEY_FRAGMENT_LENGTH: usize = 2;

// ============================================================================
// Serial Transport
// ============================================================================

/// Stable udev path of the keykeeper central.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/serial/by-id/usb-ZEPHYR_N39_BLE_KEYKEEPER_0.01-if00";

/// Baud rate used when opening the console. CDC-ACM ignores it, but a real
/// UART bridge does not.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Maximum length of a console line before it is force-split.
///
/// Zephyr shell lines are well under 256 bytes; anything beyond this is
/// noise and must not grow the read buffer without bound.
pub const MAX_LINE_LENGTH: usize = 4 * 1024;

/// Session-relevant log lines kept while the `stats` dumps run. Older
/// lines are dropped first.
pub const MAX_PASSTHROUGH_LINES: usize = 64;

// ============================================================================
// Supervisor Timing
// ============================================================================

/// Delay between a transport fault and the next open attempt, in seconds.
pub const DEFAULT_RECONNECT_BACKOFF_SECS: u64 = 5;

/// Upper bound for the best-effort `reboot` write on shutdown, in milliseconds.
pub const DEFAULT_REBOOT_TIMEOUT_MS: u64 = 500;

// ============================================================================
// Authorization Store
// ============================================================================

/// Roster of authorized coins: `<addr> <irk> <ltk> <spacekey>` per line.
pub const DEFAULT_COINS_FILE: &str = "coins.txt";

/// Identity of the central: `<addr> <irk>` on the first line.
pub const DEFAULT_CENTRAL_FILE: &str = "central.txt";

/// Optional display names: `<addr> <name>` per line.
pub const DEFAULT_NAMES_FILE: &str = "names.txt";

// ============================================================================
// MQTT Notification
// ============================================================================

/// Topic the unlock message is published to.
pub const DEFAULT_MQTT_TOPIC: &str = "Things/Door";

/// Broker host.
pub const DEFAULT_MQTT_HOST: &str = "localhost";

/// Broker port.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Delivery quality (exactly once).
pub const DEFAULT_MQTT_QOS: u8 = 2;

/// Payload understood by the door controller.
pub const DEFAULT_MQTT_PAYLOAD: &[u8] = b"open";

/// Upper bound for one complete publish (connect, publish, ack, disconnect).
pub const DEFAULT_PUBLISH_TIMEOUT_MS: u64 = 3000;
