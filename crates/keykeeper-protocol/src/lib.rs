//! Console protocol of the keykeeper central.
//!
//! The central speaks a Zephyr shell over USB serial: commands go in as
//! CRLF-terminated text, and everything comes back as colored log lines
//! mixed with shell echo and tabular dumps. This crate turns that stream
//! into typed values without touching any I/O:
//!
//! - [`ConsoleCodec`]: bytes to clean lines, commands to bytes
//! - [`strip_ansi`]: color and cursor sequence removal
//! - [`DumpParser`]: line-fed parser for `stats bonds` / `stats spacekey`
//! - [`classify`]: log line to [`ConsoleEvent`]
//!
//! # Example
//!
//! ```
//! use keykeeper_protocol::{ConsoleEvent, classify, strip_ansi};
//!
//! let raw = "\x1b[1;32m[00:00:02.100,000] <inf> app: Connected: [C4:8B:42:80:CC:CA]\x1b[0m";
//! let event = classify(&strip_ansi(raw));
//!
//! assert_eq!(
//!     event,
//!     ConsoleEvent::Connected { address: "C4:8B:42:80:CC:CA".to_string() }
//! );
//! ```

pub mod ansi;
pub mod codec;
pub mod commands;
pub mod dump;
pub mod event;

pub use ansi::strip_ansi;
pub use codec::ConsoleCodec;
pub use commands::ConsoleCommand;
pub use dump::{DumpParser, DumpRecord, DumpState};
pub use event::{ConsoleEvent, EventKind, classify};
