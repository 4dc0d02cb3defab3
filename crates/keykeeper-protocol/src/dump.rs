//! Parser for the tabular `stats` dumps printed by the central.
//!
//! A dump is requested with a shell command and arrives as:
//!
//! ```text
//! uart:~$ stats bonds                       <- echo, marks the start
//! [C4:8B:42:80:CC:CA] keys: 34, flags: 17   <- one row per record
//! [F8:4C:B0:F1:5A:43] keys: 34, flags: 17
//! done                                      <- end marker
//! ```
//!
//! Lines before the echo are leftovers from earlier output and are dropped.
//! Lines between the echo and the end marker that do not parse as a row
//! (headers, interleaved log output) are skipped.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────────┐  echo line   ┌─────────────┐  "done"   ┌──────┐
//! │ WaitingEcho │─────────────>│ ReadingRows │──────────>│ Done │
//! └─────────────┘              └─────────────┘           └──────┘
//!   other lines                  row -> record
//!   dropped                      other lines skipped
//! ```
//!
//! The parser is fed one decoded line at a time and never touches the
//! transport, so the same logic runs over a serial port, a mock, or a
//! fixed list of lines.
//!
//! ```
//! use keykeeper_core::Bond;
//! use keykeeper_protocol::{DumpParser, DumpState};
//!
//! let mut parser = DumpParser::<Bond>::new();
//! for line in ["uart:~$ stats bonds", "[C4:8B:42:80:CC:CA] keys: 34, flags: 17", "done"] {
//!     parser.feed(line);
//! }
//! assert_eq!(parser.state(), DumpState::Done);
//! assert_eq!(parser.into_records().len(), 1);
//! ```

use regex::Regex;
use std::sync::LazyLock;

use crate::ConsoleCommand;
use keykeeper_core::constants::DUMP_END_MARKER;
use keykeeper_core::{BleAddress, Bond, KeyFragment, SpaceKey};

static BOND_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.{17})\] keys: 34, flags: 17$").expect("valid regex"));

static SPACEKEY_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.{17})\] : ([A-F0-9]{2})\.\.\.$").expect("valid regex"));

/// A record type that can be enumerated with a `stats` dump.
pub trait DumpRecord: Sized {
    /// Command requesting the dump.
    const COMMAND: ConsoleCommand;

    /// Parse one row of the dump, `None` if the line is not a row.
    fn parse_row(line: &str) -> Option<Self>;
}

impl DumpRecord for Bond {
    const COMMAND: ConsoleCommand = ConsoleCommand::StatsBonds;

    fn parse_row(line: &str) -> Option<Self> {
        let captures = BOND_ROW.captures(line)?;
        let address = BleAddress::new(captures.get(1)?.as_str()).ok()?;
        Some(Bond { address })
    }
}

impl DumpRecord for SpaceKey {
    const COMMAND: ConsoleCommand = ConsoleCommand::StatsSpacekey;

    fn parse_row(line: &str) -> Option<Self> {
        let captures = SPACEKEY_ROW.captures(line)?;
        let address = BleAddress::new(captures.get(1)?.as_str()).ok()?;
        let fragment = KeyFragment::new(captures.get(2)?.as_str()).ok()?;
        Some(SpaceKey { address, fragment })
    }
}

/// Position of a [`DumpParser`] within the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpState {
    /// Dropping lines until the command echo shows up.
    WaitingEcho,

    /// Collecting rows until the end marker.
    ReadingRows,

    /// End marker seen; further lines are ignored.
    Done,
}

/// Line-fed parser for one dump of `R` records.
#[derive(Debug)]
pub struct DumpParser<R> {
    state: DumpState,
    records: Vec<R>,
    skipped: usize,
}

impl<R: DumpRecord> DumpParser<R> {
    pub fn new() -> Self {
        Self {
            state: DumpState::WaitingEcho,
            records: Vec::new(),
            skipped: 0,
        }
    }

    /// Command whose response this parser expects.
    pub fn command(&self) -> ConsoleCommand {
        R::COMMAND
    }

    /// Feed one decoded line and return the resulting state.
    pub fn feed(&mut self, line: &str) -> DumpState {
        match self.state {
            DumpState::WaitingEcho => {
                if R::COMMAND.is_echoed_by(line) {
                    self.state = DumpState::ReadingRows;
                }
            }
            DumpState::ReadingRows => {
                if line.trim_end() == DUMP_END_MARKER {
                    self.state = DumpState::Done;
                } else if let Some(record) = R::parse_row(line) {
                    self.records.push(record);
                } else {
                    self.skipped += 1;
                }
            }
            DumpState::Done => {}
        }
        self.state
    }

    pub fn state(&self) -> DumpState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == DumpState::Done
    }

    /// Records parsed so far, in the order the central printed them.
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Lines between the echo and the end marker that were not rows.
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    pub fn into_records(self) -> Vec<R> {
        self.records
    }
}

impl<R: DumpRecord> Default for DumpParser<R> {
    fn default() -> Self {
        Self::new()
    }
}
