//! Commands understood by the central's shell.
//!
//! Every command is written as ASCII followed by CRLF. The shell echoes the
//! command back (behind its `uart:~$ ` prompt) before printing any output,
//! which is how dump responses are delimited.
//!
//! ```
//! use keykeeper_protocol::ConsoleCommand;
//!
//! assert_eq!(ConsoleCommand::StatsBonds.as_str(), "stats bonds");
//! assert_eq!(ConsoleCommand::StatsBonds.to_wire(), b"stats bonds\r\n");
//! ```

use std::fmt;

use keykeeper_core::constants::{
    CMD_BLE_START, CMD_REBOOT, CMD_STATS_BONDS, CMD_STATS_SPACEKEY, LINE_TERMINATOR,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleCommand {
    /// Empty line. Flushes any half-typed input left in the shell.
    Blank,

    /// `ble_start`: start scanning for coins.
    BleStart,

    /// `stats bonds`: dump stored bonds.
    StatsBonds,

    /// `stats spacekey`: dump spacekey prefixes.
    StatsSpacekey,

    /// `reboot`: restart the central.
    Reboot,
}

impl ConsoleCommand {
    /// Command text without terminator.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleCommand::Blank => "",
            ConsoleCommand::BleStart => CMD_BLE_START,
            ConsoleCommand::StatsBonds => CMD_STATS_BONDS,
            ConsoleCommand::StatsSpacekey => CMD_STATS_SPACEKEY,
            ConsoleCommand::Reboot => CMD_REBOOT,
        }
    }

    /// Bytes written to the serial port, terminator included.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut wire = Vec::with_capacity(self.as_str().len() + LINE_TERMINATOR.len());
        wire.extend_from_slice(self.as_str().as_bytes());
        wire.extend_from_slice(LINE_TERMINATOR.as_bytes());
        wire
    }

    /// Whether `line` is the shell's echo of this command.
    ///
    /// The echo is usually prefixed by the prompt and may carry trailing
    /// whitespace, so only the tail is compared.
    pub fn is_echoed_by(&self, line: &str) -> bool {
        !self.as_str().is_empty() && line.trim_end().ends_with(self.as_str())
    }
}

impl fmt::Display for ConsoleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ConsoleCommand::BleStart, b"ble_start\r\n".as_slice())]
    #[case(ConsoleCommand::StatsBonds, b"stats bonds\r\n".as_slice())]
    #[case(ConsoleCommand::StatsSpacekey, b"stats spacekey\r\n".as_slice())]
    #[case(ConsoleCommand::Reboot, b"reboot\r\n".as_slice())]
    #[case(ConsoleCommand::Blank, b"\r\n".as_slice())]
    fn test_wire_format(#[case] cmd: ConsoleCommand, #[case] expected: &[u8]) {
        assert_eq!(cmd.to_wire(), expected);
    }

    #[rstest]
    #[case("uart:~$ stats bonds", true)]
    #[case("stats bonds", true)]
    #[case("uart:~$ stats bonds  ", true)]
    #[case("uart:~$ stats spacekey", false)]
    #[case("[C4:8B:42:80:CC:CA] keys: 34, flags: 17", false)]
    fn test_echo_detection(#[case] line: &str, #[case] echoed: bool) {
        assert_eq!(ConsoleCommand::StatsBonds.is_echoed_by(line), echoed);
    }

    #[test]
    fn test_blank_is_never_echoed() {
        assert!(!ConsoleCommand::Blank.is_echoed_by(""));
        assert!(!ConsoleCommand::Blank.is_echoed_by("uart:~$ "));
    }
}
