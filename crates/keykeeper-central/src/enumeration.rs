//! Drives the `stats` dumps over a live console.
//!
//! The parsing lives in [`keykeeper_protocol::dump`]; this module only sends
//! the command and pumps lines into the parser until it reports the end
//! marker.
//!
//! `ble_start` precedes the dumps, so scan output interleaves with the
//! tables. Of the lines outside the tables only those the session acts on
//! are kept for replay, and at most [`MAX_PASSTHROUGH_LINES`] of them.

use keykeeper_core::constants::MAX_PASSTHROUGH_LINES;
use keykeeper_core::{Bond, SpaceKey};
use keykeeper_hardware::{ConsoleTransport, Result};
use keykeeper_protocol::{ConsoleEvent, DumpParser, DumpRecord, classify};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// What the central reported about its bonds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    /// Rows of `stats bonds`, in device order
    pub bonds: Vec<Bond>,

    /// Rows of `stats spacekey`, in device order
    pub spacekeys: Vec<SpaceKey>,

    /// Session-relevant lines read during the dumps that were not part of
    /// either table, oldest first.
    pub passthrough: VecDeque<String>,
}

/// Request one dump and collect its rows.
///
/// Lines the dump did not consume and the session would act on are
/// appended to `passthrough`, which never exceeds
/// [`MAX_PASSTHROUGH_LINES`].
///
/// # Errors
///
/// Any transport error; there are no retries.
pub async fn request_dump<R, C>(
    console: &mut C,
    passthrough: &mut VecDeque<String>,
) -> Result<Vec<R>>
where
    R: DumpRecord,
    C: ConsoleTransport,
{
    let mut parser = DumpParser::<R>::new();
    console.send(parser.command()).await?;

    let mut dropped = 0usize;
    while !parser.is_done() {
        let line = console.read_line().await?;
        let state = parser.state();
        let rows = parser.records().len();

        let consumed = parser.feed(&line) != state || parser.records().len() != rows;
        if consumed || !affects_session(&line) {
            continue;
        }
        if passthrough.len() == MAX_PASSTHROUGH_LINES {
            passthrough.pop_front();
            dropped += 1;
        }
        passthrough.push_back(line);
    }

    if dropped > 0 {
        warn!(dropped, "Dropped log lines received during dump");
    }
    debug!(
        command = %parser.command(),
        rows = parser.records().len(),
        skipped = parser.skipped_lines(),
        "Dump complete"
    );
    Ok(parser.into_records())
}

fn affects_session(line: &str) -> bool {
    let event = classify(line);
    event.is_recognized() && !matches!(event, ConsoleEvent::DeviceFound { .. })
}

/// Enumerate bonds, then spacekeys.
pub async fn enumerate<C: ConsoleTransport>(console: &mut C) -> Result<Enumeration> {
    let mut passthrough = VecDeque::new();
    let bonds = request_dump::<Bond, _>(console, &mut passthrough).await?;
    let spacekeys = request_dump::<SpaceKey, _>(console, &mut passthrough).await?;
    Ok(Enumeration {
        bonds,
        spacekeys,
        passthrough,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keykeeper_hardware::HardwareError;
    use keykeeper_hardware::mock::MockConsole;
    use keykeeper_protocol::ConsoleCommand;

    #[tokio::test]
    async fn test_enumerate() {
        let (mut console, handle) = MockConsole::scripted([
            "<inf> bt_hci_core: Identity: EA:AE:EF:BE:AD:DE (random)",
            "uart:~$ stats bonds",
            "[C4:8B:42:80:CC:CA] keys: 34, flags: 17",
            "[F8:4C:B0:F1:5A:43] keys: 34, flags: 17",
            "done",
            "uart:~$ stats spacekey",
            "[C4:8B:42:80:CC:CA] : 4F...",
            "<inf> app: Scanning...",
            "[F8:4C:B0:F1:5A:43] : 0A...",
            "done",
        ]);

        let enumeration = enumerate(&mut console).await.unwrap();

        assert_eq!(enumeration.bonds.len(), 2);
        assert_eq!(enumeration.spacekeys[1].fragment.as_str(), "0A");
        assert_eq!(
            enumeration.passthrough,
            ["<inf> bt_hci_core: Identity: EA:AE:EF:BE:AD:DE (random)"]
        );
        assert_eq!(
            handle.sent_commands(),
            [ConsoleCommand::StatsBonds, ConsoleCommand::StatsSpacekey]
        );
    }

    #[tokio::test]
    async fn test_empty_dump() {
        let (mut console, _handle) = MockConsole::scripted(["stats bonds", "done"]);
        let bonds = request_dump::<Bond, _>(&mut console, &mut VecDeque::new())
            .await
            .unwrap();
        assert!(bonds.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_mid_dump() {
        let (mut console, _handle) =
            MockConsole::scripted(["stats bonds", "[C4:8B:42:80:CC:CA] keys: 34, flags: 17"]);
        let err = request_dump::<Bond, _>(&mut console, &mut VecDeque::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HardwareError::Disconnected { .. }));
    }

    #[tokio::test]
    async fn test_scan_output_without_echo_is_not_kept() {
        let found = "<inf> app: Device found: [C4:8B:42:80:CC:CA] (RSSI -67) (TYPE 1) (BONDED 1)";
        let (mut console, _handle) = MockConsole::scripted(vec![found; 20_000]);

        let mut passthrough = VecDeque::new();
        let err = request_dump::<Bond, _>(&mut console, &mut passthrough)
            .await
            .unwrap_err();

        assert!(matches!(err, HardwareError::Disconnected { .. }));
        assert!(passthrough.is_empty());
    }

    #[tokio::test]
    async fn test_passthrough_keeps_newest_lines() {
        let battery: Vec<String> = (0..MAX_PASSTHROUGH_LINES + 10)
            .map(|n| format!("<inf> app: Battery Level: {}%", n % 100))
            .collect();
        let mut script = battery.clone();
        script.extend(["uart:~$ stats bonds".to_string(), "done".to_string()]);
        let (mut console, _handle) = MockConsole::scripted(script);

        let mut passthrough = VecDeque::new();
        request_dump::<Bond, _>(&mut console, &mut passthrough)
            .await
            .unwrap();

        assert_eq!(passthrough.len(), MAX_PASSTHROUGH_LINES);
        assert_eq!(passthrough.front(), Some(&battery[10]));
        assert_eq!(passthrough.back(), battery.last());
    }
}
