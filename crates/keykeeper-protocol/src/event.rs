//! Classification of console log lines into typed events.
//!
//! The central reports everything through the Zephyr logger. Six line shapes
//! carry meaning for the door controller; everything else is chatter.
//!
//! | Kind | Example line |
//! |------|--------------|
//! | `Identity` | `<inf> bt_hci_core: Identity: D3:1A:7C:22:0E:4B (random)` |
//! | `DeviceFound` | `<inf> app: Device found: [C4:8B:42:80:CC:CA] (RSSI -67) (TYPE 1) (BONDED 1)` |
//! | `BatteryLevel` | `<inf> app: Battery Level: 87%` |
//! | `Connected` | `<inf> app: Connected: [C4:8B:42:80:CC:CA]` |
//! | `Authenticated` | `<inf> app: KEY AUTHENTICATED. OPEN DOOR PLEASE.` |
//! | `Disconnected` | `<inf> app: Disconnected: [C4:8B:42:80:CC:CA] (reason 19)` |
//!
//! Lines are matched anywhere (the logger prefixes a timestamp), against an
//! ordered table; the first shape that matches wins.
//!
//! ```
//! use keykeeper_protocol::{ConsoleEvent, classify};
//!
//! let event = classify("[00:00:04.211,000] <inf> app: Battery Level: 87%");
//! assert_eq!(event, ConsoleEvent::BatteryLevel { percent: 87 });
//!
//! assert_eq!(classify("uart:~$ "), ConsoleEvent::Unrecognized);
//! ```

use regex::{Captures, Regex};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// The six meaningful line shapes, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Identity,
    DeviceFound,
    BatteryLevel,
    Connected,
    Authenticated,
    Disconnected,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Identity => "Identity",
            EventKind::DeviceFound => "DeviceFound",
            EventKind::BatteryLevel => "BatteryLevel",
            EventKind::Connected => "Connected",
            EventKind::Authenticated => "Authenticated",
            EventKind::Disconnected => "Disconnected",
        };
        f.write_str(name)
    }
}

/// A classified console line.
///
/// Addresses are kept exactly as printed by the central; normalizing them is
/// up to the consumer. Numbers too wide for their field saturate, so a line
/// that matches a shape always yields that shape's event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// The central's own identity address, printed at boot.
    Identity { address: String, qualifier: String },

    /// A peer seen while scanning.
    DeviceFound {
        address: String,
        rssi: i32,
        address_type: u8,
        bonded: bool,
    },

    /// Battery level of the connected coin, in percent (not range checked).
    BatteryLevel { percent: u16 },

    /// A coin connected.
    Connected { address: String },

    /// The connected coin proved possession of its spacekey.
    Authenticated,

    /// A coin disconnected, with the HCI reason code (informational only).
    Disconnected { address: String, reason: u32 },

    /// Anything else.
    Unrecognized,
}

impl ConsoleEvent {
    /// Kind of this event, `None` for [`ConsoleEvent::Unrecognized`].
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            ConsoleEvent::Identity { .. } => Some(EventKind::Identity),
            ConsoleEvent::DeviceFound { .. } => Some(EventKind::DeviceFound),
            ConsoleEvent::BatteryLevel { .. } => Some(EventKind::BatteryLevel),
            ConsoleEvent::Connected { .. } => Some(EventKind::Connected),
            ConsoleEvent::Authenticated => Some(EventKind::Authenticated),
            ConsoleEvent::Disconnected { .. } => Some(EventKind::Disconnected),
            ConsoleEvent::Unrecognized => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.kind().is_some()
    }
}

/// Builds an event from the captures of its pattern. Returns `None` only for
/// a missing capture group.
type EventBuilder = fn(&Captures<'_>) -> Option<ConsoleEvent>;

struct EventShape {
    kind: EventKind,
    pattern: Regex,
    build: EventBuilder,
}

const SHAPES: [(EventKind, &str, EventBuilder); 6] = [
    (
        EventKind::Identity,
        r"<inf> bt_hci_core: Identity: (.{17}) \((.*)\)",
        build_identity,
    ),
    (
        EventKind::DeviceFound,
        r"<inf> app: Device found: \[(.{17})\] \(RSSI (-?\d+)\) \(TYPE (\d)\) \(BONDED (\d)\)",
        build_device_found,
    ),
    (
        EventKind::BatteryLevel,
        r"<inf> app: Battery Level: (\d{1,3})%",
        build_battery_level,
    ),
    (
        EventKind::Connected,
        r"<inf> app: Connected: \[(.{17})\]",
        build_connected,
    ),
    (
        EventKind::Authenticated,
        r"<inf> app: KEY AUTHENTICATED\. OPEN DOOR PLEASE\.",
        build_authenticated,
    ),
    (
        EventKind::Disconnected,
        r"<inf> app: Disconnected: \[(.{17})\] \(reason (\d+)\)",
        build_disconnected,
    ),
];

static EVENT_SHAPES: LazyLock<Vec<EventShape>> = LazyLock::new(|| {
    SHAPES
        .iter()
        .map(|(kind, pattern, build)| EventShape {
            kind: *kind,
            pattern: Regex::new(pattern).expect("valid regex"),
            build: *build,
        })
        .collect()
});

/// Classify one decoded console line.
///
/// Pure and infallible: the same line always yields the same event, and a
/// line matching no shape yields [`ConsoleEvent::Unrecognized`].
pub fn classify(line: &str) -> ConsoleEvent {
    EVENT_SHAPES
        .iter()
        .filter_map(|shape| {
            let captures = shape.pattern.captures(line)?;
            let event = (shape.build)(&captures);
            debug_assert!(event.as_ref().is_none_or(|e| e.kind() == Some(shape.kind)));
            event
        })
        .next()
        .unwrap_or(ConsoleEvent::Unrecognized)
}

fn text(captures: &Captures<'_>, group: usize) -> Option<String> {
    captures.get(group).map(|m| m.as_str().to_string())
}

fn number<T: FromStr>(captures: &Captures<'_>, group: usize) -> Option<T> {
    captures.get(group)?.as_str().parse().ok()
}

/// Like [`number`], but an out-of-range value clamps to `min` or `max`
/// depending on its sign.
fn saturating<T: FromStr>(captures: &Captures<'_>, group: usize, min: T, max: T) -> Option<T> {
    let digits = captures.get(group)?.as_str();
    Some(match digits.parse() {
        Ok(value) => value,
        Err(_) if digits.starts_with('-') => min,
        Err(_) => max,
    })
}

fn build_identity(captures: &Captures<'_>) -> Option<ConsoleEvent> {
    Some(ConsoleEvent::Identity {
        address: text(captures, 1)?,
        qualifier: text(captures, 2)?,
    })
}

fn build_device_found(captures: &Captures<'_>) -> Option<ConsoleEvent> {
    Some(ConsoleEvent::DeviceFound {
        address: text(captures, 1)?,
        rssi: saturating(captures, 2, i32::MIN, i32::MAX)?,
        address_type: number(captures, 3)?,
        bonded: number::<u8>(captures, 4)? != 0,
    })
}

fn build_battery_level(captures: &Captures<'_>) -> Option<ConsoleEvent> {
    Some(ConsoleEvent::BatteryLevel {
        percent: number(captures, 1)?,
    })
}

fn build_connected(captures: &Captures<'_>) -> Option<ConsoleEvent> {
    Some(ConsoleEvent::Connected {
        address: text(captures, 1)?,
    })
}

fn build_authenticated(_: &Captures<'_>) -> Option<ConsoleEvent> {
    Some(ConsoleEvent::Authenticated)
}

fn build_disconnected(captures: &Captures<'_>) -> Option<ConsoleEvent> {
    Some(ConsoleEvent::Disconnected {
        address: text(captures, 1)?,
        reason: saturating(captures, 2, u32::MIN, u32::MAX)?,
    })
}
