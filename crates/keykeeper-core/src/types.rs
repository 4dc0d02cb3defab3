use crate::{
    Result,
    constants::{ADDRESS_BYTES, ADDRESS_LENGTH, KEY_FRAGMENT_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// BLE device address in canonical `AA:BB:CC:DD:EE:FF` form.
///
/// Parsing accepts either case and normalizes to uppercase, so two addresses
/// compare equal regardless of how the device or the roster spelled them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BleAddress(String);

impl BleAddress {
    /// Parse and normalize a textual address.
    ///
    /// # Errors
    /// Returns `Error::InvalidAddress` unless the input is six colon-separated
    /// two-digit hex groups.
    pub fn new(address: &str) -> Result<Self> {
        let address = address.trim();
        if address.len() != ADDRESS_LENGTH {
            return Err(Error::InvalidAddress(address.to_string()));
        }

        let well_formed = address.split(':').count() == ADDRESS_BYTES
            && address
                .split(':')
                .all(|group| group.len() == 2 && group.chars().all(|c| c.is_ascii_hexdigit()));
        if !well_formed {
            return Err(Error::InvalidAddress(address.to_string()));
        }

        Ok(BleAddress(address.to_ascii_uppercase()))
    }

    /// Build an address from its little-endian wire representation.
    ///
    /// The firmware stores addresses least significant byte first, so the
    /// textual form is the byte array reversed.
    ///
    /// ```
    /// use keykeeper_core::BleAddress;
    ///
    /// let addr = BleAddress::from_le_bytes([0xde, 0xad, 0xbe, 0xef, 0xae, 0xea]);
    /// assert_eq!(addr.as_str(), "EA:AE:EF:BE:AD:DE");
    /// ```
    #[must_use]
    pub fn from_le_bytes(bytes: [u8; ADDRESS_BYTES]) -> Self {
        let groups: Vec<String> = bytes.iter().rev().map(|b| format!("{b:02X}")).collect();
        BleAddress(groups.join(":"))
    }

    /// Little-endian wire representation of this address.
    #[must_use]
    pub fn to_le_bytes(&self) -> [u8; ADDRESS_BYTES] {
        let mut bytes = [0u8; ADDRESS_BYTES];
        for (slot, group) in bytes.iter_mut().rev().zip(self.0.split(':')) {
            // Validated on construction.
            *slot = u8::from_str_radix(group, 16).unwrap_or_default();
        }
        bytes
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BleAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for BleAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BleAddress::new(s)
    }
}

impl TryFrom<String> for BleAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        BleAddress::new(&value)
    }
}

impl From<BleAddress> for String {
    fn from(value: BleAddress) -> Self {
        value.0
    }
}

/// First byte of a spacekey, as two uppercase hex digits.
///
/// # Security
/// Comparison is constant-time; the fragment is derived from key material.
#[derive(Debug, Clone, Eq)]
pub struct KeyFragment(String);

impl KeyFragment {
    /// # Errors
    /// Returns `Error::InvalidKeyFragment` unless the input is exactly two hex digits.
    pub fn new(fragment: &str) -> Result<Self> {
        if fragment.len() != KEY_FRAGMENT_LENGTH || !fragment.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(Error::InvalidKeyFragment(fragment.to_string()));
        }
        Ok(KeyFragment(fragment.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for KeyFragment {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Display for KeyFragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bond reported by `stats bonds`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bond {
    pub address: BleAddress,
}

/// A spacekey prefix reported by `stats spacekey`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceKey {
    pub address: BleAddress,
    pub fragment: KeyFragment,
}

/// One authorized coin from the local roster.
///
/// The key columns are opaque hex strings; only the first byte of the
/// spacekey is ever checked against the central.
#[derive(Clone, PartialEq, Eq)]
pub struct Coin {
    pub address: BleAddress,
    pub irk: String,
    pub ltk: String,
    pub spacekey: String,
}

impl Coin {
    /// Leading [`KEY_FRAGMENT_LENGTH`] characters of the spacekey.
    ///
    /// # Errors
    /// Returns `Error::InvalidKey` if the spacekey is shorter than a fragment
    /// or does not start with hex digits.
    pub fn key_fragment(&self) -> Result<KeyFragment> {
        let prefix = self
            .spacekey
            .get(..KEY_FRAGMENT_LENGTH)
            .ok_or_else(|| Error::InvalidKey(format!("spacekey of {} too short", self.address)))?;
        KeyFragment::new(prefix)
            .map_err(|_| Error::InvalidKey(format!("spacekey of {} is not hex", self.address)))
    }
}

// Keys stay out of logs.
impl fmt::Debug for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coin")
            .field("address", &self.address)
            .field("irk", &"<redacted>")
            .field("ltk", &"<redacted>")
            .field("spacekey", &"<redacted>")
            .finish()
    }
}

/// Expected identity of the central itself.
#[derive(Clone, PartialEq, Eq)]
pub struct CentralIdentity {
    pub address: BleAddress,
    pub irk: String,
}

impl fmt::Debug for CentralIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CentralIdentity")
            .field("address", &self.address)
            .field("irk", &"<redacted>")
            .finish()
    }
}

/// Snapshot handed to the notifier when a coin authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockRequest {
    /// Address of the connected coin; empty if none was seen this session.
    pub address: String,

    /// Last reported battery level in percent; 0 if unknown.
    pub battery_level: u16,
}

/// MQTT delivery guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QosLevel {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl QosLevel {
    /// # Errors
    /// Returns `Error::InvalidQos` for anything but 0, 1 or 2.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(QosLevel::AtMostOnce),
            1 => Ok(QosLevel::AtLeastOnce),
            2 => Ok(QosLevel::ExactlyOnce),
            _ => Err(Error::InvalidQos(value)),
        }
    }

    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            QosLevel::AtMostOnce => 0,
            QosLevel::AtLeastOnce => 1,
            QosLevel::ExactlyOnce => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("AA:BB:CC:DD:EE:FF", "AA:BB:CC:DD:EE:FF")]
    #[case("c4:8b:42:80:cc:ca", "C4:8B:42:80:CC:CA")]
    #[case(" 01:23:45:67:89:ab ", "01:23:45:67:89:AB")]
    fn test_address_valid(#[case] input: &str, #[case] expected: &str) {
        let addr: BleAddress = input.parse().unwrap();
        assert_eq!(addr.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("AA:BB:CC:DD:EE")] // too short
    #[case("AA-BB-CC-DD-EE-FF")] // wrong separator
    #[case("GG:BB:CC:DD:EE:FF")] // not hex
    #[case("AAA:B:CC:DD:EE:FF")] // misaligned groups
    fn test_address_invalid(#[case] input: &str) {
        assert!(BleAddress::new(input).is_err());
    }

    #[test]
    fn test_address_from_le_bytes() {
        let addr = BleAddress::from_le_bytes([0xde, 0xad, 0xbe, 0xef, 0xae, 0xea]);
        assert_eq!(addr.as_str(), "EA:AE:EF:BE:AD:DE");
    }

    #[test]
    fn test_address_to_le_bytes() {
        let addr = BleAddress::new("01:23:45:67:89:AB").unwrap();
        assert_eq!(addr.to_le_bytes(), [0xab, 0x89, 0x67, 0x45, 0x23, 0x01]);
    }

    #[test]
    fn test_address_byte_conversion_is_reversible() {
        let addresses = [
            "F8:4C:B0:F1:5A:43",
            "C0:DC:EF:35:51:41",
            "DC:44:E5:74:44:A3",
            "D8:79:35:52:27:C7",
            "CF:66:64:C4:7F:83",
            "C4:8B:42:80:CC:CA",
            "E3:80:90:85:2F:01",
            "CF:92:E8:4B:BA:02",
            "F5:82:EE:81:1F:07",
            "F7:62:32:06:D0:AA",
        ];
        for text in addresses {
            let addr = BleAddress::new(text).unwrap();
            assert_eq!(BleAddress::from_le_bytes(addr.to_le_bytes()), addr);
        }
    }

    #[test]
    fn test_address_serde_as_string() {
        let addr = BleAddress::new("aa:bb:cc:dd:ee:ff").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"AA:BB:CC:DD:EE:FF\"");

        let back: BleAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        assert!(serde_json::from_str::<BleAddress>("\"nope\"").is_err());
    }

    #[rstest]
    #[case("4F")]
    #[case("00")]
    #[case("a0")]
    fn test_key_fragment_valid(#[case] input: &str) {
        assert_eq!(KeyFragment::new(input).unwrap().as_str(), input);
    }

    #[rstest]
    #[case("4")]
    #[case("4F0")]
    #[case("ZZ")]
    fn test_key_fragment_invalid(#[case] input: &str) {
        assert!(KeyFragment::new(input).is_err());
    }

    #[test]
    fn test_coin_key_fragment() {
        let coin = Coin {
            address: BleAddress::new("C4:8B:42:80:CC:CA").unwrap(),
            irk: "0".repeat(32),
            ltk: "0".repeat(32),
            spacekey: format!("4F{}", "A".repeat(62)),
        };
        assert_eq!(coin.key_fragment().unwrap(), KeyFragment::new("4F").unwrap());
    }

    #[test]
    fn test_coin_debug_redacts_keys() {
        let coin = Coin {
            address: BleAddress::new("C4:8B:42:80:CC:CA").unwrap(),
            irk: "1".repeat(32),
            ltk: "2".repeat(32),
            spacekey: "3".repeat(64),
        };
        let debug = format!("{coin:?}");
        assert!(debug.contains("C4:8B:42:80:CC:CA"));
        assert!(!debug.contains("1111"));
        assert!(!debug.contains("3333"));
    }

    #[test]
    fn test_qos_level() {
        assert_eq!(QosLevel::from_u8(0).unwrap(), QosLevel::AtMostOnce);
        assert_eq!(QosLevel::from_u8(1).unwrap(), QosLevel::AtLeastOnce);
        assert_eq!(QosLevel::from_u8(2).unwrap(), QosLevel::ExactlyOnce);
        assert_eq!(QosLevel::from_u8(3), Err(Error::InvalidQos(3)));

        assert_eq!(QosLevel::ExactlyOnce.to_u8(), 2);
    }
}
