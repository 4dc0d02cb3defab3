//! Cross-check of the central's enumeration against the local roster.
//!
//! The central is trusted only as far as it agrees with the roster: every
//! bond must belong to a coin we provisioned and carry the spacekey we gave
//! it. Any drift is treated as tampering and stops the controller.
//!
//! Correspondence is positional. Row `i` of `stats bonds`, row `i` of
//! `stats spacekey` and line `i` of `coins.txt` must all describe the same
//! coin. The firmware prints both tables from the same settings walk so the
//! orders agree today, but a reordered table is rejected rather than
//! matched up by address.

use crate::error::MismatchError;
use keykeeper_core::{BleAddress, Bond, CentralIdentity, Coin, SpaceKey};
use tracing::{debug, error};

/// Check the bond and spacekey dumps against the roster.
///
/// # Errors
///
/// The first [`MismatchError`] found: counts first, then row by row.
///
/// # Examples
///
/// ```
/// use keykeeper_storage::validate_enumeration;
///
/// assert!(validate_enumeration(&[], &[], &[]).is_ok());
/// ```
pub fn validate_enumeration(
    bonds: &[Bond],
    spacekeys: &[SpaceKey],
    coins: &[Coin],
) -> Result<(), MismatchError> {
    if bonds.len() != coins.len() || spacekeys.len() != coins.len() {
        let mismatch = MismatchError::Count {
            bonds: bonds.len(),
            spacekeys: spacekeys.len(),
            coins: coins.len(),
        };
        error!(%mismatch, "Enumeration does not match roster");
        return Err(mismatch);
    }

    for (index, ((bond, spacekey), coin)) in bonds.iter().zip(spacekeys).zip(coins).enumerate() {
        if bond.address != coin.address || spacekey.address != coin.address {
            let mismatch = MismatchError::Address {
                index,
                coin: coin.address.to_string(),
                bond: bond.address.to_string(),
                spacekey: spacekey.address.to_string(),
            };
            error!(%mismatch, "Enumeration does not match roster");
            return Err(mismatch);
        }

        let matches = coin
            .key_fragment()
            .is_ok_and(|fragment| fragment == spacekey.fragment);
        if !matches {
            let mismatch = MismatchError::Fragment {
                index,
                address: coin.address.to_string(),
            };
            error!(%mismatch, "Enumeration does not match roster");
            return Err(mismatch);
        }

        debug!(index, address = %coin.address, "Coin verified");
    }

    Ok(())
}

/// Check the identity the central announces against the expected one.
///
/// `reported` is the raw address captured from the log line; it is compared
/// case-insensitively.
pub fn validate_identity(expected: &CentralIdentity, reported: &str) -> Result<(), MismatchError> {
    let matches = BleAddress::new(reported).is_ok_and(|address| address == expected.address);
    if matches {
        return Ok(());
    }

    let mismatch = MismatchError::Identity {
        expected: expected.address.to_string(),
        reported: reported.to_string(),
    };
    error!(%mismatch, "Central identity does not match");
    Err(mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keykeeper_core::KeyFragment;
    use rstest::rstest;

    const A: &str = "C4:8B:42:80:CC:CA";
    const B: &str = "F8:4C:B0:F1:5A:43";

    fn addr(s: &str) -> BleAddress {
        BleAddress::new(s).unwrap()
    }

    fn coin(address: &str, fragment: &str) -> Coin {
        Coin {
            address: addr(address),
            irk: "0".repeat(32),
            ltk: "0".repeat(32),
            spacekey: format!("{fragment}{}", "0".repeat(62)),
        }
    }

    fn bond(address: &str) -> Bond {
        Bond {
            address: addr(address),
        }
    }

    fn spacekey(address: &str, fragment: &str) -> SpaceKey {
        SpaceKey {
            address: addr(address),
            fragment: KeyFragment::new(fragment).unwrap(),
        }
    }

    #[test]
    fn test_matching_enumeration() {
        let coins = [coin(A, "4F"), coin(B, "0A")];
        let bonds = [bond(A), bond(B)];
        let keys = [spacekey(A, "4F"), spacekey(B, "0A")];
        assert!(validate_enumeration(&bonds, &keys, &coins).is_ok());
    }

    #[rstest]
    #[case(1, 2, 2)]
    #[case(2, 1, 2)]
    #[case(2, 2, 1)]
    fn test_count_mismatch(#[case] n_bonds: usize, #[case] n_keys: usize, #[case] n_coins: usize) {
        let coins: Vec<_> = [coin(A, "4F"), coin(B, "0A")].into_iter().take(n_coins).collect();
        let bonds: Vec<_> = [bond(A), bond(B)].into_iter().take(n_bonds).collect();
        let keys: Vec<_> = [spacekey(A, "4F"), spacekey(B, "0A")]
            .into_iter()
            .take(n_keys)
            .collect();

        assert_eq!(
            validate_enumeration(&bonds, &keys, &coins),
            Err(MismatchError::Count {
                bonds: n_bonds,
                spacekeys: n_keys,
                coins: n_coins,
            })
        );
    }

    #[test]
    fn test_unknown_bond() {
        let coins = [coin(A, "4F")];
        let bonds = [bond(B)];
        let keys = [spacekey(A, "4F")];
        let err = validate_enumeration(&bonds, &keys, &coins).unwrap_err();
        assert!(matches!(err, MismatchError::Address { index: 0, .. }));
    }

    #[test]
    fn test_fragment_mismatch() {
        let coins = [coin(A, "4F"), coin(B, "0A")];
        let bonds = [bond(A), bond(B)];
        let keys = [spacekey(A, "4F"), spacekey(B, "0B")];
        assert_eq!(
            validate_enumeration(&bonds, &keys, &coins),
            Err(MismatchError::Fragment {
                index: 1,
                address: B.to_string(),
            })
        );
    }

    #[test]
    fn test_fragment_compare_is_case_sensitive() {
        // The central prints uppercase; a lowercase roster key never matches.
        let coins = [coin(A, "4f")];
        let err = validate_enumeration(&[bond(A)], &[spacekey(A, "4F")], &coins).unwrap_err();
        assert!(matches!(err, MismatchError::Fragment { .. }));
    }

    #[test]
    fn test_reordered_spacekey_dump_is_rejected() {
        // Same records, different order: correspondence is by position, not
        // by address, so this is a mismatch even though every coin is present.
        let coins = [coin(A, "4F"), coin(B, "0A")];
        let bonds = [bond(A), bond(B)];
        let keys = [spacekey(B, "0A"), spacekey(A, "4F")];
        let err = validate_enumeration(&bonds, &keys, &coins).unwrap_err();
        assert!(matches!(err, MismatchError::Address { index: 0, .. }));
    }

    #[rstest]
    #[case("EA:AE:EF:BE:AD:DE", true)]
    #[case("ea:ae:ef:be:ad:de", true)]
    #[case("EA:AE:EF:BE:AD:DF", false)]
    #[case("garbage", false)]
    fn test_identity(#[case] reported: &str, #[case] ok: bool) {
        let expected = CentralIdentity {
            address: addr("EA:AE:EF:BE:AD:DE"),
            irk: "0".repeat(32),
        };
        assert_eq!(validate_identity(&expected, reported).is_ok(), ok);
    }
}
