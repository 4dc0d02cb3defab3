//! Loading the store from real files.

use fs2::FileExt;
use keykeeper_storage::{CoinDatabase, StorageError, StoreConfig};
use std::fs::{self, File};
use tempfile::TempDir;

const IRK: &str = "0123456789abcdef0123456789abcdef";
const LTK: &str = "fedcba9876543210fedcba9876543210";

fn spacekey(prefix: &str) -> String {
    format!("{prefix}{}", "0".repeat(62))
}

fn write_store(dir: &TempDir) -> StoreConfig {
    let config = StoreConfig::in_dir(dir.path());
    fs::write(&config.central_path, format!("EA:AE:EF:BE:AD:DE {IRK}\n")).unwrap();
    fs::write(
        &config.coins_path,
        format!(
            "C4:8B:42:80:CC:CA {IRK} {LTK} {}\n\
             this line is a note\n\
             F8:4C:B0:F1:5A:43 {IRK} {LTK} {}\n",
            spacekey("4F"),
            spacekey("0A"),
        ),
    )
    .unwrap();
    config
}

#[test]
fn test_load_full_store() {
    let dir = TempDir::new().unwrap();
    let config = write_store(&dir);
    fs::write(&config.names_path, "C4:8B:42:80:CC:CA alice\n").unwrap();

    let db = CoinDatabase::load(&config).unwrap();

    assert_eq!(db.identity().unwrap().address.as_str(), "EA:AE:EF:BE:AD:DE");
    let addresses: Vec<_> = db.coins().iter().map(|c| c.address.as_str()).collect();
    assert_eq!(addresses, ["C4:8B:42:80:CC:CA", "F8:4C:B0:F1:5A:43"]);
    assert_eq!(db.name_of("C4:8B:42:80:CC:CA"), Some("alice"));
    assert_eq!(db.name_of("F8:4C:B0:F1:5A:43"), None);
}

#[test]
fn test_missing_names_file_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let config = write_store(&dir);

    let db = CoinDatabase::load(&config).unwrap();
    assert_eq!(db.coins().len(), 2);
    assert_eq!(db.name_of("C4:8B:42:80:CC:CA"), None);
}

#[test]
fn test_missing_roster_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = write_store(&dir);
    fs::remove_file(&config.coins_path).unwrap();

    let err = CoinDatabase::load(&config).unwrap_err();
    assert!(matches!(err, StorageError::Io { .. }));
}

#[test]
fn test_missing_identity_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = write_store(&dir);
    fs::remove_file(&config.central_path).unwrap();

    assert!(matches!(
        CoinDatabase::load(&config),
        Err(StorageError::Io { .. })
    ));
}

#[test]
fn test_empty_identity_file_loads_without_identity() {
    let dir = TempDir::new().unwrap();
    let config = write_store(&dir);
    fs::write(&config.central_path, "").unwrap();

    let db = CoinDatabase::load(&config).unwrap();
    assert!(db.identity().is_none());
    assert!(matches!(
        db.require_identity(),
        Err(StorageError::MissingIdentity { .. })
    ));
}

#[test]
fn test_locked_roster() {
    let dir = TempDir::new().unwrap();
    let config = write_store(&dir);

    let holder = File::open(&config.coins_path).unwrap();
    FileExt::lock_exclusive(&holder).unwrap();

    let err = CoinDatabase::load(&config).unwrap_err();
    assert!(matches!(err, StorageError::Locked { .. }));

    FileExt::unlock(&holder).unwrap();
    assert!(CoinDatabase::load(&config).is_ok());
}

#[test]
fn test_lock_is_released_after_load() {
    let dir = TempDir::new().unwrap();
    let config = write_store(&dir);

    CoinDatabase::load(&config).unwrap();

    let other = File::open(&config.coins_path).unwrap();
    assert!(FileExt::try_lock_exclusive(&other).is_ok());
}

#[test]
fn test_custom_paths() {
    let dir = TempDir::new().unwrap();
    let defaults = write_store(&dir);
    let roster = dir.path().join("roster.txt");
    fs::rename(&defaults.coins_path, &roster).unwrap();

    let config = StoreConfig::default()
        .coins_path(&roster)
        .central_path(&defaults.central_path)
        .names_path(dir.path().join("absent.txt"));
    assert_eq!(CoinDatabase::load(&config).unwrap().coins().len(), 2);
}
