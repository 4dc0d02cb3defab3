//! Reader for the flat-file authorization store.
//!
//! The store is three whitespace-separated text files:
//!
//! ```text
//! central.txt   <central_addr> <central_irk>              first line only
//! coins.txt     <addr> <irk> <ltk> <spacekey>             one coin per line
//! names.txt     <addr> <display name>                     optional
//! ```
//!
//! Columns are fixed width (17, 32, 32, 64). Lines that do not fit are
//! skipped without comment, which lets operators keep notes in the files.
//! The roster is read under an exclusive non-blocking `flock` so a
//! provisioning tool appending coins at the same moment is detected instead
//! of producing a half-read roster.

use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use keykeeper_core::constants::{
    ADDRESS_LENGTH, DEFAULT_CENTRAL_FILE, DEFAULT_COINS_FILE, DEFAULT_NAMES_FILE, IRK_HEX_LENGTH,
    LTK_HEX_LENGTH, SPACEKEY_HEX_LENGTH,
};
use keykeeper_core::{BleAddress, CentralIdentity, Coin};
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static COIN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(.{{{ADDRESS_LENGTH}}})\s+(.{{{IRK_HEX_LENGTH}}})\s+(.{{{LTK_HEX_LENGTH}}})\s+(.{{{SPACEKEY_HEX_LENGTH}}})"
    ))
    .expect("valid regex")
});

static CENTRAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(.{{{ADDRESS_LENGTH}}})\s+(.{{{IRK_HEX_LENGTH}}})")).expect("valid regex")
});

static NAME_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(.{{{ADDRESS_LENGTH}}})\s+(.+)")).expect("valid regex")
});

/// Locations of the store files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Coin roster, locked while read
    pub coins_path: PathBuf,

    /// Central identity
    pub central_path: PathBuf,

    /// Optional display names
    pub names_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            coins_path: PathBuf::from(DEFAULT_COINS_FILE),
            central_path: PathBuf::from(DEFAULT_CENTRAL_FILE),
            names_path: PathBuf::from(DEFAULT_NAMES_FILE),
        }
    }
}

impl StoreConfig {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            coins_path: dir.join(DEFAULT_COINS_FILE),
            central_path: dir.join(DEFAULT_CENTRAL_FILE),
            names_path: dir.join(DEFAULT_NAMES_FILE),
        }
    }

    /// Set the roster path
    pub fn coins_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.coins_path = path.into();
        self
    }

    /// Set the identity path
    pub fn central_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.central_path = path.into();
        self
    }

    /// Set the names path
    pub fn names_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.names_path = path.into();
        self
    }
}

/// Local truth about the site, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct CoinDatabase {
    identity: Option<CentralIdentity>,
    coins: Vec<Coin>,
    names: HashMap<BleAddress, String>,
    central_path: PathBuf,
}

impl CoinDatabase {
    /// Read all store files.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Io`] if the roster or identity file cannot be read
    /// - [`StorageError::Locked`] if another process holds the roster lock
    ///
    /// A missing names file only produces a warning.
    pub fn load(config: &StoreConfig) -> StorageResult<Self> {
        let identity = read_identity(&config.central_path)?;
        match &identity {
            Some(identity) => info!(address = %identity.address, "Loaded central identity"),
            None => warn!(path = %config.central_path.display(), "No central identity found"),
        }

        let coins = read_roster(&config.coins_path)?;
        info!(count = coins.len(), "Loaded coins");

        let names = match std::fs::read_to_string(&config.names_path) {
            Ok(contents) => parse_names(&contents),
            Err(e) => {
                warn!(path = %config.names_path.display(), error = %e, "Could not load names file");
                HashMap::new()
            }
        };
        debug!(count = names.len(), "Loaded coin names");

        Ok(Self {
            identity,
            coins,
            names,
            central_path: config.central_path.clone(),
        })
    }

    /// Build a database from already parsed parts.
    pub fn from_parts(identity: Option<CentralIdentity>, coins: Vec<Coin>) -> Self {
        Self {
            identity,
            coins,
            ..Default::default()
        }
    }

    /// Attach a display name to an address.
    pub fn with_name(mut self, address: BleAddress, name: impl Into<String>) -> Self {
        self.names.insert(address, name.into());
        self
    }

    pub fn identity(&self) -> Option<&CentralIdentity> {
        self.identity.as_ref()
    }

    /// The central identity, for callers that cannot run without one.
    pub fn require_identity(&self) -> StorageResult<&CentralIdentity> {
        self.identity
            .as_ref()
            .ok_or_else(|| StorageError::MissingIdentity {
                path: self.central_path.display().to_string(),
            })
    }

    /// Coins in file order.
    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    /// Display name for an address, if the names file has one.
    pub fn name_of(&self, address: &str) -> Option<&str> {
        let address = BleAddress::new(address).ok()?;
        self.names.get(&address).map(String::as_str)
    }

    /// Name if known, otherwise the address itself.
    pub fn display_name<'a>(&'a self, address: &'a str) -> &'a str {
        self.name_of(address).unwrap_or(address)
    }
}

fn read_identity(path: &Path) -> StorageResult<Option<CentralIdentity>> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| StorageError::io(path.display().to_string(), e))?;
    Ok(contents.lines().next().and_then(parse_identity_line))
}

fn read_roster(path: &Path) -> StorageResult<Vec<Coin>> {
    let path_str = path.display().to_string();
    let mut file = File::open(path).map_err(|e| StorageError::io(&path_str, e))?;

    if let Err(e) = FileExt::try_lock_exclusive(&file) {
        if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
            return Err(StorageError::Locked { path: path_str });
        }
        return Err(StorageError::io(path_str, e));
    }

    let mut contents = String::new();
    let read = file.read_to_string(&mut contents);
    // Lock is held for the read only.
    if let Err(e) = FileExt::unlock(&file) {
        warn!(path = %path_str, error = %e, "Failed to unlock roster");
    }
    read.map_err(|e| StorageError::io(&path_str, e))?;

    Ok(contents.lines().filter_map(parse_coin_line).collect())
}

fn parse_identity_line(line: &str) -> Option<CentralIdentity> {
    let captures = CENTRAL_LINE.captures(line)?;
    Some(CentralIdentity {
        address: BleAddress::new(captures.get(1)?.as_str()).ok()?,
        irk: captures.get(2)?.as_str().to_string(),
    })
}

fn parse_coin_line(line: &str) -> Option<Coin> {
    let captures = COIN_LINE.captures(line)?;
    Some(Coin {
        address: BleAddress::new(captures.get(1)?.as_str()).ok()?,
        irk: captures.get(2)?.as_str().to_string(),
        ltk: captures.get(3)?.as_str().to_string(),
        spacekey: captures.get(4)?.as_str().to_string(),
    })
}

fn parse_names(contents: &str) -> HashMap<BleAddress, String> {
    contents
        .lines()
        .filter_map(|line| {
            let captures = NAME_LINE.captures(line)?;
            let address = BleAddress::new(captures.get(1)?.as_str()).ok()?;
            Some((address, captures.get(2)?.as_str().trim_end().to_string()))
        })
        .collect()
}
