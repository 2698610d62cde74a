//! Versioned persistence for [`DoorConfig`].
//!
//! The stored form is two version bytes (`major`, `minor`) followed by the
//! config encoded with `postcard`. A record written by a different layout
//! version is never reinterpreted; loading replaces it with the defaults.
//!
//! ```rust
//! use rs_garage::config::DoorConfig;
//! use rs_garage::storage::{load_or_default, save_if_changed, MockStore};
//!
//! let mut store = MockStore::new();
//! let config = DoorConfig::default().with_read_time_ms(500);
//!
//! assert!(save_if_changed(&mut store, &config).unwrap());
//! assert!(!save_if_changed(&mut store, &config).unwrap());
//! assert_eq!(load_or_default(&mut store), config);
//! ```

extern crate alloc;
use alloc::vec::Vec;
use core::fmt;

use log::{info, warn};

use crate::config::{DoorConfig, CONFIG_VERSION};

const HEADER_LEN: usize = 2;

/// Errors from encoding, decoding or the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The config could not be serialized.
    Encode,
    /// The record is truncated or corrupt.
    Decode,
    /// The record was written by another layout version.
    VersionMismatch {
        /// Major version found in the record.
        major: u8,
        /// Minor version found in the record.
        minor: u8,
    },
    /// The backing store failed.
    Io,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => write!(f, "config encode failed"),
            Self::Decode => write!(f, "stored config is corrupt"),
            Self::VersionMismatch { major, minor } => {
                write!(f, "stored config version {major}.{minor} not supported")
            }
            Self::Io => write!(f, "config store I/O failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StorageError {}

/// Raw byte storage for one config record (NVS blob, file, ...).
pub trait ConfigStore {
    /// Error type for store operations.
    type Error: fmt::Debug;

    /// Read the stored record, `None` if nothing has been saved.
    fn load(&mut self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Replace the stored record.
    fn save(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Serialize a config with its version header.
pub fn encode(config: &DoorConfig) -> Result<Vec<u8>, StorageError> {
    let body = postcard::to_allocvec(config).map_err(|_| StorageError::Encode)?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.push(CONFIG_VERSION.0);
    bytes.push(CONFIG_VERSION.1);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Deserialize a config, checking the version header.
///
/// Decoded fields that are out of range are replaced by their defaults.
pub fn decode(bytes: &[u8]) -> Result<DoorConfig, StorageError> {
    if bytes.len() < HEADER_LEN {
        return Err(StorageError::Decode);
    }
    let (header, body) = bytes.split_at(HEADER_LEN);
    if (header[0], header[1]) != CONFIG_VERSION {
        return Err(StorageError::VersionMismatch {
            major: header[0],
            minor: header[1],
        });
    }
    let stored: DoorConfig = postcard::from_bytes(body).map_err(|_| StorageError::Decode)?;
    Ok(sanitize(stored))
}

fn sanitize(stored: DoorConfig) -> DoorConfig {
    DoorConfig::default()
        .with_read_time_ms(stored.read_time_ms)
        .with_motion_time_ms(stored.motion_time_ms)
        .with_relay_time_ms(stored.relay_time_ms)
        .with_relay_pause_ms(stored.relay_pause_ms)
        .with_sensor(stored.sensor_reads, stored.sensor_threshold)
        .with_alert_open_timeout_secs(stored.alert_open_timeout_secs)
        .with_night_window(stored.alert_night_start, stored.alert_night_end)
        .with_time_zone(stored.time_zone)
}

/// Load the stored config, falling back to defaults on any problem.
///
/// A record that cannot be decoded (other layout version or corrupt) is
/// replaced by the defaults. A failed read leaves the store alone.
pub fn load_or_default<S: ConfigStore>(store: &mut S) -> DoorConfig {
    let bytes = match store.load() {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            info!("no stored config, using defaults");
            return DoorConfig::default();
        }
        Err(e) => {
            warn!("config store read failed ({:?}), using defaults", e);
            return DoorConfig::default();
        }
    };

    match decode(&bytes) {
        Ok(config) => {
            info!("loaded config: {}", config);
            config
        }
        Err(e) => {
            warn!("{}, resetting to defaults", e);
            let defaults = DoorConfig::default();
            if let Err(e) = save_if_changed(store, &defaults) {
                warn!("failed to store defaults: {}", e);
            }
            defaults
        }
    }
}

/// Write the config unless the store already holds the same bytes.
///
/// Returns whether a write happened.
pub fn save_if_changed<S: ConfigStore>(
    store: &mut S,
    config: &DoorConfig,
) -> Result<bool, StorageError> {
    let bytes = encode(config)?;
    // An unreadable record is simply overwritten.
    if let Ok(Some(existing)) = store.load() {
        if existing == bytes {
            return Ok(false);
        }
    }
    store.save(&bytes).map_err(|e| {
        warn!("config store write failed: {:?}", e);
        StorageError::Io
    })?;
    info!("config saved ({} bytes)", bytes.len());
    Ok(true)
}

/// In-memory store for tests and the desktop demo.
#[derive(Debug, Default)]
pub struct MockStore {
    /// Current record.
    pub bytes: Option<Vec<u8>>,
    /// Number of successful saves.
    pub writes: usize,
    /// When set, every operation fails.
    pub fail: bool,
}

impl MockStore {
    /// Empty, working store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with raw bytes.
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            ..Self::default()
        }
    }
}

impl ConfigStore for MockStore {
    type Error = ();

    fn load(&mut self) -> Result<Option<Vec<u8>>, ()> {
        if self.fail {
            return Err(());
        }
        Ok(self.bytes.clone())
    }

    fn save(&mut self, bytes: &[u8]) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.bytes = Some(bytes.to_vec());
        self.writes += 1;
        Ok(())
    }
}
