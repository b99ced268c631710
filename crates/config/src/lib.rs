//! # Config - engine settings
//!
//! Defaults plus environment overrides:
//!
//! ```text
//! CITYBITS_WAL_PATH         WAL file path                     (default: "citybits.wal")
//! CITYBITS_SST_DIR          SSTable directory                 (default: "data/sst")
//! CITYBITS_WAL_BATCH_BYTES  WAL batch size before fsync       (default: 4096, 0 = every write)
//! ```
//!
//! Unparsable numbers fall back to the default instead of failing startup.

use std::path::PathBuf;

pub const ENV_WAL_PATH: &str = "CITYBITS_WAL_PATH";
pub const ENV_SST_DIR: &str = "CITYBITS_SST_DIR";
pub const ENV_WAL_BATCH_BYTES: &str = "CITYBITS_WAL_BATCH_BYTES";

pub const DEFAULT_WAL_PATH: &str = "citybits.wal";
pub const DEFAULT_SST_DIR: &str = "data/sst";
/// 128 WAL records.
pub const DEFAULT_WAL_BATCH_BYTES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub wal_path: PathBuf,
    pub sst_dir: PathBuf,
    /// Pending WAL bytes that trigger a write + fsync.
    pub wal_batch_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wal_path: PathBuf::from(DEFAULT_WAL_PATH),
            sst_dir: PathBuf::from(DEFAULT_SST_DIR),
            wal_batch_bytes: DEFAULT_WAL_BATCH_BYTES,
        }
    }
}

impl Config {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            wal_path: lookup(ENV_WAL_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.wal_path),
            sst_dir: lookup(ENV_SST_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.sst_dir),
            wal_batch_bytes: lookup(ENV_WAL_BATCH_BYTES)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.wal_batch_bytes),
        }
    }

    pub fn with_wal_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.wal_path = path.into();
        self
    }

    pub fn with_sst_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.sst_dir = dir.into();
        self
    }

    pub fn with_wal_batch_bytes(mut self, bytes: usize) -> Self {
        self.wal_batch_bytes = bytes;
        self
    }
}
