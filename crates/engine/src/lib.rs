//! # Engine - citybits write path
//!
//! Ties the [`wal`], [`memtable`] and [`sstable`] crates into the write path
//! of an LSM key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client (CLI)
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   ENGINE                      │
//! │                                               │
//! │ put / delete → WAL append → Memtable insert   │
//! │                    |                          │
//! │                    | (batch full? fsync)      │
//! │                                               │
//! │ flush_to_sstable(path)                        │
//! │     → bloom + sorted data + footer            │
//! │     → tmp file, fsync, rename                 │
//! │     → Memtable cleared                        │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Deciding *when* to flush is left to the caller. There is no read path
//! beyond the memtable and no WAL replay on open.
mod write;

use anyhow::{Context, Result};
use codec::{Key, Value};
use config::Config;
use memtable::Memtable;
use std::path::{Path, PathBuf};
use wal::WalWriter;

/// The storage engine's single-writer front door.
///
/// # Write Path
///
/// 1. Append the record to the WAL batch (fsynced once the batch is full).
/// 2. Apply the mutation to the in-memory Memtable.
///
/// WAL order and Memtable application order are the same because both happen
/// in the same `&mut self` call.
pub struct Engine {
    pub(crate) mem: Memtable,
    pub(crate) wal_writer: WalWriter,
    pub(crate) sst_dir: PathBuf,
    /// SSTables written by this engine instance.
    pub(crate) sstables_written: u64,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("wal_path", &self.wal_writer.path())
            .field("wal_batch_bytes", &self.wal_writer.batch_threshold())
            .field("wal_buffered_bytes", &self.wal_writer.buffered_bytes())
            .field("wal_records", &self.wal_writer.records_appended())
            .field("sst_dir", &self.sst_dir)
            .field("memtable_entries", &self.mem.len())
            .field("memtable_size", &self.mem.approx_size())
            .field("sstables_written", &self.sstables_written)
            .finish()
    }
}

impl Engine {
    /// Opens the engine.
    ///
    /// Creates the SST directory if needed and opens the WAL for appending.
    /// If the WAL cannot be opened no engine is returned, so writes are never
    /// accepted without a log.
    pub fn open(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.sst_dir).with_context(|| {
            format!("failed to create SST directory {}", config.sst_dir.display())
        })?;

        let wal_writer = WalWriter::open(&config.wal_path, config.wal_batch_bytes)
            .with_context(|| format!("failed to open WAL {}", config.wal_path.display()))?;

        tracing::info!(
            wal = %config.wal_path.display(),
            sst_dir = %config.sst_dir.display(),
            wal_batch_bytes = config.wal_batch_bytes,
            "engine opened"
        );

        Ok(Self {
            mem: Memtable::new(),
            wal_writer,
            sst_dir: config.sst_dir.clone(),
            sstables_written: 0,
        })
    }

    /// Current memtable value for `key`, tombstones included.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<Value> {
        self.mem.get(key)
    }

    #[must_use]
    pub fn memtable(&self) -> &Memtable {
        &self.mem
    }

    #[must_use]
    pub fn wal(&self) -> &WalWriter {
        &self.wal_writer
    }

    #[must_use]
    pub fn sst_dir(&self) -> &Path {
        &self.sst_dir
    }

    #[must_use]
    pub fn sstables_written(&self) -> u64 {
        self.sstables_written
    }

    /// Clean shutdown: durably flushes the WAL and reports any failure.
    ///
    /// Dropping the engine without calling this still attempts the flush, but
    /// can only log an error.
    pub fn close(mut self) -> Result<()> {
        self.wal_writer
            .sync()
            .context("failed to sync WAL on close")?;
        tracing::info!("engine closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests;
