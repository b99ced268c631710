/// Write path: `put()`, `delete()`, `sync()` and the SSTable flushes.
///
/// Every mutation is appended to the WAL first, then applied to the
/// Memtable. Flushing serializes the Memtable into one SSTable and clears it
/// only once the file is safely in place.
use anyhow::{Context, Result};
use codec::{Key, Value};
use sstable::{Footer, SSTableWriter};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::Engine;

impl Engine {
    /// Inserts or overwrites `key`.
    ///
    /// `Value(0)` is rejected: zero is the tombstone on disk, so only
    /// [`delete`](Engine::delete) may write it.
    pub fn put(&mut self, key: Key, value: Value) -> Result<()> {
        anyhow::ensure!(
            !value.is_tombstone(),
            "value 0 is reserved for deletes (key {})",
            key
        );
        self.apply(key, value)
    }

    /// Deletes `key` by writing a tombstone.
    pub fn delete(&mut self, key: Key) -> Result<()> {
        self.apply(key, Value::TOMBSTONE)
    }

    /// Forces every appended record to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.wal_writer.sync().context("wal sync failed")
    }

    /// Writes the whole Memtable to an SSTable at `path`, then clears it.
    ///
    /// On failure nothing is written at `path` and the Memtable is left
    /// untouched, so the flush can simply be retried.
    pub fn flush_to_sstable<P: AsRef<Path>>(&mut self, path: P) -> Result<Footer> {
        let path = path.as_ref();
        let entries = self.mem.len();

        let footer = SSTableWriter::write_from_memtable(path, &self.mem)
            .with_context(|| format!("failed to flush memtable to {}", path.display()))?;

        self.mem.clear();
        self.sstables_written += 1;

        tracing::info!(path = %path.display(), entries, "memtable flushed");
        Ok(footer)
    }

    /// Flushes to a fresh file in the SST directory and returns its path.
    ///
    /// Files are named `sst-{timestamp_ms}-{n}.sst`, so they sort by creation
    /// order.
    pub fn flush(&mut self) -> Result<PathBuf> {
        let ts = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
        let name = format!("sst-{:013}-{:06}.sst", ts, self.sstables_written);
        let path = self.sst_dir.join(name);
        self.flush_to_sstable(&path)?;
        Ok(path)
    }

    fn apply(&mut self, key: Key, value: Value) -> Result<()> {
        self.wal_writer
            .append(&key, value)
            .with_context(|| format!("wal append failed for {}", key))?;
        self.mem.put(key, value);
        Ok(())
    }
}
