use codec::{Key, Value};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::{WalError, WalRecord, RECORD_BYTES};

/// Cap on the batch buffer allocated up front.
const MAX_PREALLOC: usize = 1024 * 1024;

/// Append-only, batched WAL writer.
///
/// Owns the log file handle and the pending batch exclusively. Records are
/// written to the file in exactly the order `append` was called.
pub struct WalWriter {
    file: File,
    path: PathBuf,
    /// Encoded records not yet handed to the OS.
    buf: Vec<u8>,
    batch_threshold: usize,
    /// Bytes were written since the last successful `sync_all`.
    unsynced: bool,
    records_appended: u64,
}

impl WalWriter {
    /// Opens (or creates) a WAL file in append mode.
    ///
    /// # Arguments
    ///
    /// * `path` - file system path for the WAL (created if it does not exist).
    /// * `batch_threshold` - once this many bytes are pending, `append`
    ///   writes and fsyncs the batch. `0` syncs on every append.
    pub fn open<P: AsRef<Path>>(path: P, batch_threshold: usize) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            file,
            path,
            buf: Vec::with_capacity(batch_threshold.clamp(RECORD_BYTES, MAX_PREALLOC)),
            batch_threshold,
            unsynced: false,
            records_appended: 0,
        })
    }

    /// Encodes one record into the pending batch.
    ///
    /// Not durable by itself unless the batch crosses the threshold, in which
    /// case the whole batch is written and fsynced before returning and any
    /// failure from that is returned here.
    ///
    /// On failure the new record is withdrawn from the batch if none of its
    /// bytes reached the file, so a rejected append is never logged later.
    /// Records accepted by earlier appends stay pending.
    pub fn append(&mut self, key: &Key, value: Value) -> Result<(), WalError> {
        WalRecord::new(*key, value).encode_into(&mut self.buf);

        if self.buf.len() >= self.batch_threshold {
            let bytes = self.buf.len();
            if let Err(e) = self.flush(true) {
                // The record is the last RECORD_BYTES of the batch; it is
                // untouched as long as at least that much is still pending.
                if self.buf.len() >= RECORD_BYTES {
                    self.buf.truncate(self.buf.len() - RECORD_BYTES);
                } else {
                    self.records_appended += 1;
                }
                return Err(e);
            }
            tracing::debug!(bytes, path = %self.path.display(), "wal batch synced");
        }
        self.records_appended += 1;
        Ok(())
    }

    /// Writes all pending bytes to the file. With `durable`, also forces them
    /// to stable storage with `sync_all`.
    ///
    /// If the write fails part way, the bytes that did reach the file are
    /// dropped from the batch so a later flush resumes after them.
    pub fn flush(&mut self, durable: bool) -> Result<(), WalError> {
        self.write_pending()?;
        if durable && self.unsynced {
            sync_retrying(&self.file)?;
            self.unsynced = false;
        }
        Ok(())
    }

    /// Durable flush. Call before acknowledging anything that must survive a
    /// crash.
    pub fn sync(&mut self) -> Result<(), WalError> {
        self.flush(true)
    }

    /// Bytes encoded but not yet written to the file.
    #[must_use]
    pub fn buffered_bytes(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn records_appended(&self) -> u64 {
        self.records_appended
    }

    #[must_use]
    pub fn batch_threshold(&self) -> usize {
        self.batch_threshold
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_pending(&mut self) -> io::Result<()> {
        let mut written = 0;
        let result = loop {
            if written == self.buf.len() {
                break Ok(());
            }
            match self.file.write(&self.buf[written..]) {
                Ok(0) => {
                    break Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write WAL batch",
                    ))
                }
                Ok(n) => {
                    written += n;
                    self.unsynced = true;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => break Err(e),
            }
        };
        self.buf.drain(..written);
        result
    }
}

fn sync_retrying(file: &File) -> io::Result<()> {
    loop {
        match file.sync_all() {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Best-effort durable flush on drop.
///
/// Errors cannot propagate out of `Drop`; they are logged so the failure is
/// still visible. Use [`WalWriter::sync`] before dropping to observe it.
impl Drop for WalWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() && !self.unsynced {
            return;
        }
        if let Err(e) = self.flush(true) {
            tracing::warn!(
                path = %self.path.display(),
                pending = self.buf.len(),
                error = %e,
                "wal flush on shutdown failed"
            );
        }
    }
}

impl std::fmt::Debug for WalWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalWriter")
            .field("path", &self.path)
            .field("buffered_bytes", &self.buf.len())
            .field("batch_threshold", &self.batch_threshold)
            .field("records_appended", &self.records_appended)
            .finish()
    }
}
