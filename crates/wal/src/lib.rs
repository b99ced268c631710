//! # WAL - Write-Ahead Log
//!
//! Append-only durability log for the citybits storage engine.
//!
//! Every mutation (a put, or a delete written as a tombstone put) is encoded as
//! a fixed-size record and appended to the WAL **before** the memtable is
//! updated.
//!
//! ## Binary Record Format
//!
//! ```text
//! [magic: u32 LE = 0xDEADBEEF][version: u16 LE = 1][reserved: u16 LE = 0]
//! [checksum: u64 LE][key: 8 bytes][value: 8 bytes]
//! ```
//!
//! Records are 32 bytes, back to back, with no other framing. The checksum is
//! XXH3-64 over the key bytes followed by the value bytes; the header itself
//! is never covered.
//!
//! ## Batching
//!
//! [`WalWriter`] encodes records into an in-memory batch. When the batch
//! reaches the configured threshold it is written out and `fsync`ed before
//! `append` returns, so a crash loses at most one incomplete batch.
//! [`WalWriter::sync`] forces the same thing early.
//!
//! ## Example
//!
//! ```rust,no_run
//! use codec::{Key, Value};
//! use wal::{WalReader, WalWriter};
//!
//! let mut w = WalWriter::open("citybits.wal", 4096).unwrap();
//! w.append(&Key::new(1, 100, 12, 34), Value(9999)).unwrap();
//! w.sync().unwrap();
//! drop(w);
//!
//! let mut r = WalReader::open("citybits.wal").unwrap();
//! r.replay(|rec| println!("{:?}", rec)).unwrap();
//! ```

mod reader;
mod record;
mod writer;

use std::io;
use thiserror::Error;

pub use reader::WalReader;
pub use record::{WalHeader, WalRecord, HEADER_BYTES, RECORD_BYTES, WAL_MAGIC, WAL_VERSION};
pub use writer::WalWriter;

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The record does not start with [`WAL_MAGIC`].
    #[error("bad record magic: {0:#010x}")]
    BadMagic(u32),

    /// The record was written by an unknown format version.
    #[error("unsupported record version: {0}")]
    UnsupportedVersion(u16),

    /// The key/value bytes do not match the stored checksum.
    #[error("checksum mismatch (stored {stored:#018x}, computed {computed:#018x})")]
    ChecksumMismatch { stored: u64, computed: u64 },

    /// A record failed validation and valid-looking data follows it, so this
    /// is not a torn final write.
    #[error("corrupt record at offset {offset}: {source}")]
    CorruptInterior {
        offset: u64,
        #[source]
        source: Box<WalError>,
    },
}

#[cfg(test)]
mod tests;
