//! # SSTable - Sorted String Table
//!
//! Immutable, on-disk snapshots of a frozen [`memtable::Memtable`].
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ BLOOM SECTION (offset 0)                                      │
//! │                                                               │
//! │ raw bloom filter bit array, no framing                        │
//! ├───────────────────────────────────────────────────────────────┤
//! │ DATA SECTION (sorted by key, strictly ascending)              │
//! │                                                               │
//! │ key (8 bytes) | value (u64)                                   │
//! │ ... repeated for each entry ...                               │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER (always last 40 bytes)                                 │
//! │                                                               │
//! │ magic (u32 "STBL") | bloom_filter_offset (u64)                │
//! │ bloom_filter_size (u64) | index_offset (u64 = 0)              │
//! │ index_size (u64 = 0) | crc (u32)                              │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. No index block is written; its footer
//! fields are reserved and always zero. `crc` is CRC-32 over the 36 footer
//! bytes before it.
//!
//! The filter's hash count is not stored. It is a pure function of the entry
//! count (derived from the data section length) and [`BLOOM_FPR`].

mod format;
mod reader;
mod writer;

pub use format::{Footer, BLOOM_FPR, FOOTER_BYTES, SSTABLE_MAGIC};
pub use reader::SSTableReader;
pub use writer::SSTableWriter;
