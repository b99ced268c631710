//! # Codec - fixed-width keys, values and checksums
//!
//! Every on-disk structure in citybits is built from the two fixed-width types
//! defined here:
//!
//! ```text
//! Key   = [zone_id: u16 LE][object_type: u16 LE][x: u16 LE][y: u16 LE]   (8 bytes)
//! Value = [data: u64 LE]                                                 (8 bytes)
//! ```
//!
//! Encoding is explicit and field-by-field so the byte layout never depends on
//! in-memory struct layout or host endianness.
//!
//! The [`checksum`] module wraps XXH3-64, used for WAL record integrity and for
//! deriving the Bloom filter's hash functions.

pub mod checksum;
mod key;
mod value;

pub use checksum::{checksum, checksum_with_seed, record_checksum, Checksum};
pub use key::{Key, KEY_BYTES};
pub use value::{Value, VALUE_BYTES};

/// Size of one serialized `(key, value)` pair.
pub const ENTRY_BYTES: usize = KEY_BYTES + VALUE_BYTES;
