//! # Bloom Filter
//!
//! A space-efficient probabilistic data structure for set membership testing.
//!
//! A bloom filter can tell you with certainty that a key is **not** in the set
//! (no false negatives), but may occasionally report that a key **is** in the
//! set when it isn't (false positives).
//!
//! ## Usage in citybits
//!
//! Every SSTable starts with a bloom filter built over all of its keys. The
//! filter is sized once from the exact memtable entry count, populated, and
//! written as raw bytes. It is never resized or merged afterwards.
//!
//! ## Sizing
//!
//! ```text
//! m = ceil(-1.44 * n * log2(p))        bits
//! k = round((m / n) * ln 2)            hashes, clamped to [1, 30]
//! ```
//!
//! The bit array is rounded up to whole bytes and every rounded bit is usable,
//! so the filter can be rebuilt from its serialized bytes plus `k`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bloom::BloomFilter;
//! use codec::Key;
//!
//! let mut bf = BloomFilter::new(1000, 0.01);
//! bf.add(&Key::new(1, 100, 12, 34));
//! assert!(bf.might_contain(&Key::new(1, 100, 12, 34)));
//! ```
use codec::{checksum_with_seed, Key};
use std::io::{self, Write};

/// Upper bound on the number of hash functions.
pub const MAX_HASHES: u32 = 30;

/// Largest filter accepted by [`BloomFilter::from_parts`] (128 MiB).
const MAX_BLOOM_BYTES: usize = 128 * 1024 * 1024;

/// A bloom filter over [`Key`]s backed by a byte-packed bit vector.
///
/// Hash function `i` is XXH3-64 of the serialized key seeded with `i`.
pub struct BloomFilter {
    bits: Vec<u8>,
    /// Always `bits.len() * 8`.
    num_bits: u64,
    num_hashes: u32,
}

impl BloomFilter {
    /// Creates a bloom filter sized for `expected_items` at the target
    /// `false_positive_rate`.
    ///
    /// `expected_items == 0` produces the minimum filter (one byte, one hash)
    /// rather than dividing by zero.
    ///
    /// # Panics
    ///
    /// Panics if `false_positive_rate` is not in `(0, 1)`.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        assert!(
            false_positive_rate > 0.0 && false_positive_rate < 1.0,
            "false_positive_rate must be in (0, 1)"
        );

        let m = optimal_bits(expected_items, false_positive_rate);
        let byte_len = m.div_ceil(8) as usize;

        Self {
            bits: vec![0u8; byte_len],
            num_bits: byte_len as u64 * 8,
            num_hashes: Self::num_hashes_for(expected_items, false_positive_rate),
        }
    }

    /// The hash count [`BloomFilter::new`] picks for these parameters.
    ///
    /// Readers use this to recover `k` from an SSTable's entry count.
    #[must_use]
    pub fn num_hashes_for(expected_items: usize, false_positive_rate: f64) -> u32 {
        if expected_items == 0 {
            return 1;
        }
        let m = optimal_bits(expected_items, false_positive_rate) as f64;
        let k = ((m / expected_items as f64) * std::f64::consts::LN_2).round();
        (k as u32).clamp(1, MAX_HASHES)
    }

    /// Rebuilds a filter from its serialized bytes and hash count.
    pub fn from_parts(bits: Vec<u8>, num_hashes: u32) -> io::Result<Self> {
        if bits.is_empty() || bits.len() > MAX_BLOOM_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid bloom filter size: {} bytes", bits.len()),
            ));
        }
        if num_hashes == 0 || num_hashes > MAX_HASHES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid bloom hash count: {}", num_hashes),
            ));
        }
        let num_bits = bits.len() as u64 * 8;
        Ok(Self {
            bits,
            num_bits,
            num_hashes,
        })
    }

    /// Inserts a key. Adding the same key twice sets the same bits.
    pub fn add(&mut self, key: &Key) {
        let bytes = key.to_bytes();
        for i in 0..self.num_hashes {
            let idx = self.bit_index(&bytes, i);
            self.set_bit(idx);
        }
    }

    /// Returns `true` if the key **might** be in the set, `false` if it is
    /// **definitely not** in the set.
    #[must_use]
    pub fn might_contain(&self, key: &Key) -> bool {
        let bytes = key.to_bytes();
        (0..self.num_hashes).all(|i| self.get_bit(self.bit_index(&bytes, i)))
    }

    /// Raw bit-array bytes, exactly as persisted. No framing.
    #[must_use]
    pub fn serialize(&self) -> &[u8] {
        &self.bits
    }

    /// Writes [`serialize`](BloomFilter::serialize) to `w`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.bits)
    }

    #[must_use]
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    #[must_use]
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.bits.len()
    }

    // ---- Internal helpers ----

    fn bit_index(&self, key_bytes: &[u8], i: u32) -> u64 {
        checksum_with_seed(key_bytes, u64::from(i)) % self.num_bits
    }

    fn set_bit(&mut self, idx: u64) {
        let byte_idx = (idx / 8) as usize;
        let bit_offset = (idx % 8) as u8;
        self.bits[byte_idx] |= 1 << bit_offset;
    }

    fn get_bit(&self, idx: u64) -> bool {
        let byte_idx = (idx / 8) as usize;
        let bit_offset = (idx % 8) as u8;
        (self.bits[byte_idx] >> bit_offset) & 1 == 1
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("num_bits", &self.num_bits)
            .field("num_hashes", &self.num_hashes)
            .field("bytes", &self.bits.len())
            .finish()
    }
}

/// `ceil(-1.44 * n * log2(p))`, at least one bit.
fn optimal_bits(expected_items: usize, false_positive_rate: f64) -> u64 {
    if expected_items == 0 {
        return 8;
    }
    let n = expected_items as f64;
    let m = (-1.44 * n * false_positive_rate.log2()).ceil() as u64;
    m.max(1)
}
