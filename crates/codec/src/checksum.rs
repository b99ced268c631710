//! 64-bit non-cryptographic checksums (XXH3).
//!
//! Streaming through [`Checksum`] produces the same digest as hashing the
//! concatenated input in one call.

use xxhash_rust::xxh3::{xxh3_64, xxh3_64_with_seed, Xxh3};

use crate::{Key, Value};

/// XXH3-64 of `data` with the default (zero) seed.
#[must_use]
pub fn checksum(data: &[u8]) -> u64 {
    xxh3_64(data)
}

/// XXH3-64 of `data` with an explicit seed. The Bloom filter uses the hash
/// function index as the seed.
#[must_use]
pub fn checksum_with_seed(data: &[u8], seed: u64) -> u64 {
    xxh3_64_with_seed(data, seed)
}

/// Checksum stored in a WAL record header: key bytes, then value bytes.
#[must_use]
pub fn record_checksum(key: &Key, value: Value) -> u64 {
    let mut c = Checksum::new();
    c.update(&key.to_bytes());
    c.update(&value.to_bytes());
    c.finish()
}

/// Incremental XXH3-64 state.
#[derive(Clone)]
pub struct Checksum {
    state: Xxh3,
}

impl Checksum {
    #[must_use]
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    #[must_use]
    pub fn finish(&self) -> u64 {
        self.state.digest()
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::new()
    }
}
