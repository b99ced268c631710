use anyhow::{bail, Context, Result};
use bloom::BloomFilter;
use codec::{Key, Value, ENTRY_BYTES};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::format::{Footer, BLOOM_FPR, FOOTER_BYTES};

/// Loads and validates a whole SSTable.
///
/// This is an inspection tool for tests and tooling: it reads the footer,
/// rebuilds the bloom filter, and loads every entry. There is no index and
/// no point lookup.
pub struct SSTableReader {
    path: PathBuf,
    footer: Footer,
    bloom: BloomFilter,
    entries: Vec<(Key, Value)>,
}

impl SSTableReader {
    /// Opens an SSTable file.
    ///
    /// # Validation
    ///
    /// - The footer magic and crc must match.
    /// - The bloom section must start at offset 0 and the index fields must
    ///   be zero.
    /// - The data section must hold a whole number of entries, and the bloom
    ///   size must match what that entry count produces.
    /// - Keys must be strictly ascending.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let f = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
        let mut rdr = BufReader::new(f);

        let filesize = rdr.seek(SeekFrom::End(0))?;
        let footer = Footer::read_from(&mut rdr)
            .with_context(|| format!("invalid SSTable footer in {}", path.display()))?;

        if footer.bloom_filter_offset != 0 {
            bail!(
                "bloom filter must start at offset 0, found {}",
                footer.bloom_filter_offset
            );
        }
        if footer.index_offset != 0 || footer.index_size != 0 {
            bail!("unexpected index block in {}", path.display());
        }

        let data_end = filesize - FOOTER_BYTES;
        let data_start = footer.data_offset();
        if data_start > data_end {
            bail!(
                "bloom filter ({} bytes) overruns the data section",
                footer.bloom_filter_size
            );
        }
        let data_len = data_end - data_start;
        if data_len % ENTRY_BYTES as u64 != 0 {
            bail!("data section length {} is not a multiple of {}", data_len, ENTRY_BYTES);
        }
        let count = (data_len / ENTRY_BYTES as u64) as usize;

        let expected_bloom = BloomFilter::new(count, BLOOM_FPR).byte_len() as u64;
        if footer.bloom_filter_size != expected_bloom {
            bail!(
                "bloom filter size {} does not match {} entries (expected {})",
                footer.bloom_filter_size,
                count,
                expected_bloom
            );
        }

        rdr.seek(SeekFrom::Start(footer.bloom_filter_offset))?;
        let mut bits = vec![0u8; footer.bloom_filter_size as usize];
        rdr.read_exact(&mut bits)?;
        let bloom = BloomFilter::from_parts(bits, BloomFilter::num_hashes_for(count, BLOOM_FPR))?;

        let mut entries: Vec<(Key, Value)> = Vec::with_capacity(count);
        for _ in 0..count {
            let key = Key::read_from(&mut rdr)?;
            let value = Value::read_from(&mut rdr)?;
            if let Some((prev, _)) = entries.last() {
                if *prev >= key {
                    bail!("corrupt SSTable: key ({}) out of order after ({})", key, prev);
                }
            }
            entries.push((key, value));
        }

        Ok(Self {
            path,
            footer,
            bloom,
            entries,
        })
    }

    #[must_use]
    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    /// Entries in on-disk (ascending key) order.
    #[must_use]
    pub fn entries(&self) -> &[(Key, Value)] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn bloom(&self) -> &BloomFilter {
        &self.bloom
    }

    /// Bloom filter check; `false` means the key is definitely absent.
    #[must_use]
    pub fn might_contain(&self, key: &Key) -> bool {
        self.bloom.might_contain(key)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for SSTableReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SSTableReader")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .field("bloom", &self.bloom)
            .finish()
    }
}
