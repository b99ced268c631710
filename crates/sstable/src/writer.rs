use anyhow::{Context, Result};
use bloom::BloomFilter;
use codec::{Key, Value};
use memtable::Memtable;
use std::ffi::OsString;
use std::fs::{self, rename, OpenOptions};
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use crate::format::{Footer, BLOOM_FPR};

/// Writes a frozen [`Memtable`] to disk as an immutable SSTable file.
///
/// The writer is stateless. The write is crash-safe: everything goes to
/// `<path>.tmp`, which is fsynced and then atomically renamed onto `path`.
/// A crash at any point leaves either no file at `path` or a complete one.
pub struct SSTableWriter {}

impl SSTableWriter {
    /// Flushes `mem` to a new SSTable file at `path`, returning the footer
    /// that was written.
    ///
    /// An empty memtable produces a valid table with a minimum-size filter
    /// and no entries.
    pub fn write_from_memtable(path: &Path, mem: &Memtable) -> Result<Footer> {
        Self::write_entries(path, mem.iter().map(|(k, v)| (*k, *v)))
    }

    /// Writes an SSTable from `(key, value)` pairs.
    ///
    /// The entries are walked more than once (the filter is sized and filled
    /// before the data section is written), hence the `Clone` bound. They
    /// must be in strictly ascending key order; anything else aborts the
    /// write and leaves no file behind.
    pub fn write_entries<I>(path: &Path, entries: I) -> Result<Footer>
    where
        I: IntoIterator<Item = (Key, Value)>,
        I::IntoIter: Clone,
    {
        let entries = entries.into_iter();
        let tmp_path = tmp_path_for(path);

        let (footer, count) = match Self::write_tmp(&tmp_path, entries) {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(e);
            }
        };

        if let Err(e) = rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(anyhow::Error::new(e)
                .context(format!("failed to rename into {}", path.display())));
        }

        // Fsync the parent directory so the rename itself is durable.
        if let Some(parent) = path.parent() {
            if let Ok(dir) = fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        tracing::info!(
            path = %path.display(),
            entries = count,
            bloom_bytes = footer.bloom_filter_size,
            "sstable written"
        );

        Ok(footer)
    }

    fn write_tmp<I>(tmp_path: &Path, entries: I) -> Result<(Footer, usize)>
    where
        I: Iterator<Item = (Key, Value)> + Clone,
    {
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(tmp_path)
            .with_context(|| format!("failed to open {} for writing", tmp_path.display()))?;
        let mut file = BufWriter::new(raw_file);

        let count = entries.clone().count();
        let mut bloom = BloomFilter::new(count, BLOOM_FPR);
        for (key, _) in entries.clone() {
            bloom.add(&key);
        }

        // Write BLOOM section
        let bloom_filter_offset = file.stream_position()?;
        bloom.write_to(&mut file)?;
        let bloom_filter_size = bloom.byte_len() as u64;

        // Write DATA section
        let mut prev: Option<Key> = None;
        for (key, value) in entries {
            if let Some(p) = prev {
                anyhow::ensure!(
                    p < key,
                    "entries must be strictly ascending: ({}) follows ({})",
                    key,
                    p
                );
            }
            key.write_to(&mut file)?;
            value.write_to(&mut file)?;
            prev = Some(key);
        }

        let footer = Footer::new(bloom_filter_offset, bloom_filter_size);
        footer.write_to(&mut file)?;

        // Flush BufWriter, then sync the underlying file
        file.flush()?;
        file.into_inner()?.sync_all()?;

        tracing::debug!(
            path = %tmp_path.display(),
            bloom_bits = bloom.num_bits(),
            bloom_hashes = bloom.num_hashes(),
            "sstable temp file synced"
        );

        Ok((footer, count))
    }
}

/// `<path>.tmp`, next to the target so the rename stays on one filesystem.
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
