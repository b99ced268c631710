//! SSTable footer layout and read/write helpers.
//!
//! ```text
//! [magic: u32 LE = 0x5354424C "STBL"]
//! [bloom_filter_offset: u64 LE][bloom_filter_size: u64 LE]
//! [index_offset: u64 LE][index_size: u64 LE]
//! [crc: u32 LE]
//! ```
//!
//! The reader seeks `FOOTER_BYTES` back from end-of-file, checks the magic,
//! then verifies `crc` before trusting any offset.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read, Result as IoResult, Seek, SeekFrom, Write};

/// Magic number identifying citybits SSTables (ASCII "STBL").
pub const SSTABLE_MAGIC: u32 = 0x5354_424C;

/// Footer size: 4 (`magic`) + 4 * 8 (offsets/sizes) + 4 (`crc`).
pub const FOOTER_BYTES: u64 = 4 + 8 + 8 + 8 + 8 + 4;

/// False positive rate every SSTable bloom filter is built for.
pub const BLOOM_FPR: f64 = 0.01;

const CRC_COVERED_BYTES: usize = FOOTER_BYTES as usize - 4;

/// Parsed SSTable footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub bloom_filter_offset: u64,
    pub bloom_filter_size: u64,
    /// Reserved, always 0.
    pub index_offset: u64,
    /// Reserved, always 0.
    pub index_size: u64,
}

impl Footer {
    /// Footer for a file whose bloom section is at `bloom_filter_offset`
    /// and has no index block.
    #[must_use]
    pub fn new(bloom_filter_offset: u64, bloom_filter_size: u64) -> Self {
        Self {
            bloom_filter_offset,
            bloom_filter_size,
            index_offset: 0,
            index_size: 0,
        }
    }

    /// First byte of the data section.
    #[must_use]
    pub fn data_offset(&self) -> u64 {
        self.bloom_filter_offset + self.bloom_filter_size
    }

    /// CRC-32 over the footer fields preceding `crc`.
    #[must_use]
    pub fn crc(&self) -> u32 {
        crc32fast::hash(&self.encode()[..CRC_COVERED_BYTES])
    }

    /// Encodes the full footer, including its `crc`.
    #[must_use]
    pub fn encode(&self) -> [u8; FOOTER_BYTES as usize] {
        let mut out = [0u8; FOOTER_BYTES as usize];
        out[0..4].copy_from_slice(&SSTABLE_MAGIC.to_le_bytes());
        out[4..12].copy_from_slice(&self.bloom_filter_offset.to_le_bytes());
        out[12..20].copy_from_slice(&self.bloom_filter_size.to_le_bytes());
        out[20..28].copy_from_slice(&self.index_offset.to_le_bytes());
        out[28..36].copy_from_slice(&self.index_size.to_le_bytes());
        let crc = crc32fast::hash(&out[..CRC_COVERED_BYTES]);
        out[36..40].copy_from_slice(&crc.to_le_bytes());
        out
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> IoResult<()> {
        w.write_all(&self.encode())
    }

    /// Parses a footer, rejecting a wrong magic or a crc mismatch.
    pub fn decode(bytes: &[u8]) -> IoResult<Self> {
        if bytes.len() != FOOTER_BYTES as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("footer must be {} bytes, got {}", FOOTER_BYTES, bytes.len()),
            ));
        }

        let mut r = bytes;
        let magic = r.read_u32::<LittleEndian>()?;
        if magic != SSTABLE_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown SSTable magic: {:#x}", magic),
            ));
        }
        let bloom_filter_offset = r.read_u64::<LittleEndian>()?;
        let bloom_filter_size = r.read_u64::<LittleEndian>()?;
        let index_offset = r.read_u64::<LittleEndian>()?;
        let index_size = r.read_u64::<LittleEndian>()?;
        let stored_crc = r.read_u32::<LittleEndian>()?;

        let computed = crc32fast::hash(&bytes[..CRC_COVERED_BYTES]);
        if stored_crc != computed {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "footer crc mismatch: stored {:#010x}, computed {:#010x}",
                    stored_crc, computed
                ),
            ));
        }

        Ok(Self {
            bloom_filter_offset,
            bloom_filter_size,
            index_offset,
            index_size,
        })
    }

    /// Reads the footer from the last [`FOOTER_BYTES`] of `r`.
    pub fn read_from<R: Read + Seek>(r: &mut R) -> IoResult<Self> {
        let filesize = r.seek(SeekFrom::End(0))?;
        if filesize < FOOTER_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "file too small for SSTable footer",
            ));
        }

        r.seek(SeekFrom::End(-(FOOTER_BYTES as i64)))?;
        let mut buf = [0u8; FOOTER_BYTES as usize];
        r.read_exact(&mut buf)?;
        Self::decode(&buf)
    }
}
