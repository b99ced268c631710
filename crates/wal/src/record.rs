use byteorder::{LittleEndian, ReadBytesExt};
use codec::{record_checksum, Key, Value, KEY_BYTES, VALUE_BYTES};

use crate::WalError;

/// Identifies a WAL record.
pub const WAL_MAGIC: u32 = 0xDEAD_BEEF;

/// Current record format version.
pub const WAL_VERSION: u16 = 1;

/// Size of [`WalHeader`] on disk: 4 + 2 + 2 + 8.
pub const HEADER_BYTES: usize = 16;

/// Size of one full record on disk.
pub const RECORD_BYTES: usize = HEADER_BYTES + KEY_BYTES + VALUE_BYTES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalHeader {
    pub magic: u32,
    pub version: u16,
    pub reserved: u16,
    pub checksum: u64,
}

impl WalHeader {
    /// Header for a fresh record carrying `key`/`value`.
    #[must_use]
    pub fn for_entry(key: &Key, value: Value) -> Self {
        Self {
            magic: WAL_MAGIC,
            version: WAL_VERSION,
            reserved: 0,
            checksum: record_checksum(key, value),
        }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.magic.to_le_bytes());
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.reserved.to_le_bytes());
        buf.extend_from_slice(&self.checksum.to_le_bytes());
    }
}

/// A single logged mutation. Deletes are records whose value is
/// [`Value::TOMBSTONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalRecord {
    pub key: Key,
    pub value: Value,
}

impl WalRecord {
    #[must_use]
    pub fn new(key: Key, value: Value) -> Self {
        Self { key, value }
    }

    #[must_use]
    pub fn header(&self) -> WalHeader {
        WalHeader::for_entry(&self.key, self.value)
    }

    /// Appends the 32-byte encoding to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.reserve(RECORD_BYTES);
        self.header().encode_into(buf);
        buf.extend_from_slice(&self.key.to_bytes());
        buf.extend_from_slice(&self.value.to_bytes());
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(RECORD_BYTES);
        self.encode_into(&mut buf);
        buf
    }

    /// Parses and verifies one record.
    ///
    /// Rejects a wrong magic or version, then recomputes the checksum over the
    /// key and value bytes. `reserved` is not validated.
    pub fn decode(bytes: &[u8; RECORD_BYTES]) -> Result<Self, WalError> {
        let mut r = &bytes[..];
        let header = WalHeader {
            magic: r.read_u32::<LittleEndian>()?,
            version: r.read_u16::<LittleEndian>()?,
            reserved: r.read_u16::<LittleEndian>()?,
            checksum: r.read_u64::<LittleEndian>()?,
        };

        if header.magic != WAL_MAGIC {
            return Err(WalError::BadMagic(header.magic));
        }
        if header.version != WAL_VERSION {
            return Err(WalError::UnsupportedVersion(header.version));
        }

        let key = Key::read_from(&mut r)?;
        let value = Value::read_from(&mut r)?;

        let computed = record_checksum(&key, value);
        if computed != header.checksum {
            return Err(WalError::ChecksumMismatch {
                stored: header.checksum,
                computed,
            });
        }

        Ok(Self { key, value })
    }
}
