use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{self, Read, Write};

/// Serialized size of a [`Key`].
pub const KEY_BYTES: usize = 8;

/// A spatial object key.
///
/// Ordering is lexicographic over `(zone_id, object_type, x, y)`, which is the
/// field declaration order, so the derived `Ord` is the storage order used by
/// the memtable and by SSTable data blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Key {
    pub zone_id: u16,
    pub object_type: u16,
    pub x: u16,
    pub y: u16,
}

impl Key {
    #[must_use]
    pub const fn new(zone_id: u16, object_type: u16, x: u16, y: u16) -> Self {
        Self {
            zone_id,
            object_type,
            x,
            y,
        }
    }

    /// Encodes the key as 8 little-endian bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; KEY_BYTES] {
        let mut out = [0u8; KEY_BYTES];
        out[0..2].copy_from_slice(&self.zone_id.to_le_bytes());
        out[2..4].copy_from_slice(&self.object_type.to_le_bytes());
        out[4..6].copy_from_slice(&self.x.to_le_bytes());
        out[6..8].copy_from_slice(&self.y.to_le_bytes());
        out
    }

    #[must_use]
    pub fn from_bytes(bytes: &[u8; KEY_BYTES]) -> Self {
        Self {
            zone_id: u16::from_le_bytes([bytes[0], bytes[1]]),
            object_type: u16::from_le_bytes([bytes[2], bytes[3]]),
            x: u16::from_le_bytes([bytes[4], bytes[5]]),
            y: u16::from_le_bytes([bytes[6], bytes[7]]),
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u16::<LittleEndian>(self.zone_id)?;
        w.write_u16::<LittleEndian>(self.object_type)?;
        w.write_u16::<LittleEndian>(self.x)?;
        w.write_u16::<LittleEndian>(self.y)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            zone_id: r.read_u16::<LittleEndian>()?,
            object_type: r.read_u16::<LittleEndian>()?,
            x: r.read_u16::<LittleEndian>()?,
            y: r.read_u16::<LittleEndian>()?,
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "zone={} type={} x={} y={}",
            self.zone_id, self.object_type, self.x, self.y
        )
    }
}
