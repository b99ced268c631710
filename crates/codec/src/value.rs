use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{self, Read, Write};

/// Serialized size of a [`Value`].
pub const VALUE_BYTES: usize = 8;

/// A 64-bit stored value.
///
/// `Value(0)` is the tombstone: it marks the key as logically deleted. The
/// on-disk formats cannot tell a tombstone from a stored zero, so the engine
/// refuses to `put` a zero and only `delete` ever writes one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Value(pub u64);

impl Value {
    /// Reserved deletion marker.
    pub const TOMBSTONE: Value = Value(0);

    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        *self == Self::TOMBSTONE
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; VALUE_BYTES] {
        self.0.to_le_bytes()
    }

    #[must_use]
    pub fn from_bytes(bytes: &[u8; VALUE_BYTES]) -> Self {
        Self(u64::from_le_bytes(*bytes))
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u64::<LittleEndian>(self.0)
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self(r.read_u64::<LittleEndian>()?))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
