//! The [`Deserializable`] trait, [`Cursor`] buffer, and primitive impls.

use std::fmt;

use crate::serialize::{BOOL_FALSE_ID, BOOL_TRUE_ID, LONG_BYTES_MARKER, VECTOR_ID};

// ─── Error ───────────────────────────────────────────────────────────────────

/// Errors that can occur during deserialization.
///
/// All of them mean the input is malformed for the expected shape; none of
/// them says anything about whether the bytes were authentic.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Ran out of bytes before the value was fully read.
    UnexpectedEof,
    /// Read a constructor id that is valid but not acceptable here.
    UnexpectedConstructor {
        /// The id that was read.
        id: u32,
    },
    /// Read a constructor id that the schema does not know.
    UnknownConstructor {
        /// The id that was read.
        id: u32,
    },
    /// A length prefix claims more bytes than the buffer holds.
    LengthOverflow {
        /// Declared length.
        declared:  usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },
    /// A `string` field held bytes that are not UTF-8.
    InvalidUtf8,
    /// A bounded read finished with unread bytes left over.
    TrailingBytes {
        /// Number of unread bytes.
        count: usize,
    },
    /// The schema references a type it does not define.
    UnknownType {
        /// The referenced type name.
        name: String,
    },
    /// Objects or vectors nested deeper than the decoder allows.
    NestingTooDeep,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of buffer"),
            Self::UnexpectedConstructor { id } => {
                write!(f, "unexpected constructor id: {id:#010x}")
            }
            Self::UnknownConstructor { id } => write!(f, "unknown constructor id: {id:#010x}"),
            Self::LengthOverflow { declared, remaining } => {
                write!(f, "declared length {declared} exceeds remaining {remaining} bytes")
            }
            Self::InvalidUtf8 => write!(f, "string is not valid UTF-8"),
            Self::TrailingBytes { count } => write!(f, "{count} trailing bytes after value"),
            Self::UnknownType { name } => write!(f, "schema has no type named {name}"),
            Self::NestingTooDeep => write!(f, "value nested too deeply"),
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` for deserialization.
pub type Result<T> = std::result::Result<T, Error>;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// A zero-copy cursor over an in-memory byte slice.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor positioned at the start of `buf`.
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize { self.pos }

    /// Remaining bytes.
    pub fn remaining(&self) -> usize { self.buf.len() - self.pos }

    /// Skip `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_slice(n).map(|_| ())
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::UnexpectedEof);
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        match self.buf.get(self.pos).copied() {
            Some(b) => { self.pos += 1; Ok(b) }
            None    => Err(Error::UnexpectedEof),
        }
    }

    /// Read exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    /// Consume all remaining bytes.
    pub fn read_to_end(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    /// Fail with [`Error::TrailingBytes`] unless every byte was consumed.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(Error::TrailingBytes { count }),
        }
    }
}

/// Alias used throughout the codec: `&mut Cursor<'_>`.
pub type Buffer<'a, 'b> = &'a mut Cursor<'b>;

// ─── Deserializable ──────────────────────────────────────────────────────────

/// Deserialize a value from TL binary format.
pub trait Deserializable: Sized {
    /// Read `Self` from `buf`, advancing its position.
    fn deserialize(buf: Buffer) -> Result<Self>;

    /// Convenience: deserialize from a byte slice, requiring it be consumed
    /// entirely.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::from_slice(bytes);
        let value = Self::deserialize(&mut cursor)?;
        cursor.finish()?;
        Ok(value)
    }
}

// ─── Primitives ───────────────────────────────────────────────────────────────

impl Deserializable for bool {
    fn deserialize(buf: Buffer) -> Result<Self> {
        match u32::deserialize(buf)? {
            BOOL_TRUE_ID => Ok(true),
            BOOL_FALSE_ID => Ok(false),
            id => Err(Error::UnexpectedConstructor { id }),
        }
    }
}

macro_rules! fixed_width {
    ( $( $t:ty ),+ ) => { $(
        impl Deserializable for $t {
            fn deserialize(buf: Buffer) -> Result<Self> {
                Ok(<$t>::from_le_bytes(buf.read_array()?))
            }
        }
    )+ };
}

fixed_width!(i32, u32, i64, u64, f64);

impl Deserializable for [u8; 16] {
    fn deserialize(buf: Buffer) -> Result<Self> { buf.read_array() }
}

impl Deserializable for [u8; 32] {
    fn deserialize(buf: Buffer) -> Result<Self> { buf.read_array() }
}

// ─── Bytes / String ───────────────────────────────────────────────────────────

/// Read a TL byte string, borrowing the payload from the cursor.
pub fn read_bytes<'a>(buf: &mut Cursor<'a>) -> Result<&'a [u8]> {
    let first = buf.read_byte()?;
    let (len, header_len) = if first != LONG_BYTES_MARKER {
        (first as usize, 1)
    } else {
        let [a, b, c] = buf.read_array::<3>()?;
        (a as usize | (b as usize) << 8 | (c as usize) << 16, 4)
    };

    if len > buf.remaining() {
        return Err(Error::LengthOverflow { declared: len, remaining: buf.remaining() });
    }
    let data = buf.read_slice(len)?;

    let padding = (4 - (header_len + len) % 4) % 4;
    buf.skip(padding)?;
    Ok(data)
}

impl Deserializable for Vec<u8> {
    fn deserialize(buf: Buffer) -> Result<Self> {
        read_bytes(buf).map(<[u8]>::to_vec)
    }
}

impl Deserializable for String {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let bytes = read_bytes(buf)?;
        std::str::from_utf8(bytes).map(str::to_owned).map_err(|_| Error::InvalidUtf8)
    }
}

/// Raw bytes: whatever is left in the cursor.
impl Deserializable for crate::Blob {
    fn deserialize(buf: Buffer) -> Result<Self> {
        Ok(crate::Blob(buf.read_to_end().to_vec()))
    }
}

// ─── Vectors ─────────────────────────────────────────────────────────────────

/// Read a bare vector's element count, rejecting counts that cannot fit.
///
/// Every TL element occupies at least one byte except `true`, so a count
/// larger than the remaining input is malformed.
pub fn read_vector_len(buf: Buffer) -> Result<usize> {
    let len = u32::deserialize(buf)? as usize;
    if len > buf.remaining() {
        return Err(Error::LengthOverflow { declared: len, remaining: buf.remaining() });
    }
    Ok(len)
}

impl<T: Deserializable> Deserializable for crate::BoxedVec<T> {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let id = u32::deserialize(buf)?;
        if id != VECTOR_ID {
            return Err(Error::UnexpectedConstructor { id });
        }
        let crate::RawVec(items) = crate::RawVec::deserialize(buf)?;
        Ok(crate::BoxedVec(items))
    }
}

impl<T: Deserializable> Deserializable for crate::RawVec<T> {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let len = read_vector_len(buf)?;
        let inner = (0..len).map(|_| T::deserialize(buf)).collect::<Result<_>>()?;
        Ok(crate::RawVec(inner))
    }
}
