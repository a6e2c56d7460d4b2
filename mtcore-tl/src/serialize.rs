//! The [`Serializable`] trait and its implementations for primitive TL types.
//!
//! All integers are little-endian. Encoding follows the
//! [MTProto Binary Serialization] rules.
//!
//! [MTProto Binary Serialization]: https://core.telegram.org/mtproto/serialize

/// Constructor id of `boolTrue`.
pub const BOOL_TRUE_ID: u32 = 0x997275b5;
/// Constructor id of `boolFalse`.
pub const BOOL_FALSE_ID: u32 = 0xbc799737;
/// Constructor id of the boxed `Vector t`.
pub const VECTOR_ID: u32 = 0x1cb5c415;

/// Byte strings shorter than this use a 1-byte length prefix.
pub const SHORT_BYTES_LIMIT: usize = 254;
/// Marker byte introducing a 3-byte length.
pub const LONG_BYTES_MARKER: u8 = 0xfe;

/// Serialize `self` into TL binary format.
pub trait Serializable {
    /// Appends the serialized form of `self` to `buf`.
    fn serialize(&self, buf: &mut impl Extend<u8>);

    /// Exact number of bytes [`Serializable::serialize`] will append.
    fn serialized_len(&self) -> usize;

    /// Convenience: allocate a fresh `Vec<u8>` and serialize into it.
    fn to_bytes(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(self.serialized_len());
        self.serialize(&mut v);
        v
    }
}

/// Encoded length of a TL byte string carrying `len` payload bytes,
/// including the length prefix and alignment padding.
pub fn bytes_len(len: usize) -> usize {
    let header = if len < SHORT_BYTES_LIMIT { 1 } else { 4 };
    (header + len).div_ceil(4) * 4
}

/// Write a TL byte string: length prefix, payload, zero padding to 4 bytes.
///
/// * `len < 254`: `[len as u8][data][padding]`
/// * otherwise:   `[0xfe][len as 3 LE bytes][data][padding]`
///
/// Payloads longer than 2^24 - 1 bytes cannot be represented; callers must
/// check beforehand.
pub fn write_bytes(data: &[u8], buf: &mut impl Extend<u8>) {
    let len = data.len();
    let header_len = if len < SHORT_BYTES_LIMIT {
        buf.extend([len as u8]);
        1
    } else {
        buf.extend([
            LONG_BYTES_MARKER,
            (len & 0xff) as u8,
            ((len >> 8) & 0xff) as u8,
            ((len >> 16) & 0xff) as u8,
        ]);
        4
    };
    buf.extend(data.iter().copied());
    let padding = (4 - (header_len + len) % 4) % 4;
    buf.extend(std::iter::repeat_n(0u8, padding));
}

// ─── bool ────────────────────────────────────────────────────────────────────

/// `true`  → `boolTrue#997275b5`
/// `false` → `boolFalse#bc799737`
impl Serializable for bool {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let id = if *self { BOOL_TRUE_ID } else { BOOL_FALSE_ID };
        id.serialize(buf);
    }
    fn serialized_len(&self) -> usize { 4 }
}

// ─── fixed width ─────────────────────────────────────────────────────────────

macro_rules! fixed_width {
    ( $( $t:ty ),+ ) => { $(
        impl Serializable for $t {
            fn serialize(&self, buf: &mut impl Extend<u8>) {
                buf.extend(self.to_le_bytes());
            }
            fn serialized_len(&self) -> usize { std::mem::size_of::<$t>() }
        }
    )+ };
}

fixed_width!(i32, u32, i64, u64, f64);

/// `int128` is carried as 16 raw bytes.
impl Serializable for [u8; 16] {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        buf.extend(self.iter().copied());
    }
    fn serialized_len(&self) -> usize { 16 }
}

/// `int256` is carried as 32 raw bytes.
impl Serializable for [u8; 32] {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        buf.extend(self.iter().copied());
    }
    fn serialized_len(&self) -> usize { 32 }
}

// ─── strings / bytes ─────────────────────────────────────────────────────────

impl Serializable for &[u8] {
    fn serialize(&self, buf: &mut impl Extend<u8>) { write_bytes(self, buf); }
    fn serialized_len(&self) -> usize { bytes_len(self.len()) }
}

impl Serializable for Vec<u8> {
    fn serialize(&self, buf: &mut impl Extend<u8>) { write_bytes(self, buf); }
    fn serialized_len(&self) -> usize { bytes_len(self.len()) }
}

impl Serializable for String {
    fn serialize(&self, buf: &mut impl Extend<u8>) { write_bytes(self.as_bytes(), buf); }
    fn serialized_len(&self) -> usize { bytes_len(self.len()) }
}

impl Serializable for &str {
    fn serialize(&self, buf: &mut impl Extend<u8>) { write_bytes(self.as_bytes(), buf); }
    fn serialized_len(&self) -> usize { bytes_len(self.len()) }
}

/// Raw bytes, written verbatim without a length prefix.
impl Serializable for crate::Blob {
    fn serialize(&self, buf: &mut impl Extend<u8>) { buf.extend(self.0.iter().copied()); }
    fn serialized_len(&self) -> usize { self.0.len() }
}

// ─── vectors ─────────────────────────────────────────────────────────────────

/// Boxed `Vector<T>`: constructor id, count, items.
impl<T: Serializable> Serializable for crate::BoxedVec<T> {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        VECTOR_ID.serialize(buf);
        crate::RawVec::<T>::serialize_items(&self.0, buf);
    }
    fn serialized_len(&self) -> usize {
        4 + crate::RawVec::<T>::items_len(&self.0)
    }
}

/// Bare `vector<T>`: count followed by items, no constructor id.
impl<T: Serializable> Serializable for crate::RawVec<T> {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        Self::serialize_items(&self.0, buf);
    }
    fn serialized_len(&self) -> usize { Self::items_len(&self.0) }
}

impl<T: Serializable> crate::RawVec<T> {
    fn serialize_items(items: &[T], buf: &mut impl Extend<u8>) {
        (items.len() as u32).serialize(buf);
        for item in items { item.serialize(buf); }
    }

    fn items_len(items: &[T]) -> usize {
        4 + items.iter().map(Serializable::serialized_len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_len_matches_written() {
        for len in [0, 1, 2, 3, 4, 253, 254, 255, 1000] {
            let data = vec![0xabu8; len];
            let mut out = Vec::new();
            write_bytes(&data, &mut out);
            assert_eq!(out.len(), bytes_len(len), "len {len}");
            assert_eq!(out.len() % 4, 0);
        }
    }

    #[test]
    fn short_prefix_boundary() {
        let mut out = Vec::new();
        write_bytes(&[1u8; 253], &mut out);
        assert_eq!(out[0], 253);

        let mut out = Vec::new();
        write_bytes(&[1u8; 254], &mut out);
        assert_eq!(&out[..4], &[0xfe, 254, 0, 0]);
    }
}
