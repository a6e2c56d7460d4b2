//! Plaintext frame layout.
//!
//! ```text
//! salt:       i64   ─┐
//! session_id: i64    │ FRAME_HEADER_LEN = 32
//! msg_id:     i64    │
//! seq_no:     u32    │
//! length:     u32   ─┘
//! content:    [u8; length]
//! padding:    [u8; 12..=1024]   total ≡ 0 (mod 16)
//! ```

use mtcore_crypto::aes::BLOCK_LEN;
use mtcore_tl::deserialize::{self, Cursor, Deserializable};
use mtcore_tl::Serializable;

/// Bytes before the content.
pub const FRAME_HEADER_LEN: usize = 8 + 8 + 8 + 4 + 4;

/// `key_id` width in the envelope.
pub const KEY_ID_LEN: usize = 8;

/// `msg_key` width in the envelope.
pub const MSG_KEY_LEN: usize = 16;

/// `key_id` + `msg_key`.
pub const ENVELOPE_HEADER_LEN: usize = KEY_ID_LEN + MSG_KEY_LEN;

/// Smallest padding a frame may carry.
pub const MIN_PADDING: usize = 12;

/// Largest padding a frame may carry.
pub const MAX_PADDING: usize = 1024;

/// Largest padding [`padding_len`] ever returns.
pub(crate) const MAX_CHOSEN_PADDING: usize = MIN_PADDING + BLOCK_LEN - 1;

/// The smallest padding `>= 12` that makes the frame a multiple of 16.
///
/// ```rust
/// use mtcore_session::frame::padding_len;
///
/// assert_eq!(padding_len(0), 16);  // 32 + 0 + 16 = 48
/// assert_eq!(padding_len(4), 12);  // 32 + 4 + 12 = 48
/// ```
pub fn padding_len(content_len: usize) -> usize {
    let rem = (FRAME_HEADER_LEN + content_len + MIN_PADDING) % BLOCK_LEN;
    MIN_PADDING + if rem == 0 { 0 } else { BLOCK_LEN - rem }
}

/// The fixed 32-byte frame header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FrameHeader {
    pub salt:       i64,
    pub session_id: i64,
    pub message_id: u64,
    pub seq_no:     u32,
    pub length:     u32,
}

impl FrameHeader {
    pub fn write(&self, buf: &mut impl Extend<u8>) {
        self.salt.serialize(buf);
        self.session_id.serialize(buf);
        self.message_id.serialize(buf);
        self.seq_no.serialize(buf);
        self.length.serialize(buf);
    }

    pub fn read(frame: &[u8]) -> deserialize::Result<Self> {
        let mut cur = Cursor::from_slice(frame);
        Ok(Self {
            salt:       i64::deserialize(&mut cur)?,
            session_id: i64::deserialize(&mut cur)?,
            message_id: u64::deserialize(&mut cur)?,
            seq_no:     u32::deserialize(&mut cur)?,
            length:     u32::deserialize(&mut cur)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_bounds() {
        for len in 0..256 {
            let pad = padding_len(len);
            assert_eq!((FRAME_HEADER_LEN + len + pad) % 16, 0, "len {len}");
            assert!((MIN_PADDING..=MAX_CHOSEN_PADDING).contains(&pad), "len {len}");
        }
    }

    #[test]
    fn header_layout() {
        let header = FrameHeader { salt: 1, session_id: 2, message_id: 3, seq_no: 4, length: 8 };
        let mut out = Vec::new();
        header.write(&mut out);
        assert_eq!(out.len(), FRAME_HEADER_LEN);
        assert_eq!(&out[24..28], &4u32.to_le_bytes());
        assert_eq!(FrameHeader::read(&out).unwrap(), header);
    }

    #[test]
    fn short_header_is_eof() {
        assert_eq!(FrameHeader::read(&[0u8; 31]), Err(deserialize::Error::UnexpectedEof));
    }
}
