//! Hard errors and drop reasons.
//!
//! [`SessionError`] is for caller bugs and local failures; it aborts the
//! operation. [`DropReason`] describes why an inbound envelope was
//! discarded; a dropped frame never tears the session down.

use std::fmt;

use mtcore_tl::{EncodeError, deserialize};

/// Errors that abort an `encrypt` / `decrypt` call.
#[derive(Debug)]
pub enum SessionError {
    /// No auth key is set up. Call `setup_keys` first.
    Unkeyed,
    /// Outgoing content could not be encoded.
    Encode(EncodeError),
    /// Authenticated content did not decode against the schema.
    Decode(deserialize::Error),
    /// The OS random source failed.
    Random(getrandom::Error),
    /// Content is longer than a frame's 32-bit length field allows.
    ContentTooLong {
        /// Content length in bytes.
        len: usize,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unkeyed => write!(f, "auth key is not set up"),
            Self::Encode(e) => write!(f, "encode: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Random(e) => write!(f, "random source: {e}"),
            Self::ContentTooLong { len } => write!(f, "content of {len} bytes does not fit a frame"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::Random(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EncodeError> for SessionError {
    fn from(e: EncodeError) -> Self { Self::Encode(e) }
}

impl From<deserialize::Error> for SessionError {
    fn from(e: deserialize::Error) -> Self { Self::Decode(e) }
}

/// Why an inbound envelope was discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Shorter than `key_id` + `msg_key`.
    TooShort {
        /// Envelope length.
        len: usize,
    },
    /// Ciphertext not a multiple of 16 and truncation is disabled.
    Unaligned {
        /// Ciphertext length.
        len: usize,
    },
    /// The envelope was encrypted under a different auth key.
    UnknownKeyId {
        /// The key id carried by the envelope.
        received: [u8; 8],
    },
    /// The recomputed message key does not match.
    IntegrityCheckFailed,
    /// The decrypted frame cannot hold a header.
    FrameTooShort {
        /// Frame length.
        len: usize,
    },
    /// The frame belongs to another session.
    ForeignSession {
        /// Session id carried by the frame.
        received: i64,
    },
    /// The declared content length runs past the frame.
    LengthExceedsFrame {
        /// Declared length.
        length:    u32,
        /// Bytes available after the header.
        available: usize,
    },
    /// The declared content length is not a multiple of 4.
    MisalignedLength {
        /// Declared length.
        length: u32,
    },
    /// Padding outside `12..=1024` bytes.
    InvalidPadding {
        /// Actual padding length.
        padding: usize,
    },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { len } => write!(f, "envelope too short ({len} bytes)"),
            Self::Unaligned { len } => write!(f, "ciphertext of {len} bytes is not block aligned"),
            Self::UnknownKeyId { received } => write!(f, "unknown key id {}", hex::encode(received)),
            Self::IntegrityCheckFailed => write!(f, "integrity check failed"),
            Self::FrameTooShort { len } => write!(f, "frame too short ({len} bytes)"),
            Self::ForeignSession { received } => {
                write!(f, "foreign session id {}", hex::encode(received.to_le_bytes()))
            }
            Self::LengthExceedsFrame { length, available } => {
                write!(f, "length {length} exceeds frame ({available} bytes available)")
            }
            Self::MisalignedLength { length } => write!(f, "length {length} is not a multiple of 4"),
            Self::InvalidPadding { padding } => write!(f, "invalid padding size {padding}"),
        }
    }
}
