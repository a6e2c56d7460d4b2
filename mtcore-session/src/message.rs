//! Inputs and outputs of the session's encrypt / decrypt calls.

use std::fmt;

use mtcore_tl::TlObject;

use crate::DropReason;

/// A 64-bit MTProto message identifier.
///
/// Generated by the caller (time-based, monotonic per session); the
/// session only embeds it into frames.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MessageId(pub u64);

impl From<u64> for MessageId {
    fn from(v: u64) -> Self { Self(v) }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Content handed to [`crate::MtprotoSession::encrypt`].
#[derive(Clone, Copy, Debug)]
pub enum Payload<'a> {
    /// A schema object, encoded by the session's [`mtcore_tl::Schema`].
    Object(&'a TlObject),
    /// Bytes copied into the frame as they are.
    Raw(&'a [u8]),
}

impl<'a> From<&'a TlObject> for Payload<'a> {
    fn from(obj: &'a TlObject) -> Self { Self::Object(obj) }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(bytes: &'a [u8]) -> Self { Self::Raw(bytes) }
}

/// A frame that passed every check.
#[derive(Clone, Debug, PartialEq)]
pub struct DecryptedMessage<T> {
    /// Server salt carried by the frame.
    pub salt:       i64,
    /// `msg_id` of the inner message.
    pub message_id: MessageId,
    /// `seq_no` of the inner message.
    pub seq_no:     u32,
    /// Decoded content.
    pub content:    T,
}

/// Outcome of a decrypt call that did not hit a hard error.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub enum Unpacked<T> {
    /// The frame was authentic and well-formed.
    Message(DecryptedMessage<T>),
    /// The frame was discarded; the session is unaffected.
    Dropped(DropReason),
}

impl<T> Unpacked<T> {
    /// The message, if it was accepted.
    pub fn message(self) -> Option<DecryptedMessage<T>> {
        match self {
            Self::Message(m) => Some(m),
            Self::Dropped(_) => None,
        }
    }

    /// The drop reason, if the frame was discarded.
    pub fn dropped(&self) -> Option<&DropReason> {
        match self {
            Self::Message(_) => None,
            Self::Dropped(r) => Some(r),
        }
    }

    /// True if the frame was discarded.
    pub fn is_dropped(&self) -> bool { matches!(self, Self::Dropped(_)) }
}
