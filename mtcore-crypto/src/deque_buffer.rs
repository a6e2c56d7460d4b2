//! A growable byte buffer with reserved headroom for cheap prepends.
//!
//! Outgoing envelopes are built back to front: the frame is written and
//! encrypted first, then `msg_key` and `key_id` are pushed in front of it.
//! Reserving that headroom up front avoids shifting the ciphertext.

use std::ops::{Index, IndexMut};
use std::slice::SliceIndex;

/// Byte buffer supporting `O(1)` prepends into reserved headroom.
#[derive(Clone, Debug, Default)]
pub struct DequeBuffer {
    buf:  Vec<u8>,
    head: usize,
}

impl DequeBuffer {
    /// Create an empty buffer with `front` bytes of headroom and room for
    /// `back` bytes of content.
    pub fn with_capacity(back: usize, front: usize) -> Self {
        let mut buf = Vec::with_capacity(front + back);
        buf.resize(front, 0);
        Self { buf, head: front }
    }

    /// Prepend `slice`, growing the headroom if it is exhausted.
    pub fn extend_front(&mut self, slice: &[u8]) {
        if self.head < slice.len() {
            let grow = slice.len() - self.head;
            self.buf.splice(0..0, std::iter::repeat_n(0, grow));
            self.head += grow;
        }
        self.head -= slice.len();
        self.buf[self.head..self.head + slice.len()].copy_from_slice(slice);
    }

    /// Append `slice` to the back.
    pub fn extend_from_slice(&mut self, slice: &[u8]) { self.buf.extend_from_slice(slice); }

    /// Number of content bytes.
    pub fn len(&self) -> usize { self.buf.len() - self.head }

    /// True if there is no content.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Consume the buffer, returning only the content bytes.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.buf.drain(..self.head);
        self.buf
    }
}

impl AsRef<[u8]> for DequeBuffer {
    fn as_ref(&self) -> &[u8] { &self.buf[self.head..] }
}
impl AsMut<[u8]> for DequeBuffer {
    fn as_mut(&mut self) -> &mut [u8] { &mut self.buf[self.head..] }
}
impl<I: SliceIndex<[u8]>> Index<I> for DequeBuffer {
    type Output = I::Output;
    fn index(&self, i: I) -> &Self::Output { self.as_ref().index(i) }
}
impl<I: SliceIndex<[u8]>> IndexMut<I> for DequeBuffer {
    fn index_mut(&mut self, i: I) -> &mut Self::Output { self.as_mut().index_mut(i) }
}
impl Extend<u8> for DequeBuffer {
    fn extend<T: IntoIterator<Item = u8>>(&mut self, iter: T) { self.buf.extend(iter); }
}
impl<'a> Extend<&'a u8> for DequeBuffer {
    fn extend<T: IntoIterator<Item = &'a u8>>(&mut self, iter: T) { self.buf.extend(iter); }
}
