//! Immutable byte-sequence values.
//!
//! Cache values live inside the LRU recency list and are handed out to
//! arbitrary callers, so they must not be mutable through aliasing. A
//! [`ByteView`] owns its buffer via [`bytes::Bytes`]: construction copies
//! (or takes ownership of) the input, clones share the refcounted buffer,
//! and any accessor that exposes raw bytes returns a defensive copy.

use bytes::Bytes;

use crate::lru::ResidentSize;

/// An immutable view over a cached byte sequence.
///
/// Cloning is cheap and never exposes shared mutable state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteView {
    buf: Bytes,
}

impl ByteView {
    /// Wraps an owned buffer. The `Vec` is moved, so no caller alias to
    /// the stored bytes can remain.
    #[must_use]
    pub fn new(buf: Vec<u8>) -> Self {
        Self { buf: Bytes::from(buf) }
    }

    /// Copies a borrowed slice into a new view.
    #[must_use]
    pub fn copy_from(buf: &[u8]) -> Self {
        Self { buf: Bytes::copy_from_slice(buf) }
    }

    /// Number of bytes in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` when the view holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns a defensive copy of the underlying bytes.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

impl std::fmt::Display for ByteView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.buf))
    }
}

impl From<&str> for ByteView {
    fn from(s: &str) -> Self {
        Self::copy_from(s.as_bytes())
    }
}

impl ResidentSize for ByteView {
    fn resident_size(&self) -> usize {
        self.len()
    }
}
