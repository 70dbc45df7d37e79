//! Error types for `PerunCache`.
//!
//! Errors are carried as values and travel through the single-flight
//! coordinator, so the whole enum is `Clone`: every waiter on a flight
//! receives the pilot's error verbatim.

use thiserror::Error;

/// Result type alias for `PerunCache` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving a cache read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `Group::get` was called with an empty key.
    #[error("key required")]
    EmptyKey,

    /// No group is registered under the requested name.
    #[error("group '{0}' not found")]
    GroupNotFound(String),

    /// The origin retriever failed for this key.
    ///
    /// The message is the origin's own and is surfaced verbatim.
    #[error("{0}")]
    Retrieval(String),

    /// A remote peer failed to serve the key.
    ///
    /// Never surfaced to `Group::get` callers directly: the coordinator
    /// logs it and falls back to the local origin.
    #[error("peer fetch failed: {0}")]
    PeerFetch(String),

    /// A peer address does not match the `host:port` format.
    #[error("invalid peer address '{0}'")]
    InvalidPeerAddr(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal invariant violation (flight aborted, routing desync).
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Builds a [`Error::Retrieval`] from an origin failure message.
    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval(msg.into())
    }

    /// Builds a [`Error::PeerFetch`] from a transport failure message.
    pub fn peer_fetch(msg: impl Into<String>) -> Self {
        Self::PeerFetch(msg.into())
    }

    /// Builds a [`Error::Internal`].
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
