//! Capability traits for remote peers.
//!
//! The core never talks to the network itself: the transport crate hands
//! it a [`Picker`] (the routing table) which hands out [`Fetcher`]s (one
//! per remote peer). Both are object-safe so the transport can be swapped
//! without touching the read pipeline.

use std::sync::Arc;

use crate::error::Result;

/// A client for one remote peer.
pub trait Fetcher: Send + Sync {
    /// Fetches the value for `key` in `group` from the remote peer.
    fn fetch(&self, group: &str, key: &str) -> Result<Vec<u8>>;
}

/// Selects the peer responsible for a key.
pub trait Picker: Send + Sync {
    /// Returns the fetcher for the peer owning `key`, or `None` when this
    /// node owns the key and should serve it locally.
    fn pick(&self, key: &str) -> Option<Arc<dyn Fetcher>>;

    /// Shuts the attached transport down. Invoked when the owning group is
    /// destroyed; the default does nothing.
    fn stop(&self) {}
}
