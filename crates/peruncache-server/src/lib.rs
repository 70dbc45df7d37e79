//! `PerunCache` Server - HTTP peer transport for the `PerunCache`
//! distributed cache.
//!
//! This crate is the network half of a cluster node: the axum server that
//! answers peer reads, the blocking HTTP client used to fetch from remote
//! peers, the routing table that decides which peer owns a key, and the
//! configuration/discovery plumbing that wires a node together. The cache
//! semantics live in `peruncache-core`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod addr;
pub mod client;
pub mod config;
pub mod discovery;
pub mod handlers;
pub mod server;
pub mod types;

pub use client::HttpFetcher;
pub use config::{ConfigError, PerunConfig};
pub use discovery::{ServiceDiscovery, StaticDiscovery};
pub use server::{CacheServer, BASE_PATH, DEFAULT_REPLICAS};
pub use types::ErrorResponse;
