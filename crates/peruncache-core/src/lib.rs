//! # `PerunCache` Core
//!
//! The in-process read pipeline of `PerunCache`, a distributed in-memory
//! key–value cache organized into named groups.
//!
//! Every node of a cluster runs the same software: it holds a shard of the
//! keyspace by consistent hash and acts as both client and server to its
//! peers. This crate is the node-local half; the transport lives in
//! `peruncache-server` and plugs in through the [`Picker`]/[`Fetcher`]
//! traits.
//!
//! ## Read flow
//!
//! [`Group::get`] serves a key with three layered strategies:
//!
//! 1. guarded LRU cache lookup;
//! 2. on a miss, remote-peer delegation when the consistent hash says
//!    another node owns the key;
//! 3. origin fetch through the group's [`Retriever`], populating the
//!    local cache.
//!
//! The whole miss path runs under per-key single-flight coalescing, so a
//! thundering herd on one key costs a single fill.
//!
//! ## Quick Start
//!
//! ```rust
//! use peruncache_core::{new_group, Error};
//!
//! let group = new_group("scores", 2 << 10, |key: &str| match key {
//!     "Tom" => Ok(b"630".to_vec()),
//!     _ => Err(Error::retrieval(format!("{key} not exist"))),
//! });
//!
//! let view = group.get("Tom")?;
//! assert_eq!(view.to_string(), "630");
//! # Ok::<(), Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod byteview;
pub mod consistenthash;
pub mod error;
pub mod group;
pub mod lru;
pub mod peers;
pub mod singleflight;

mod cache;

pub use byteview::ByteView;
pub use consistenthash::{HashFn, HashRing};
pub use error::{Error, Result};
pub use group::{destroy_group, get_group, new_group, Group, Retriever};
pub use lru::{EvictionCallback, LruCache, ResidentSize};
pub use peers::{Fetcher, Picker};
pub use singleflight::Flight;
