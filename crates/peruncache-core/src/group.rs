//! Named cache namespaces and the read pipeline that fills them.
//!
//! A [`Group`] composes the guarded LRU cache, the single-flight
//! coordinator and (optionally) a peer router in front of a caller-supplied
//! origin [`Retriever`]. Reads follow three layers: local cache hit, then
//! remote-peer delegation by consistent hash, then origin fetch. The whole
//! miss path is coalesced per key, so a thundering herd costs one fill.
//!
//! Groups register themselves in a process-wide table, which is what the
//! server-side RPC handler uses to resolve incoming `(group, key)` pairs.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;

use crate::byteview::ByteView;
use crate::cache::Cache;
use crate::error::{Error, Result};
use crate::peers::Picker;
use crate::singleflight::Flight;

/// Fetches a value from the ground truth (a database, a file, an upstream
/// service) when the cache and the peers cannot serve it.
pub trait Retriever: Send + Sync {
    /// Retrieves the origin value for `key`.
    fn retrieve(&self, key: &str) -> Result<Vec<u8>>;
}

/// Any `Fn(&str) -> Result<Vec<u8>>` closure is a retriever.
impl<F> Retriever for F
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    fn retrieve(&self, key: &str) -> Result<Vec<u8>> {
        self(key)
    }
}

/// Process-wide table of live groups, keyed by name.
static GROUPS: Lazy<RwLock<HashMap<String, Arc<Group>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// A named cache namespace paired with an origin retriever.
pub struct Group {
    name: String,
    cache: Cache,
    retriever: Box<dyn Retriever>,
    router: OnceCell<Arc<dyn Picker>>,
    flight: Flight<ByteView>,
}

/// Creates a group and registers it in the process-wide table.
///
/// `max_bytes` bounds the group's cache footprint; `0` means unbounded.
/// Registering a name that already exists replaces the previous group.
pub fn new_group<R>(name: &str, max_bytes: u64, retriever: R) -> Arc<Group>
where
    R: Retriever + 'static,
{
    let group = Arc::new(Group {
        name: name.to_string(),
        cache: Cache::new(max_bytes),
        retriever: Box::new(retriever),
        router: OnceCell::new(),
        flight: Flight::new(),
    });
    GROUPS.write().insert(name.to_string(), Arc::clone(&group));
    tracing::info!("group '{}' registered (max_bytes = {})", name, max_bytes);
    group
}

/// Looks up a group by name.
#[must_use]
pub fn get_group(name: &str) -> Option<Arc<Group>> {
    GROUPS.read().get(name).cloned()
}

/// Removes a group from the table, stopping its attached server if one was
/// registered. No-op for unknown names.
pub fn destroy_group(name: &str) {
    let removed = GROUPS.write().remove(name);
    if let Some(group) = removed {
        if let Some(router) = group.router.get() {
            router.stop();
        }
        tracing::info!("group '{}' destroyed", name);
    }
}

impl Group {
    /// The group's registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attaches the peer router serving this node.
    ///
    /// # Panics
    ///
    /// Panics if a router was already registered; wiring the transport
    /// twice is a configuration bug.
    pub fn register_router(&self, router: Arc<dyn Picker>) {
        assert!(
            self.router.set(router).is_ok(),
            "group '{}': router already registered",
            self.name
        );
    }

    /// Serves a read: local cache, then the owning peer, then the origin.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyKey`] for an empty key; otherwise the origin's error,
    /// propagated verbatim. Peer failures are not surfaced; they are
    /// logged and the read falls back to the local origin.
    pub fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        if let Some(view) = self.cache.get(key) {
            tracing::debug!("cache hit for '{}' in group '{}'", key, self.name);
            return Ok(view);
        }
        self.flight.fly(key, || self.load(key))
    }

    /// Miss path, executed at most once per key at a time.
    fn load(&self, key: &str) -> Result<ByteView> {
        if let Some(router) = self.router.get() {
            if let Some(fetcher) = router.pick(key) {
                match fetcher.fetch(&self.name, key) {
                    // The owning peer is the cache of record for this key;
                    // its value is returned without re-caching it here.
                    Ok(bytes) => return Ok(ByteView::new(bytes)),
                    Err(err) => tracing::warn!(
                        "peer fetch for '{}' in group '{}' failed, falling back to origin: {}",
                        key,
                        self.name,
                        err
                    ),
                }
            }
        }
        self.retrieve_locally(key)
    }

    fn retrieve_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = self.retriever.retrieve(key)?;
        let view = ByteView::new(bytes);
        self.cache.insert(key, view.clone());
        Ok(view)
    }

    /// Live cache keys, most-recent first. Test-only visibility.
    #[cfg(test)]
    pub(crate) fn cached_keys(&self) -> Vec<String> {
        self.cache.keys()
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
