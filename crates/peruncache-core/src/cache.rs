//! Concurrency guard around the LRU engine.
//!
//! A single mutex serializes every LRU operation. Lookups take the mutex
//! too: a hit promotes the entry in the recency list, which is a mutation.
//! The LRU itself is created lazily on first insert, so a `get` against a
//! never-written cache reports a miss without allocating.

use parking_lot::Mutex;

use crate::byteview::ByteView;
use crate::lru::LruCache;

pub(crate) struct Cache {
    capacity: u64,
    lru: Mutex<Option<LruCache<ByteView>>>,
}

impl Cache {
    pub(crate) fn new(capacity: u64) -> Self {
        Self {
            capacity,
            lru: Mutex::new(None),
        }
    }

    pub(crate) fn insert(&self, key: &str, view: ByteView) {
        let mut lru = self.lru.lock();
        lru.get_or_insert_with(|| LruCache::new(self.capacity, None))
            .insert(key.to_string(), view);
    }

    pub(crate) fn get(&self, key: &str) -> Option<ByteView> {
        let mut lru = self.lru.lock();
        lru.as_mut()?.get(key).cloned()
    }

    /// Live keys, most-recent first. Test-only visibility into eviction.
    #[cfg(test)]
    pub(crate) fn keys(&self) -> Vec<String> {
        let lru = self.lru.lock();
        lru.as_ref()
            .map(|lru| lru.keys().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
