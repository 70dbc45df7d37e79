//! Byte-bounded LRU eviction engine.
//!
//! The cache tracks its footprint in bytes, not entries: every entry costs
//! `key.len() + value.resident_size()`, and inserts evict least-recent
//! entries until the new entry fits. The engine itself is not thread-safe;
//! serialization is the guarded cache's job.
//!
//! Entries live in an arena of nodes (`Vec` slots plus a free list) linked
//! into a doubly linked recency list, with a `HashMap` from key to slot
//! index. No `unsafe`, and all operations are `O(1)`.

use std::collections::HashMap;

/// Byte footprint of a cached value.
///
/// The engine depends on this value staying stable while the entry is
/// resident; mutate-through-aliasing is ruled out by storing immutable
/// values such as [`crate::ByteView`].
pub trait ResidentSize {
    /// Resident size of the value in bytes.
    fn resident_size(&self) -> usize;
}

/// Callback invoked with the key and value of every evicted entry.
pub type EvictionCallback<V> = Box<dyn FnMut(&str, &V) + Send>;

struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// A byte-bounded LRU cache over string keys.
///
/// `capacity == 0` disables eviction entirely (unbounded). An oversize
/// insert under a nonzero capacity evicts everything and still lands:
/// the most recent insert always wins a slot.
pub struct LruCache<V> {
    capacity: u64,
    used: u64,
    index: HashMap<String, usize>,
    slots: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    /// Most-recent end of the recency list.
    head: Option<usize>,
    /// Least-recent end of the recency list.
    tail: Option<usize>,
    on_evict: Option<EvictionCallback<V>>,
}

impl<V: ResidentSize> LruCache<V> {
    /// Creates a cache bounded to `capacity` bytes (`0` = unbounded), with
    /// an optional eviction callback.
    #[must_use]
    pub fn new(capacity: u64, on_evict: Option<EvictionCallback<V>>) -> Self {
        Self {
            capacity,
            used: 0,
            index: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            on_evict,
        }
    }

    /// Looks up `key`, promoting the entry to most-recent on a hit.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.detach(idx);
        self.push_front(idx);
        self.slots[idx].as_ref().map(|node| &node.value)
    }

    /// Inserts or overwrites `key`, evicting least-recent entries until the
    /// entry fits within the capacity.
    pub fn insert(&mut self, key: String, value: V) {
        let kv_size = key.len() as u64 + value.resident_size() as u64;
        while self.capacity != 0 && self.used + kv_size > self.capacity && !self.index.is_empty() {
            self.remove_oldest();
        }
        if let Some(&idx) = self.index.get(&key) {
            self.detach(idx);
            self.push_front(idx);
            let node = self.node_mut(idx);
            let old_size = node.value.resident_size() as u64;
            let new_size = value.resident_size() as u64;
            node.value = value;
            self.used = self.used - old_size + new_size;
        } else {
            let idx = self.alloc(Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.push_front(idx);
            self.index.insert(key, idx);
            self.used += kv_size;
        }
    }

    /// Evicts the least-recent entry, firing the eviction callback.
    /// No-op when the cache is empty.
    pub fn remove_oldest(&mut self) {
        let Some(idx) = self.tail else { return };
        self.detach(idx);
        let node = self.slots[idx]
            .take()
            .expect("lru: vacant slot at recency tail");
        self.free.push(idx);
        self.index.remove(&node.key);
        self.used -= node.key.len() as u64 + node.value.resident_size() as u64;
        if let Some(callback) = self.on_evict.as_mut() {
            callback(&node.key, &node.value);
        }
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` when no entry is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Current footprint in bytes.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.used
    }

    /// Configured capacity in bytes (`0` = unbounded).
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns `true` when `key` is resident, without promoting it.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Iterates live keys from most- to least-recent.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::successors(self.head, |&idx| self.node(idx).next)
            .map(|idx| self.node(idx).key.as_str())
    }

    fn node(&self, idx: usize) -> &Node<V> {
        self.slots[idx]
            .as_ref()
            .expect("lru: recency list references a vacant slot")
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<V> {
        self.slots[idx]
            .as_mut()
            .expect("lru: recency list references a vacant slot")
    }

    fn alloc(&mut self, node: Node<V>) -> usize {
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(node);
            idx
        } else {
            self.slots.push(Some(node));
            self.slots.len() - 1
        }
    }

    /// Unlinks `idx` from the recency list, leaving its slot occupied.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node(idx);
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
        let node = self.node_mut(idx);
        node.prev = None;
        node.next = None;
    }

    /// Links `idx` at the most-recent end.
    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            self.node_mut(h).prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}
