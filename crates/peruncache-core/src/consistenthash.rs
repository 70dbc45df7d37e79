//! Consistent-hash ring mapping keys to peer identities.
//!
//! Each peer occupies `replicas` virtual-node positions on a ring of
//! 32-bit hash values, which smooths the key distribution across a small
//! cluster. A key belongs to the peer owning the first position at or
//! after the key's own hash, wrapping at the top of the ring.
//!
//! The default hash is CRC32-IEEE ([`crc32fast`]); any replacement must be
//! deterministic across every node of a cluster, or peers will disagree on
//! key ownership.

use std::collections::HashMap;

/// Hash function over raw bytes, yielding a ring position.
pub type HashFn = fn(&[u8]) -> u32;

/// Consistent-hash ring over named peers with virtual nodes.
///
/// Built once by [`HashRing::register`]; lookups are read-only, so the
/// router can share a ring snapshot under a short-lived lock.
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Virtual-node positions, sorted ascending after `register`.
    ring: Vec<u32>,
    /// Position -> peer name. On a position collision between two peers,
    /// the later registration wins.
    mapping: HashMap<u32, String>,
}

impl HashRing {
    /// Creates an empty ring with `replicas` virtual nodes per peer and an
    /// optional hash override (defaults to CRC32-IEEE).
    #[must_use]
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        Self {
            hash: hash.unwrap_or(crc32fast::hash),
            replicas,
            ring: Vec::new(),
            mapping: HashMap::new(),
        }
    }

    /// Places every peer's virtual nodes on the ring.
    ///
    /// Virtual node `i` of peer `p` sits at `hash("{i}{p}")`. Positions are
    /// re-sorted after the batch, so the ring is immediately searchable.
    pub fn register<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for peer in peers {
            let peer = peer.into();
            for i in 0..self.replicas {
                let position = (self.hash)(format!("{i}{peer}").as_bytes());
                self.ring.push(position);
                self.mapping.insert(position, peer.clone());
            }
        }
        self.ring.sort_unstable();
    }

    /// Returns the peer owning `key`, or `None` on an empty ring.
    #[must_use]
    pub fn get_peer(&self, key: &str) -> Option<&str> {
        if self.ring.is_empty() {
            return None;
        }
        let position = (self.hash)(key.as_bytes());
        let idx = match self.ring.binary_search(&position) {
            Ok(idx) => idx,
            Err(idx) if idx == self.ring.len() => 0,
            Err(idx) => idx,
        };
        self.mapping.get(&self.ring[idx]).map(String::as_str)
    }

    /// Returns `true` when no peer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Number of virtual nodes on the ring.
    #[must_use]
    pub fn virtual_nodes(&self) -> usize {
        self.ring.len()
    }

    /// Number of distinct ring positions. Strictly less than
    /// [`Self::virtual_nodes`] exactly when two virtual nodes collide.
    #[must_use]
    pub fn distinct_positions(&self) -> usize {
        self.mapping.len()
    }
}

impl std::fmt::Debug for HashRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("virtual_nodes", &self.ring.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Decimal-parsing hash makes ring positions explicit in tests.
    fn decimal_hash(data: &[u8]) -> u32 {
        std::str::from_utf8(data)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    #[test]
    fn register_places_replicas_for_every_peer() {
        let mut ring = HashRing::new(2, None);
        ring.register(["peer1", "peer2"]);
        assert_eq!(ring.virtual_nodes(), 4);
        let expected = crc32fast::hash(b"1peer1");
        assert!(ring.ring.binary_search(&expected).is_ok());
        assert_eq!(ring.mapping[&expected], "peer1");
    }

    #[test]
    fn keys_map_to_successor_position() {
        // Virtual nodes land on 2, 4 and 6 with the decimal hash.
        let mut ring = HashRing::new(1, Some(decimal_hash));
        ring.register(["2", "4", "6"]);

        assert_eq!(ring.get_peer("2"), Some("2"));
        assert_eq!(ring.get_peer("3"), Some("4"));
        assert_eq!(ring.get_peer("5"), Some("6"));
        // Past the top of the ring, ownership wraps to the first position.
        assert_eq!(ring.get_peer("7"), Some("2"));
    }

    #[test]
    fn empty_ring_has_no_owner() {
        let ring = HashRing::new(50, None);
        assert!(ring.is_empty());
        assert_eq!(ring.get_peer("Tom"), None);
    }

    #[test]
    fn lookups_are_stable_and_ring_independent() {
        let peers = ["peer-a:8001", "peer-b:8002", "peer-c:8003"];
        let mut first = HashRing::new(50, None);
        first.register(peers);
        let mut second = HashRing::new(50, None);
        second.register(peers);

        for key in ["Tom", "Jack", "Sam", "", "\u{1f980}", "a/b/c"] {
            let owner = first.get_peer(key);
            assert_eq!(owner, first.get_peer(key));
            assert_eq!(owner, second.get_peer(key));
        }
    }

    #[test]
    fn crc32_replicas_do_not_collide_for_realistic_peer_sets() {
        // Position collisions silently hand the slot to the last
        // registration; make sure the default hash keeps them out of
        // plausible cluster configurations.
        let mut ring = HashRing::new(50, None);
        ring.register((1..=16).map(|i| format!("10.0.0.{i}:{}", 8000 + i)));
        assert_eq!(ring.virtual_nodes(), 16 * 50);
        assert_eq!(ring.distinct_positions(), 16 * 50);
    }

    proptest! {
        /// Ownership depends on the peer set, never on registration order.
        #[test]
        fn ownership_ignores_registration_order(
            mut peer_ids in prop::collection::hash_set(0u16..64, 1..8),
            keys in prop::collection::vec(".{0,12}", 1..16),
        ) {
            let peers: Vec<String> =
                peer_ids.drain().map(|id| format!("peer-{id}:9000")).collect();
            let mut reversed = peers.clone();
            reversed.reverse();

            let mut forward = HashRing::new(50, None);
            forward.register(peers);
            let mut backward = HashRing::new(50, None);
            backward.register(reversed);

            for key in &keys {
                prop_assert_eq!(forward.get_peer(key), backward.get_peer(key));
            }
        }
    }
}
