//! The peer-facing HTTP server and the routing table it serves from.
//!
//! A [`CacheServer`] plays both roles a cluster node needs: it answers
//! `GET /_peruncache/{group}/{key}` for remote peers, and it implements
//! the core's [`Picker`] trait so the group coordinator can route keys to
//! whichever peer the consistent-hash ring says owns them. Picking this
//! node's own address means "serve locally".

use std::collections::HashMap;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use peruncache_core::{Error, Fetcher, HashRing, Picker, Result};

use crate::addr::valid_peer_addr;
use crate::client::HttpFetcher;
use crate::handlers;

/// Virtual nodes per peer on the consistent-hash ring.
pub const DEFAULT_REPLICAS: usize = 50;

/// URL prefix of the peer RPC surface.
pub const BASE_PATH: &str = "/_peruncache/";

/// Ring plus one fetcher per peer, rebuilt wholesale by `set_peers`.
struct RouteTable {
    ring: HashRing,
    fetchers: HashMap<String, Arc<HttpFetcher>>,
}

/// A cluster node's server half: HTTP listener plus peer router.
pub struct CacheServer {
    addr: String,
    routes: Mutex<RouteTable>,
    shutdown: watch::Sender<bool>,
}

impl CacheServer {
    /// Creates a server that will advertise and bind `addr` (`host:port`).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPeerAddr`] when the address is malformed.
    pub fn new(addr: &str) -> Result<Arc<Self>> {
        if !valid_peer_addr(addr) {
            return Err(Error::InvalidPeerAddr(addr.to_string()));
        }
        let (shutdown, _) = watch::channel(false);
        Ok(Arc::new(Self {
            addr: addr.to_string(),
            routes: Mutex::new(RouteTable {
                ring: HashRing::new(DEFAULT_REPLICAS, None),
                fetchers: HashMap::new(),
            }),
            shutdown,
        }))
    }

    /// The address this node advertises to its peers.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Replaces the routing table with a fresh ring and fetcher set.
    ///
    /// This is an overwrite, not a merge: service discovery hands over the
    /// complete current peer set (this node included) on every change.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPeerAddr`] when any address is malformed; the
    /// existing table is left untouched.
    pub fn set_peers<I, S>(&self, peers: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let peers: Vec<String> = peers.into_iter().map(|p| p.as_ref().to_string()).collect();
        for addr in &peers {
            if !valid_peer_addr(addr) {
                return Err(Error::InvalidPeerAddr(addr.clone()));
            }
        }

        let mut ring = HashRing::new(DEFAULT_REPLICAS, None);
        ring.register(peers.iter().cloned());
        let fetchers = peers
            .iter()
            .map(|addr| (addr.clone(), Arc::new(HttpFetcher::new(addr))))
            .collect();

        *self.routes.lock() = RouteTable { ring, fetchers };
        tracing::info!("routing table rebuilt with {} peer(s)", peers.len());
        Ok(())
    }

    /// Builds the axum router for the peer RPC surface.
    ///
    /// Exposed separately from [`CacheServer::start`] so tests can drive
    /// the handlers in-process.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/_peruncache/{group}/{key}", get(handlers::get_value))
            .layer(TraceLayer::new_for_http())
    }

    /// Binds the node address and serves peers until [`CacheServer::stop`].
    ///
    /// # Errors
    ///
    /// Propagates bind and accept failures.
    pub async fn start(&self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        tracing::info!("peer server listening on http://{}", self.addr);

        let mut shutdown = self.shutdown.subscribe();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stopped| *stopped).await;
            })
            .await?;

        tracing::info!("peer server on {} stopped", self.addr);
        Ok(())
    }

    /// Signals the serving loop to drain and exit.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Picker for CacheServer {
    fn pick(&self, key: &str) -> Option<Arc<dyn Fetcher>> {
        let routes = self.routes.lock();
        let owner = routes.ring.get_peer(key)?;
        if owner == self.addr {
            return None;
        }
        tracing::debug!("key '{}' is owned by peer {}", key, owner);
        match routes.fetchers.get(owner) {
            Some(fetcher) => Some(Arc::clone(fetcher) as Arc<dyn Fetcher>),
            None => {
                // The ring and the fetcher map are rebuilt together, so a
                // miss here means the table is corrupt. Serving locally is
                // still correct, just not optimal.
                tracing::warn!("no fetcher for ring peer '{}', serving locally", owner);
                None
            }
        }
    }

    fn stop(&self) {
        CacheServer::stop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_malformed_addresses() {
        assert!(matches!(
            CacheServer::new("example.com:9000"),
            Err(Error::InvalidPeerAddr(_))
        ));
        assert!(matches!(
            CacheServer::new("localhost"),
            Err(Error::InvalidPeerAddr(_))
        ));
        assert!(CacheServer::new("localhost:9000").is_ok());
    }

    #[test]
    fn set_peers_rejects_malformed_addresses_atomically() {
        let server = CacheServer::new("localhost:9001").unwrap();
        server.set_peers(["localhost:9001", "localhost:9002"]).unwrap();

        let err = server
            .set_peers(["localhost:9001", "not-an-address"])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPeerAddr(_)));
        // The previous table survives a rejected update.
        assert_eq!(server.routes.lock().fetchers.len(), 2);
    }

    #[test]
    fn own_address_means_serve_locally() {
        let server = CacheServer::new("localhost:9003").unwrap();
        assert_eq!(server.addr(), "localhost:9003");
        server.set_peers(["localhost:9003"]).unwrap();
        // Single-node ring: every key maps back to this node.
        for key in ["Tom", "Jack", "Sam"] {
            assert!(server.pick(key).is_none());
        }
    }

    #[test]
    fn keys_split_between_local_and_remote_peers() {
        let server = CacheServer::new("localhost:9004").unwrap();
        server
            .set_peers(["localhost:9004", "localhost:9005", "localhost:9006"])
            .unwrap();

        let remote = (0..100)
            .filter(|i| server.pick(&format!("key-{i}")).is_some())
            .count();
        // CRC32 over 3 peers x 50 replicas spreads 100 keys across the
        // cluster: some stay local, at least one lands remotely.
        assert!(remote > 0);
        assert!(remote < 100);
    }

    #[test]
    fn empty_routing_table_serves_locally() {
        let server = CacheServer::new("localhost:9007").unwrap();
        assert!(server.pick("Tom").is_none());
    }
}
