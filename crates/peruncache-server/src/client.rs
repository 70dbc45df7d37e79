//! HTTP client for fetching values from remote peers.

use std::time::Duration;

use once_cell::sync::Lazy;

use peruncache_core::{Error, Fetcher, Result};

use crate::server::BASE_PATH;

/// One shared blocking client for every peer.
///
/// Built lazily: the first fetch always happens on a blocking thread, and
/// `reqwest`'s blocking transport must not be driven from an async worker.
/// The core imposes no deadlines of its own, so the transport carries the
/// remote-fetch timeouts.
static HTTP: Lazy<reqwest::blocking::Client> = Lazy::new(|| {
    reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_secs(3))
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to build peer HTTP client")
});

/// Fetches `(group, key)` values from one remote peer over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    addr: String,
    base_url: String,
}

impl HttpFetcher {
    /// Creates a fetcher for the peer at `addr` (`host:port`).
    #[must_use]
    pub fn new(addr: &str) -> Self {
        Self {
            addr: addr.to_string(),
            base_url: format!("http://{addr}{BASE_PATH}"),
        }
    }

    /// The peer address this fetcher talks to.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, group: &str, key: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}{}/{}",
            self.base_url,
            urlencoding::encode(group),
            urlencoding::encode(key)
        );

        let response = HTTP
            .get(&url)
            .send()
            .map_err(|err| Error::peer_fetch(format!("request to {} failed: {err}", self.addr)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::peer_fetch(format!(
                "peer {} returned status {status}",
                self.addr
            )));
        }

        let body = response.bytes().map_err(|err| {
            Error::peer_fetch(format!("reading response from {} failed: {err}", self.addr))
        })?;
        Ok(body.to_vec())
    }
}
