//! Service-discovery seam.
//!
//! Deployments learn the peer set from an external registry; the routing
//! table only ever consumes "the complete current set of addresses". This
//! module keeps that seam explicit so a registry-backed implementation can
//! replace the static one without touching the server.

use peruncache_core::Result;

/// Source of the cluster's peer addresses.
pub trait ServiceDiscovery: Send + Sync {
    /// Returns every known peer address, this node's own included.
    fn endpoints(&self) -> Result<Vec<String>>;
}

/// Fixed peer set, taken from configuration at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    endpoints: Vec<String>,
}

impl StaticDiscovery {
    /// Creates a discovery source over a fixed address list.
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
        }
    }
}

impl ServiceDiscovery for StaticDiscovery {
    fn endpoints(&self) -> Result<Vec<String>> {
        Ok(self.endpoints.clone())
    }
}
