//! Peer address validation.
//!
//! Cluster members advertise themselves as `host:port` where the host is
//! either `localhost` or a dotted-quad IPv4 address. Anything else is
//! rejected when the routing table is configured, before it can poison
//! the ring.

/// Returns `true` for a well-formed `host:port` peer address.
pub(crate) fn valid_peer_addr(addr: &str) -> bool {
    let Some((host, port)) = addr.rsplit_once(':') else {
        return false;
    };
    if port.is_empty() || port.parse::<u16>().is_err() {
        return false;
    }
    host == "localhost" || host.split('.').count() == 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_localhost_and_dotted_quads() {
        assert!(valid_peer_addr("localhost:9999"));
        assert!(valid_peer_addr("127.0.0.1:8001"));
        assert!(valid_peer_addr("10.0.0.15:50000"));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!valid_peer_addr("localhost"));
        assert!(!valid_peer_addr("localhost:"));
        assert!(!valid_peer_addr("localhost:port"));
        assert!(!valid_peer_addr("localhost:99999"));
        assert!(!valid_peer_addr("example.com:9000"));
        assert!(!valid_peer_addr("10.0.0:9000"));
        assert!(!valid_peer_addr(""));
    }
}
