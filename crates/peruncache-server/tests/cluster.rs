//! End-to-end test: a live node answering peer fetches over loopback HTTP.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use peruncache_core::{destroy_group, new_group, Error, Fetcher};
use peruncache_server::{CacheServer, HttpFetcher};

/// Picks a currently-free loopback port. The listener is dropped before
/// the server binds, like the original test harness's random-port dance.
fn free_local_port() -> u16 {
    TcpListener::bind(("127.0.0.1", 0))
        .expect("bind probe socket")
        .local_addr()
        .expect("probe addr")
        .port()
}

/// Retries a blocking fetch until the freshly-spawned server answers.
fn fetch_with_retry(fetcher: &HttpFetcher, group: &str, key: &str) -> Result<Vec<u8>, Error> {
    for _ in 0..50 {
        match fetcher.fetch(group, key) {
            Err(Error::PeerFetch(_)) => std::thread::sleep(Duration::from_millis(50)),
            other => return other,
        }
    }
    fetcher.fetch(group, key)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn single_node_cluster_serves_peer_and_local_reads() {
    let addr = format!("localhost:{}", free_local_port());

    let group = new_group("cluster-scores", 2 << 10, |key: &str| match key {
        "Tom" => Ok(b"630".to_vec()),
        _ => Err(Error::retrieval(format!("{key} not exist"))),
    });
    let server = CacheServer::new(&addr).expect("valid address");
    server.set_peers([addr.as_str()]).expect("own address is valid");
    group.register_router(server.clone());

    let serving = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.start().await })
    };

    // A remote peer's view of this node: raw bytes over HTTP.
    let peer_bytes = {
        let fetcher = HttpFetcher::new(&addr);
        tokio::task::spawn_blocking(move || fetch_with_retry(&fetcher, "cluster-scores", "Tom"))
            .await
            .expect("fetch task")
            .expect("peer fetch succeeds")
    };
    assert_eq!(peer_bytes, b"630".to_vec());

    // This node's own view: the single-node ring routes every key back
    // here, so the read is served locally.
    let view = {
        let group = Arc::clone(&group);
        tokio::task::spawn_blocking(move || group.get("Tom"))
            .await
            .expect("get task")
            .expect("local get succeeds")
    };
    assert_eq!(view.to_string(), "630");

    // An origin miss comes back to the peer as an error status.
    let err = {
        let fetcher = HttpFetcher::new(&addr);
        tokio::task::spawn_blocking(move || fetcher.fetch("cluster-scores", "Nobody"))
            .await
            .expect("fetch task")
            .expect_err("origin miss fails")
    };
    assert!(matches!(err, Error::PeerFetch(_)));

    // Destroying the group stops the attached server; the serving task
    // drains and exits.
    destroy_group("cluster-scores");
    tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("server stops after destroy_group")
        .expect("serving task joins")
        .expect("server exits cleanly");
}
