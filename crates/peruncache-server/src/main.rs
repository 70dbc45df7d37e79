//! `PerunCache` node binary.
//!
//! Runs one cluster node: it serves a named group whose origin is a flat
//! JSON map loaded from disk, joins the peer ring, and answers peer reads
//! over HTTP until interrupted.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use peruncache_core::{destroy_group, new_group, Error};
use peruncache_server::{CacheServer, PerunConfig, ServiceDiscovery, StaticDiscovery};

/// PerunCache node - distributed in-memory key-value cache
#[derive(Parser, Debug)]
#[command(name = "peruncache-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "peruncache.toml", env = "PERUNCACHE_CONFIG")]
    config: PathBuf,

    /// Address this node binds and advertises to peers (host:port)
    #[arg(short, long, env = "PERUNCACHE_ADDR")]
    addr: Option<String>,

    /// Comma-separated peer addresses forming the cluster
    #[arg(short, long, env = "PERUNCACHE_PEERS", value_delimiter = ',')]
    peers: Vec<String>,

    /// Group name served by this node
    #[arg(short, long, default_value = "scores")]
    group: String,

    /// JSON file holding the origin data (a flat string-to-string map)
    #[arg(short, long)]
    source: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = PerunConfig::load_from_path(&args.config)?;
    if let Some(addr) = args.addr {
        config.node.addr = addr;
    }
    if !args.peers.is_empty() {
        config.cluster.peers = args.peers;
    }
    config.validate()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("{},tower_http=debug", config.logging.level)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting PerunCache node on {}", config.node.addr);

    let origin = load_origin(args.source.as_deref())?;
    let group = new_group(&args.group, config.cache.max_bytes, move |key: &str| {
        origin
            .get(key)
            .map(|value| value.clone().into_bytes())
            .ok_or_else(|| Error::retrieval(format!("{key} not exist")))
    });

    let server = CacheServer::new(&config.node.addr)?;

    let discovery = StaticDiscovery::new(config.cluster.peers.clone());
    let mut peers = discovery.endpoints()?;
    if peers.is_empty() {
        // Single-node cluster: the ring still needs this node on it.
        peers.push(config.node.addr.clone());
    }
    server.set_peers(&peers)?;
    group.register_router(server.clone());

    {
        let server = Arc::clone(&server);
        let group_name = args.group.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                destroy_group(&group_name);
                server.stop();
            }
        });
    }

    server.start().await
}

/// Loads the origin map from a JSON file; no file means an empty origin
/// that misses on every key.
fn load_origin(path: Option<&std::path::Path>) -> anyhow::Result<HashMap<String, String>> {
    let Some(path) = path else {
        tracing::warn!("no --source file given; every origin lookup will miss");
        return Ok(HashMap::new());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading source file {}", path.display()))?;
    let origin: HashMap<String, String> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing source file {}", path.display()))?;
    tracing::info!("origin loaded: {} key(s) from {}", origin.len(), path.display());
    Ok(origin)
}
