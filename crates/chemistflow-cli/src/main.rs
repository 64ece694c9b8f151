//! # ChemistFlow Entry Point
//!
//! Parses command-line flags into the application configuration, starts
//! the middle tier, and handles process lifecycle: SIGINT triggers a
//! graceful drain of the HTTP surface and a cluster leave before exit.
//!
//! ## Usage
//!
//! ```bash
//! # Standalone node with default upstreams
//! chemistflow
//!
//! # Explicit upstreams and a two-node cluster
//! chemistflow --http-port 8085 \
//!   --preprocessor-base-uri http://preprocessor:8080/api \
//!   --engine-base-uri http://engine:8081 \
//!   --cluster-port 25520 \
//!   --cluster-seed-node 10.0.0.2:25520
//! ```
//!
//! Exit codes: 0 on clean shutdown, non-zero on bootstrap failure
//! (bad bind address, port in use, cluster listener failure).

use std::time::Duration;

use anyhow::{Context, Result};
use argh::FromArgs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chemistflow_common::config::{
    AppConfig, CacheConfig, ClientConfig, ClusterConfig, HttpConfig, ShutdownConfig,
};
use chemistflow_server::App;

fn default_http_port() -> u16 {
    std::env::var("CHEMISTFLOW_HTTP_PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(8085)
}

/// ChemistFlow - middle tier over the chemistry Preprocessor and the
/// Reaktoro Engine
#[derive(FromArgs)]
struct Cli {
    /// host to bind the HTTP surface to
    #[argh(option, default = "\"127.0.0.1\".into()")]
    http_host: String,

    /// port to bind the HTTP surface to
    ///
    /// Defaults to 8085, or the CHEMISTFLOW_HTTP_PORT environment
    /// variable when set.
    #[argh(option, default = "default_http_port()")]
    http_port: u16,

    /// base URI of the Preprocessor (reactions and mechanisms store)
    #[argh(option, default = "\"http://127.0.0.1:8080/api\".into()")]
    preprocessor_base_uri: String,

    /// base URI of the Engine (thermodynamics solver)
    #[argh(option, default = "\"http://127.0.0.1:8081\".into()")]
    engine_base_uri: String,

    /// connect timeout for upstream requests in milliseconds
    #[argh(option, default = "2000")]
    client_connect_timeout_ms: u64,

    /// total request timeout for upstream requests in milliseconds
    #[argh(option, default = "30000")]
    client_request_timeout_ms: u64,

    /// retry budget for idempotent upstream GETs
    #[argh(option, default = "3")]
    client_retries: u32,

    /// maximum idle connections kept per upstream host
    #[argh(option, default = "10")]
    client_pool_max_connections: usize,

    /// how long an idle pooled connection is kept, in seconds
    #[argh(option, default = "90")]
    client_pool_max_idle_secs: u64,

    /// local cache tier entry lifetime in seconds
    #[argh(option, default = "300")]
    cache_local_ttl_secs: u64,

    /// local cache tier size bound per object kind
    #[argh(option, default = "1000")]
    cache_local_max_entries: usize,

    /// per-peer budget for replicated cache reads in milliseconds
    #[argh(option, default = "3000")]
    cache_read_timeout_ms: u64,

    /// per-peer budget for replicated cache writes in milliseconds
    #[argh(option, default = "3000")]
    cache_write_timeout_ms: u64,

    /// hostname this node advertises to cluster peers
    #[argh(option, default = "\"127.0.0.1\".into()")]
    cluster_hostname: String,

    /// port for the cluster replication listener
    #[argh(option, default = "25520")]
    cluster_port: u16,

    /// cluster seed node to join, as host:port; repeat for several seeds
    #[argh(option, long = "cluster-seed-node")]
    cluster_seed_nodes: Vec<String>,

    /// interval between peer liveness probes in seconds
    #[argh(option, default = "5")]
    cluster_ping_interval_secs: u64,

    /// timeout for one peer liveness probe in milliseconds
    #[argh(option, default = "2000")]
    cluster_ping_timeout_ms: u64,

    /// consecutive probe failures before a peer counts as unreachable
    #[argh(option, default = "3")]
    cluster_failure_threshold: u32,

    /// how long in-flight HTTP requests may drain on shutdown, in seconds
    #[argh(option, default = "5")]
    shutdown_grace_secs: u64,
}

/// Seed nodes must look like host:port.
fn validate_seed_addr(addr: &str) -> Result<()> {
    let (host, port) = addr
        .rsplit_once(':')
        .with_context(|| format!("invalid seed node '{}': expected host:port", addr))?;
    anyhow::ensure!(!host.is_empty(), "invalid seed node '{}': empty host", addr);
    port.parse::<u16>()
        .with_context(|| format!("invalid seed node '{}': bad port", addr))?;
    Ok(())
}

impl Cli {
    fn into_config(self) -> Result<AppConfig> {
        for seed in &self.cluster_seed_nodes {
            validate_seed_addr(seed)?;
        }
        Ok(AppConfig {
            http: HttpConfig {
                host: self.http_host,
                port: self.http_port,
            },
            preprocessor: ClientConfig {
                base_uri: self.preprocessor_base_uri,
                connect_timeout: Duration::from_millis(self.client_connect_timeout_ms),
                request_timeout: Duration::from_millis(self.client_request_timeout_ms),
                retries: self.client_retries,
                pool_max_connections: self.client_pool_max_connections,
                pool_max_idle: Duration::from_secs(self.client_pool_max_idle_secs),
            },
            engine: ClientConfig {
                base_uri: self.engine_base_uri,
                connect_timeout: Duration::from_millis(self.client_connect_timeout_ms),
                request_timeout: Duration::from_millis(self.client_request_timeout_ms),
                retries: self.client_retries,
                pool_max_connections: self.client_pool_max_connections,
                pool_max_idle: Duration::from_secs(self.client_pool_max_idle_secs),
            },
            cache: CacheConfig {
                local_ttl: Duration::from_secs(self.cache_local_ttl_secs),
                local_max_entries: self.cache_local_max_entries,
                read_timeout: Duration::from_millis(self.cache_read_timeout_ms),
                write_timeout: Duration::from_millis(self.cache_write_timeout_ms),
            },
            cluster: ClusterConfig {
                hostname: self.cluster_hostname,
                port: self.cluster_port,
                seed_nodes: self.cluster_seed_nodes,
                ping_interval: Duration::from_secs(self.cluster_ping_interval_secs),
                ping_timeout: Duration::from_millis(self.cluster_ping_timeout_ms),
                failure_threshold: self.cluster_failure_threshold,
            },
            shutdown: ShutdownConfig {
                grace: Duration::from_secs(self.shutdown_grace_secs),
            },
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli: Cli = argh::from_env();
    let config = cli.into_config()?;

    let app = App::bootstrap(config)
        .await
        .context("bootstrap failed")?;
    info!(addr = %app.local_addr().context("no bound address")?, "ChemistFlow started");

    let shutdown = app.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            shutdown.notify_waiters();
        }
    });

    app.run().await.context("server error")?;
    Ok(())
}
