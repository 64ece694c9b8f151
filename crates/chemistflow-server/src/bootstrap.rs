//! Bootstrap wiring: clients, cluster node, caches, services, server.
//!
//! Everything process-wide (the upstream HTTP clients, the replica
//! store, cluster membership) is constructed once here and threaded
//! through constructors explicitly.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::info;

use chemistflow_cache::cluster::ReplicatedCacheConfig;
use chemistflow_cache::{CacheKind, ClusterHandle, LocalCacheConfig, TwoTierCache};
use chemistflow_client::{build_http_client, EngineClient, PreprocessorClient};
use chemistflow_common::config::AppConfig;
use chemistflow_common::error::ClusterError;

use crate::http_router::AppState;
use crate::http_server::HttpServer;
use crate::services::{MechanismService, ReactionService, ReaktoroService};

/// A bootstrap failure; all of these are fatal and exit non-zero.
#[derive(thiserror::Error, Debug)]
pub enum BootstrapError {
    #[error("invalid HTTP bind address '{0}'")]
    InvalidBindAddr(String),

    #[error("failed to bind HTTP server: {0}")]
    HttpBind(std::io::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),

    #[error("failed to start cluster node: {0}")]
    Cluster(ClusterError),
}

/// A fully wired application, bound but not yet serving.
pub struct App {
    server: HttpServer,
    cluster: ClusterHandle,
    sweeper: tokio::task::JoinHandle<()>,
    shutdown: Arc<Notify>,
    grace: Duration,
    leave_timeout: Duration,
}

impl App {
    /// Builds clients, joins the cluster, wires caches and services, and
    /// binds the HTTP surface.
    pub async fn bootstrap(config: AppConfig) -> Result<Self, BootstrapError> {
        let preprocessor_http =
            build_http_client(&config.preprocessor).map_err(BootstrapError::HttpClient)?;
        let engine_http = build_http_client(&config.engine).map_err(BootstrapError::HttpClient)?;
        let preprocessor = Arc::new(PreprocessorClient::new(
            preprocessor_http,
            &config.preprocessor,
        ));
        let engine = Arc::new(EngineClient::new(engine_http, &config.engine));

        let cluster = ClusterHandle::start(&config.cluster)
            .await
            .map_err(BootstrapError::Cluster)?;
        let replicated = cluster.replicated_cache(ReplicatedCacheConfig::from(&config.cache));

        let local_config = LocalCacheConfig {
            ttl: config.cache.local_ttl,
            max_entries: config.cache.local_max_entries,
        };
        let reactions = Arc::new(ReactionService::new(
            Arc::clone(&preprocessor),
            TwoTierCache::new(
                CacheKind::ReactionDetails,
                local_config.clone(),
                Arc::clone(&replicated),
            ),
            TwoTierCache::new(
                CacheKind::Reaction,
                local_config.clone(),
                Arc::clone(&replicated),
            ),
        ));
        let mechanisms = Arc::new(MechanismService::new(
            Arc::clone(&preprocessor),
            TwoTierCache::new(
                CacheKind::MechanismDetails,
                local_config.clone(),
                Arc::clone(&replicated),
            ),
            TwoTierCache::new(CacheKind::Mechanism, local_config, Arc::clone(&replicated)),
        ));
        let reaktoro = Arc::new(ReaktoroService::new(Arc::clone(&reactions), engine));

        let sweeper = spawn_expiry_sweeper(
            Arc::clone(&reactions),
            Arc::clone(&mechanisms),
            config.cache.local_ttl,
        );

        let state = AppState {
            reactions,
            mechanisms,
            reaktoro,
        };

        let bind: SocketAddr = format!("{}:{}", config.http.host, config.http.port)
            .parse()
            .map_err(|_| {
                BootstrapError::InvalidBindAddr(format!(
                    "{}:{}",
                    config.http.host, config.http.port
                ))
            })?;
        let server = HttpServer::bind(bind, state)
            .await
            .map_err(BootstrapError::HttpBind)?;

        Ok(Self {
            server,
            cluster,
            sweeper,
            shutdown: Arc::new(Notify::new()),
            grace: config.shutdown.grace,
            leave_timeout: config.cluster.ping_timeout,
        })
    }

    /// Address the HTTP surface actually bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.server.local_addr()
    }

    /// Address the cluster replication listener advertises to peers.
    pub fn cluster_addr(&self) -> String {
        self.cluster.advertised_addr()
    }

    /// Handle for requesting shutdown; fire it with
    /// [`Notify::notify_waiters`].
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Serves until shutdown is requested, then drains the HTTP server
    /// and leaves the cluster gracefully.
    pub async fn run(self) -> std::io::Result<()> {
        let result = self.server.serve(self.shutdown, self.grace).await;
        self.sweeper.abort();
        self.cluster.leave(self.leave_timeout).await;
        info!("shutdown complete");
        result
    }
}

/// Sweeps expired local-tier entries on the TTL cadence, so stale
/// entries do not sit in memory until the LRU bound reclaims them.
fn spawn_expiry_sweeper(
    reactions: Arc<ReactionService>,
    mechanisms: Arc<MechanismService>,
    ttl: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ttl.max(Duration::from_secs(1)));
        // the first tick fires immediately; skip it
        interval.tick().await;
        loop {
            interval.tick().await;
            reactions.clean_expired();
            mechanisms.clean_expired();
        }
    })
}
