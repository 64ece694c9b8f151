//! Configuration for every component, with the defaults the binary
//! falls back to when a flag is not given.

use std::time::Duration;

/// HTTP surface bind address.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8085,
        }
    }
}

/// Outbound HTTP client settings for one upstream.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URI of the upstream, without a trailing slash.
    pub base_uri: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Retry budget for idempotent GETs (total attempts = retries + 1).
    pub retries: u32,
    pub pool_max_connections: usize,
    pub pool_max_idle: Duration,
}

impl ClientConfig {
    pub fn for_base_uri(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_uri: "http://127.0.0.1:8080/api".to_string(),
            connect_timeout: Duration::from_millis(2000),
            request_timeout: Duration::from_millis(30_000),
            retries: 3,
            pool_max_connections: 10,
            pool_max_idle: Duration::from_secs(90),
        }
    }
}

/// Two-tier cache settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Local-tier entry lifetime.
    pub local_ttl: Duration,
    /// Local-tier size bound per object kind.
    pub local_max_entries: usize,
    /// Per-peer budget for replicated reads.
    pub read_timeout: Duration,
    /// Per-peer budget for replicated writes.
    pub write_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            local_ttl: Duration::from_secs(300),
            local_max_entries: 1000,
            read_timeout: Duration::from_millis(3000),
            write_timeout: Duration::from_millis(3000),
        }
    }
}

/// Cluster membership and replication listener settings.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub hostname: String,
    pub port: u16,
    /// Addresses of nodes to join on startup (`host:port`).
    pub seed_nodes: Vec<String>,
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
    /// Consecutive ping failures before a peer counts as unreachable.
    pub failure_threshold: u32,
}

impl ClusterConfig {
    /// The address this node advertises to its peers.
    pub fn advertised_addr(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 25520,
            seed_nodes: Vec::new(),
            ping_interval: Duration::from_secs(5),
            ping_timeout: Duration::from_millis(2000),
            failure_threshold: 3,
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub preprocessor: ClientConfig,
    pub engine: ClientConfig,
    pub cache: CacheConfig,
    pub cluster: ClusterConfig,
    pub shutdown: ShutdownConfig,
}

/// Shutdown drain budget.
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    pub grace: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
        }
    }
}
