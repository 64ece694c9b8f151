//! The networked replicated cache: listener, write fan-out, read merge.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use chemistflow_common::config::{CacheConfig, ClusterConfig};
use chemistflow_common::error::ClusterError;

use super::membership::{Membership, MembershipConfig, PeerPinger};
use super::protocol::{self, PeerMessage};
use super::store::{CacheKind, ReplicaStore, VersionedEntry};

/// Timeouts for replicated reads and writes, per peer.
#[derive(Debug, Clone)]
pub struct ReplicatedCacheConfig {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for ReplicatedCacheConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(3000),
            write_timeout: Duration::from_millis(3000),
        }
    }
}

impl From<&CacheConfig> for ReplicatedCacheConfig {
    fn from(config: &CacheConfig) -> Self {
        Self {
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        }
    }
}

/// Cluster-replicated last-write-wins map, one logical map per kind.
///
/// Writes apply locally first and then push to every reachable peer;
/// reads merge the local replica with every reachable peer's answer.
/// Peer timeouts degrade to "that replica is unreachable" — never an
/// error to the caller, since the upper tier falls through to the
/// authoritative upstream anyway.
pub struct ReplicatedCache {
    store: Arc<ReplicaStore>,
    membership: Arc<Membership>,
    config: ReplicatedCacheConfig,
}

impl ReplicatedCache {
    pub fn new(
        store: Arc<ReplicaStore>,
        membership: Arc<Membership>,
        config: ReplicatedCacheConfig,
    ) -> Self {
        Self {
            store,
            membership,
            config,
        }
    }

    /// Writes a value, tagged with this node's identity.
    ///
    /// The write is acknowledged once applied to the local replica; peer
    /// replication failures are logged and do not fail the put.
    pub async fn put(&self, kind: CacheKind, key: i64, value: serde_json::Value) {
        let entry = self.store.local_put(kind, key, value);
        let peers = self.membership.reachable_peers().await;
        if peers.is_empty() {
            return;
        }

        let pushes: Vec<_> = peers
            .iter()
            .map(|addr| {
                let entry = entry.clone();
                let timeout = self.config.write_timeout;
                async move {
                    let result = Self::replicate_to(addr, kind, key, entry, timeout).await;
                    (addr.clone(), result)
                }
            })
            .collect();

        for (addr, result) in futures::future::join_all(pushes).await {
            if let Err(e) = result {
                warn!(peer = %addr, error = %e, "replicating write failed");
            }
        }
    }

    /// Reads a key from the local replica and all reachable peers,
    /// merging via last-write-wins. A winning remote entry is applied
    /// back to the local replica.
    pub async fn get(&self, kind: CacheKind, key: i64) -> Option<serde_json::Value> {
        let local = self.store.get(kind, key);
        let peers = self.membership.reachable_peers().await;

        let mut best = local.clone();
        if !peers.is_empty() {
            let fetches: Vec<_> = peers
                .iter()
                .map(|addr| {
                    let timeout = self.config.read_timeout;
                    async move {
                        let result = Self::fetch_from(addr, kind, key, timeout).await;
                        (addr.clone(), result)
                    }
                })
                .collect();

            for (addr, result) in futures::future::join_all(fetches).await {
                match result {
                    Ok(Some(entry)) => {
                        let newer = best
                            .as_ref()
                            .map(|b| entry.version > b.version)
                            .unwrap_or(true);
                        if newer {
                            best = Some(entry);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(peer = %addr, error = %e, "replicated read failed, treating peer as absent");
                    }
                }
            }
        }

        let best = best?;
        let local_is_stale = local
            .map(|l| l.version < best.version)
            .unwrap_or(true);
        if local_is_stale {
            debug!(?kind, key, "read repair from peer replica");
            self.store.apply(kind, key, best.clone());
        }
        Some(best.value)
    }

    async fn replicate_to(
        addr: &str,
        kind: CacheKind,
        key: i64,
        entry: VersionedEntry,
        timeout: Duration,
    ) -> Result<(), ClusterError> {
        let push = async {
            let mut stream = protocol::connect(addr).await?;
            protocol::send_frame(&mut stream, &PeerMessage::Replicate { kind, key, entry })
                .await?;
            match protocol::recv_frame(&mut stream).await? {
                PeerMessage::ReplicateAck => Ok(()),
                other => Err(ClusterError::UnexpectedReply(format!("{:?}", other))),
            }
        };
        tokio::time::timeout(timeout, push)
            .await
            .map_err(|_| ClusterError::Timeout(timeout.as_millis() as u64))?
    }

    async fn fetch_from(
        addr: &str,
        kind: CacheKind,
        key: i64,
        timeout: Duration,
    ) -> Result<Option<VersionedEntry>, ClusterError> {
        let fetch = async {
            let mut stream = protocol::connect(addr).await?;
            protocol::send_frame(&mut stream, &PeerMessage::Fetch { kind, key }).await?;
            match protocol::recv_frame(&mut stream).await? {
                PeerMessage::FetchReply { entry } => Ok(entry),
                other => Err(ClusterError::UnexpectedReply(format!("{:?}", other))),
            }
        };
        tokio::time::timeout(timeout, fetch)
            .await
            .map_err(|_| ClusterError::Timeout(timeout.as_millis() as u64))?
    }
}

/// A running cluster node: replication listener, membership, pinger.
///
/// Owns the background tasks; [`ClusterHandle::leave`] announces the
/// departure to peers and stops them.
pub struct ClusterHandle {
    store: Arc<ReplicaStore>,
    membership: Arc<Membership>,
    listener_task: JoinHandle<()>,
    pinger_task: JoinHandle<()>,
}

impl ClusterHandle {
    /// Binds the replication listener, announces this node to the seed
    /// nodes, and starts the liveness pinger.
    ///
    /// A bind failure is fatal to bootstrap; unreachable seeds are not
    /// (the pinger keeps probing them).
    pub async fn start(config: &ClusterConfig) -> Result<Self, ClusterError> {
        let bind = format!("{}:{}", config.hostname, config.port);
        let listener = TcpListener::bind(&bind)
            .await
            .map_err(|e| ClusterError::Connection(format!("failed to bind {}: {}", bind, e)))?;
        let bound_port = listener
            .local_addr()
            .map_err(ClusterError::Io)?
            .port();
        let advertised = format!("{}:{}", config.hostname, bound_port);
        info!(addr = %advertised, "cluster replication listener bound");

        let store = Arc::new(ReplicaStore::new(advertised.clone()));
        let membership = Arc::new(Membership::new(advertised, &config.seed_nodes));

        let listener_task =
            spawn_listener(listener, Arc::clone(&store), Arc::clone(&membership));

        join_seeds(&membership, config.ping_timeout).await;

        let pinger = PeerPinger::new(
            Arc::clone(&membership),
            MembershipConfig {
                ping_interval: config.ping_interval,
                ping_timeout: config.ping_timeout,
                failure_threshold: config.failure_threshold,
            },
        );
        let pinger_task = pinger.spawn();

        Ok(Self {
            store,
            membership,
            listener_task,
            pinger_task,
        })
    }

    pub fn store(&self) -> Arc<ReplicaStore> {
        Arc::clone(&self.store)
    }

    pub fn membership(&self) -> Arc<Membership> {
        Arc::clone(&self.membership)
    }

    /// The address peers use to reach this node.
    pub fn advertised_addr(&self) -> String {
        self.membership.local_addr().to_string()
    }

    pub fn replicated_cache(&self, config: ReplicatedCacheConfig) -> Arc<ReplicatedCache> {
        Arc::new(ReplicatedCache::new(
            self.store(),
            self.membership(),
            config,
        ))
    }

    /// Announces departure to every reachable peer and stops the
    /// background tasks.
    pub async fn leave(self, timeout: Duration) {
        let node = self.membership.local_addr().to_string();
        let peers = self.membership.reachable_peers().await;
        let goodbyes: Vec<_> = peers
            .iter()
            .map(|addr| {
                let node = node.clone();
                async move {
                    let farewell = async {
                        let mut stream = protocol::connect(addr).await?;
                        protocol::send_frame(&mut stream, &PeerMessage::Leave { node }).await
                    };
                    if tokio::time::timeout(timeout, farewell).await.is_err() {
                        debug!(peer = %addr, "leave announcement timed out");
                    }
                }
            })
            .collect();
        futures::future::join_all(goodbyes).await;

        self.pinger_task.abort();
        self.listener_task.abort();
        info!(node = %node, "left cluster");
    }
}

fn spawn_listener(
    listener: TcpListener,
    store: Arc<ReplicaStore>,
    membership: Arc<Membership>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let store = Arc::clone(&store);
                    let membership = Arc::clone(&membership);
                    tokio::spawn(async move {
                        handle_peer(stream, store, membership).await;
                    });
                }
                Err(e) => {
                    warn!(error = %e, "cluster accept error");
                }
            }
        }
    })
}

async fn handle_peer(
    mut stream: tokio::net::TcpStream,
    store: Arc<ReplicaStore>,
    membership: Arc<Membership>,
) {
    loop {
        let msg = match protocol::recv_frame(&mut stream).await {
            Ok(msg) => msg,
            // EOF or a broken frame ends the connection
            Err(_) => return,
        };
        let reply = match msg {
            PeerMessage::Ping => Some(PeerMessage::Pong),
            PeerMessage::Join { node } => {
                membership.add_peer(&node).await;
                let peers = membership
                    .all_peers()
                    .await
                    .into_iter()
                    .map(|p| p.addr)
                    .collect();
                Some(PeerMessage::JoinAck { peers })
            }
            PeerMessage::Leave { node } => {
                membership.remove_peer(&node).await;
                None
            }
            PeerMessage::Replicate { kind, key, entry } => {
                store.apply(kind, key, entry);
                Some(PeerMessage::ReplicateAck)
            }
            PeerMessage::Fetch { kind, key } => Some(PeerMessage::FetchReply {
                entry: store.get(kind, key),
            }),
            other => {
                debug!(message = ?other, "ignoring unsolicited peer frame");
                None
            }
        };
        if let Some(reply) = reply {
            if let Err(e) = protocol::send_frame(&mut stream, &reply).await {
                debug!(error = %e, "failed to reply to peer");
                return;
            }
        }
    }
}

/// Announces this node to its seeds and merges the peer lists they
/// return. Best effort: an unreachable seed only logs a warning.
async fn join_seeds(membership: &Arc<Membership>, timeout: Duration) {
    let node = membership.local_addr().to_string();
    let seeds = membership.reachable_peers().await;
    for addr in seeds {
        let node = node.clone();
        let announce = async {
            let mut stream = protocol::connect(&addr).await?;
            protocol::send_frame(&mut stream, &PeerMessage::Join { node }).await?;
            protocol::recv_frame(&mut stream).await
        };
        match tokio::time::timeout(timeout, announce).await {
            Ok(Ok(PeerMessage::JoinAck { peers })) => {
                for peer in peers {
                    membership.add_peer(&peer).await;
                }
            }
            Ok(Ok(other)) => {
                warn!(seed = %addr, reply = ?other, "unexpected join reply");
            }
            Ok(Err(e)) => {
                warn!(seed = %addr, error = %e, "failed to join seed");
            }
            Err(_) => {
                warn!(seed = %addr, "join timed out");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemistflow_common::config::ClusterConfig;
    use serde_json::json;

    fn test_cluster_config(seeds: Vec<String>) -> ClusterConfig {
        ClusterConfig {
            hostname: "127.0.0.1".to_string(),
            port: 0,
            seed_nodes: seeds,
            ping_interval: Duration::from_millis(200),
            ping_timeout: Duration::from_millis(500),
            failure_threshold: 3,
        }
    }

    #[tokio::test]
    async fn test_single_node_put_get() {
        let node = ClusterHandle::start(&test_cluster_config(vec![])).await.unwrap();
        let cache = node.replicated_cache(ReplicatedCacheConfig::default());

        cache.put(CacheKind::Reaction, 1, json!({"reactionId": 1})).await;
        let value = cache.get(CacheKind::Reaction, 1).await;
        assert_eq!(value, Some(json!({"reactionId": 1})));
    }

    #[tokio::test]
    async fn test_get_absent_key() {
        let node = ClusterHandle::start(&test_cluster_config(vec![])).await.unwrap();
        let cache = node.replicated_cache(ReplicatedCacheConfig::default());
        assert_eq!(cache.get(CacheKind::Mechanism, 99).await, None);
    }

    #[tokio::test]
    async fn test_join_adds_both_directions() {
        let a = ClusterHandle::start(&test_cluster_config(vec![])).await.unwrap();
        let b = ClusterHandle::start(&test_cluster_config(vec![a.advertised_addr()]))
            .await
            .unwrap();

        assert_eq!(b.membership().reachable_peers().await, vec![a.advertised_addr()]);
        // the seed learned about the joiner from the Join frame
        assert_eq!(a.membership().reachable_peers().await, vec![b.advertised_addr()]);
    }

    #[tokio::test]
    async fn test_write_replicates_to_peer() {
        let a = ClusterHandle::start(&test_cluster_config(vec![])).await.unwrap();
        let b = ClusterHandle::start(&test_cluster_config(vec![a.advertised_addr()]))
            .await
            .unwrap();

        let cache_b = b.replicated_cache(ReplicatedCacheConfig::default());
        cache_b.put(CacheKind::Reaction, 9, json!("from-b")).await;

        // the push already landed in a's replica; read it locally
        let entry = a.store().get(CacheKind::Reaction, 9).unwrap();
        assert_eq!(entry.value, json!("from-b"));
    }

    #[tokio::test]
    async fn test_read_merges_from_peer_replica() {
        let a = ClusterHandle::start(&test_cluster_config(vec![])).await.unwrap();
        let b = ClusterHandle::start(&test_cluster_config(vec![a.advertised_addr()]))
            .await
            .unwrap();

        // write only into a's local replica, bypassing replication
        a.store().local_put(CacheKind::ReactionDetails, 7, json!("only-on-a"));

        let cache_b = b.replicated_cache(ReplicatedCacheConfig::default());
        let value = cache_b.get(CacheKind::ReactionDetails, 7).await;
        assert_eq!(value, Some(json!("only-on-a")));
        // read repair applied it to b's replica
        assert!(b.store().get(CacheKind::ReactionDetails, 7).is_some());
    }

    #[tokio::test]
    async fn test_concurrent_writes_converge() {
        let a = ClusterHandle::start(&test_cluster_config(vec![])).await.unwrap();
        let b = ClusterHandle::start(&test_cluster_config(vec![a.advertised_addr()]))
            .await
            .unwrap();

        let cache_a = a.replicated_cache(ReplicatedCacheConfig::default());
        let cache_b = b.replicated_cache(ReplicatedCacheConfig::default());

        cache_a.put(CacheKind::Reaction, 1, json!("from-a")).await;
        cache_b.put(CacheKind::Reaction, 1, json!("from-b")).await;

        let seen_by_a = cache_a.get(CacheKind::Reaction, 1).await;
        let seen_by_b = cache_b.get(CacheKind::Reaction, 1).await;
        assert_eq!(seen_by_a, seen_by_b);
    }

    #[tokio::test]
    async fn test_leave_removes_peer() {
        let a = ClusterHandle::start(&test_cluster_config(vec![])).await.unwrap();
        let b = ClusterHandle::start(&test_cluster_config(vec![a.advertised_addr()]))
            .await
            .unwrap();
        let a_membership = a.membership();

        b.leave(Duration::from_millis(500)).await;
        assert!(a_membership.reachable_peers().await.is_empty());
    }
}
