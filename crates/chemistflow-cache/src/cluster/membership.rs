//! Peer set with liveness tracking.
//!
//! Seeded from configuration, grown by `Join` announcements, shrunk by
//! `Leave`. A background pinger probes every peer on an interval and
//! marks a peer unreachable after a threshold of consecutive failures;
//! unreachable peers drop out of "all reachable replicas" until a probe
//! succeeds again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::protocol::{self, PeerMessage};

/// Pinger settings.
#[derive(Debug, Clone)]
pub struct MembershipConfig {
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
    pub failure_threshold: u32,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(5),
            ping_timeout: Duration::from_millis(2000),
            failure_threshold: 3,
        }
    }
}

/// One known peer and its liveness state.
#[derive(Debug, Clone)]
pub struct Peer {
    pub addr: String,
    pub reachable: bool,
    pub consecutive_failures: u32,
}

impl Peer {
    fn new(addr: String) -> Self {
        Self {
            addr,
            reachable: true,
            consecutive_failures: 0,
        }
    }
}

/// The peer set this node replicates to.
pub struct Membership {
    local_addr: String,
    peers: RwLock<HashMap<String, Peer>>,
}

impl Membership {
    pub fn new(local_addr: impl Into<String>, seeds: &[String]) -> Self {
        let local_addr = local_addr.into();
        let peers = seeds
            .iter()
            .filter(|addr| **addr != local_addr)
            .map(|addr| (addr.clone(), Peer::new(addr.clone())))
            .collect();
        Self {
            local_addr,
            peers: RwLock::new(peers),
        }
    }

    /// The address this node advertises to the cluster.
    pub fn local_addr(&self) -> &str {
        &self.local_addr
    }

    /// Adds a peer; duplicates and the local node itself are no-ops.
    pub async fn add_peer(&self, addr: &str) {
        if addr == self.local_addr {
            return;
        }
        let mut peers = self.peers.write().await;
        if !peers.contains_key(addr) {
            info!(peer = %addr, "peer joined");
            peers.insert(addr.to_string(), Peer::new(addr.to_string()));
        }
    }

    pub async fn remove_peer(&self, addr: &str) {
        let mut peers = self.peers.write().await;
        if peers.remove(addr).is_some() {
            info!(peer = %addr, "peer left");
        }
    }

    /// Addresses currently considered reachable.
    pub async fn reachable_peers(&self) -> Vec<String> {
        let peers = self.peers.read().await;
        peers
            .values()
            .filter(|p| p.reachable)
            .map(|p| p.addr.clone())
            .collect()
    }

    pub async fn all_peers(&self) -> Vec<Peer> {
        let peers = self.peers.read().await;
        peers.values().cloned().collect()
    }

    pub async fn record_success(&self, addr: &str) {
        let mut peers = self.peers.write().await;
        if let Some(peer) = peers.get_mut(addr) {
            if !peer.reachable {
                info!(peer = %addr, "peer reachable again");
            }
            peer.reachable = true;
            peer.consecutive_failures = 0;
        }
    }

    pub async fn record_failure(&self, addr: &str, threshold: u32) {
        let mut peers = self.peers.write().await;
        if let Some(peer) = peers.get_mut(addr) {
            peer.consecutive_failures += 1;
            if peer.reachable && peer.consecutive_failures >= threshold {
                warn!(
                    peer = %addr,
                    failures = peer.consecutive_failures,
                    "peer marked unreachable"
                );
                peer.reachable = false;
            }
        }
    }
}

/// Background liveness prober.
pub struct PeerPinger {
    membership: Arc<Membership>,
    config: MembershipConfig,
}

impl PeerPinger {
    pub fn new(membership: Arc<Membership>, config: MembershipConfig) -> Self {
        Self { membership, config }
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        let mut interval = tokio::time::interval(self.config.ping_interval);
        loop {
            interval.tick().await;
            self.ping_all_peers().await;
        }
    }

    async fn ping_all_peers(&self) {
        let peers = self.membership.all_peers().await;
        let checks: Vec<_> = peers
            .into_iter()
            .map(|peer| {
                let timeout = self.config.ping_timeout;
                async move {
                    let result = Self::ping_peer(&peer.addr, timeout).await;
                    (peer.addr, result)
                }
            })
            .collect();

        let results = futures::future::join_all(checks).await;

        for (addr, healthy) in results {
            if healthy {
                self.membership.record_success(&addr).await;
            } else {
                debug!(peer = %addr, "ping failed");
                self.membership
                    .record_failure(&addr, self.config.failure_threshold)
                    .await;
            }
        }
    }

    async fn ping_peer(addr: &str, timeout: Duration) -> bool {
        let probe = async {
            let mut stream = protocol::connect(addr).await?;
            protocol::send_frame(&mut stream, &PeerMessage::Ping).await?;
            protocol::recv_frame(&mut stream).await
        };
        matches!(
            tokio::time::timeout(timeout, probe).await,
            Ok(Ok(PeerMessage::Pong))
        )
    }
}
