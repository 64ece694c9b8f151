//! Two-node replication tests over real sockets.
//!
//! Each test starts cluster nodes on ephemeral ports and drives the
//! two-tier facade the way the proxy services do, checking cross-node
//! visibility, last-write-wins convergence, and peer-failure behavior.

use std::time::Duration;

use chemistflow_cache::cluster::ReplicatedCacheConfig;
use chemistflow_cache::{CacheKind, ClusterHandle, LocalCacheConfig, TwoTierCache};
use chemistflow_common::config::ClusterConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Doc {
    body: String,
}

fn doc(body: &str) -> Doc {
    Doc {
        body: body.to_string(),
    }
}

fn node_config(seeds: Vec<String>) -> ClusterConfig {
    ClusterConfig {
        hostname: "127.0.0.1".to_string(),
        port: 0,
        seed_nodes: seeds,
        ping_interval: Duration::from_millis(200),
        ping_timeout: Duration::from_millis(500),
        failure_threshold: 2,
    }
}

fn facade(node: &ClusterHandle, ttl: Duration) -> TwoTierCache<Doc> {
    TwoTierCache::new(
        CacheKind::ReactionDetails,
        LocalCacheConfig {
            ttl,
            max_entries: 100,
        },
        node.replicated_cache(ReplicatedCacheConfig {
            read_timeout: Duration::from_millis(500),
            write_timeout: Duration::from_millis(500),
        }),
    )
}

#[tokio::test]
async fn write_on_one_node_is_visible_on_the_other() {
    let a = ClusterHandle::start(&node_config(vec![])).await.unwrap();
    let b = ClusterHandle::start(&node_config(vec![a.advertised_addr()]))
        .await
        .unwrap();

    let cache_a = facade(&a, Duration::from_secs(60));
    let cache_b = facade(&b, Duration::from_secs(60));

    cache_a.put(9, doc("written on a")).await;

    // b's local tier is cold; the replicated tier must answer
    assert!(cache_b.local_get(9).is_none());
    assert_eq!(cache_b.get(9).await, Some(doc("written on a")));
}

#[tokio::test]
async fn cold_node_reads_through_peer_fetch() {
    // a starts alone and writes before b even exists
    let a = ClusterHandle::start(&node_config(vec![])).await.unwrap();
    let cache_a = facade(&a, Duration::from_secs(60));
    cache_a.put(11, doc("pre-existing")).await;

    let b = ClusterHandle::start(&node_config(vec![a.advertised_addr()]))
        .await
        .unwrap();
    let cache_b = facade(&b, Duration::from_secs(60));

    assert_eq!(cache_b.get(11).await, Some(doc("pre-existing")));
}

#[tokio::test]
async fn later_write_wins_everywhere() {
    let a = ClusterHandle::start(&node_config(vec![])).await.unwrap();
    let b = ClusterHandle::start(&node_config(vec![a.advertised_addr()]))
        .await
        .unwrap();

    let cache_a = facade(&a, Duration::from_millis(1));
    let cache_b = facade(&b, Duration::from_millis(1));

    cache_a.put(3, doc("first")).await;
    cache_b.put(3, doc("second")).await;

    // the tiny local TTL forces both reads through the replicated tier
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(cache_a.get(3).await, Some(doc("second")));
    assert_eq!(cache_b.get(3).await, Some(doc("second")));
}

#[tokio::test]
async fn create_on_second_node_observes_first_nodes_entry() {
    let a = ClusterHandle::start(&node_config(vec![])).await.unwrap();
    let b = ClusterHandle::start(&node_config(vec![a.advertised_addr()]))
        .await
        .unwrap();

    let cache_a = facade(&a, Duration::from_secs(60));
    let cache_b = facade(&b, Duration::from_secs(60));

    cache_a.create(21, doc("original")).await.unwrap();
    let second = cache_b.create(21, doc("duplicate")).await;
    assert!(second.is_err());
    assert_eq!(cache_b.get(21).await, Some(doc("original")));
}

#[tokio::test]
async fn dead_peer_degrades_to_local_answers() {
    let a = ClusterHandle::start(&node_config(vec![])).await.unwrap();
    let b = ClusterHandle::start(&node_config(vec![a.advertised_addr()]))
        .await
        .unwrap();

    let cache_a = facade(&a, Duration::from_secs(60));
    cache_a.put(4, doc("before the crash")).await;

    b.leave(Duration::from_millis(200)).await;

    // a still answers its own reads, with or without reachable peers
    assert_eq!(cache_a.get(4).await, Some(doc("before the crash")));
    cache_a.put(5, doc("after the crash")).await;
    assert_eq!(cache_a.get(5).await, Some(doc("after the crash")));
}

#[tokio::test]
async fn third_node_learns_peers_from_a_single_seed() {
    let a = ClusterHandle::start(&node_config(vec![])).await.unwrap();
    let b = ClusterHandle::start(&node_config(vec![a.advertised_addr()]))
        .await
        .unwrap();
    // c only knows a, but a's join reply teaches it about b
    let c = ClusterHandle::start(&node_config(vec![a.advertised_addr()]))
        .await
        .unwrap();

    let mut peers = c.membership().reachable_peers().await;
    peers.sort();
    let mut expected = vec![a.advertised_addr(), b.advertised_addr()];
    expected.sort();
    assert_eq!(peers, expected);

    // and a write on c reaches b directly
    let cache_c = facade(&c, Duration::from_secs(60));
    cache_c.put(31, doc("from c")).await;
    assert!(b.store().get(CacheKind::ReactionDetails, 31).is_some());
}
