//! Cluster-replicated cache tier.
//!
//! One logical last-write-wins map per cached object kind, replicated to
//! every reachable peer. Writes are tagged with the local node's identity
//! and a Lamport counter so concurrent puts resolve deterministically;
//! reads consult all reachable replicas and merge. The tier has no TTL
//! and no delete: entries age out only by process restart or replacement.
//!
//! The layer splits into:
//!
//! - [`store`]: the in-memory versioned replica and the merge rule
//! - [`protocol`]: length-prefixed JSON frames exchanged between peers
//! - [`membership`]: the seeded peer set with liveness tracking
//! - [`replicated`]: the networked cache (listener, put fan-out, read
//!   merge) and the [`ClusterHandle`] that owns its background tasks

pub mod membership;
pub mod protocol;
pub mod replicated;
pub mod store;

pub use membership::{Membership, MembershipConfig, Peer, PeerPinger};
pub use protocol::PeerMessage;
pub use replicated::{ClusterHandle, ReplicatedCache, ReplicatedCacheConfig};
pub use store::{CacheKind, ReplicaStore, Version, VersionedEntry};
