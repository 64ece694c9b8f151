//! ChemistFlow Two-Tier Cache
//!
//! Read-mostly domain objects are cached in two orthogonal tiers:
//!
//! - A **local tier** ([`local::LocalCache`]): per-node, in-memory, TTL'd
//!   and bounded. Entries expire independently on each node.
//! - A **replicated tier** ([`cluster::ReplicatedCache`]): cluster-wide,
//!   last-write-wins, no TTL and no delete. Any node can answer repeat
//!   reads without a round-trip to the upstream store.
//!
//! The [`facade::TwoTierCache`] sequences them: local first on reads,
//! replicated first on writes. The tiers are deliberately kept apart
//! rather than nesting the local tier as a write-through wrapper, so the
//! replicated tier stays separately testable and the local tier can be
//! dropped from a wiring entirely.

pub mod cluster;
pub mod facade;
pub mod local;

pub use cluster::{CacheKind, ClusterHandle, Membership, ReplicaStore, ReplicatedCache};
pub use facade::TwoTierCache;
pub use local::{LocalCache, LocalCacheConfig};
