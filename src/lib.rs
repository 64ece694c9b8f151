//! # ChemistFlow
//!
//! ChemistFlow is a middle-tier service that fronts two remote HTTP
//! backends: a *Preprocessor* (the authoritative store of chemical
//! reactions and mechanisms) and an *Engine* (a CPU-bound solver that
//! computes thermodynamic system properties for a given system state).
//!
//! Clients query ChemistFlow for reaction and mechanism details and submit
//! compute jobs; ChemistFlow fans those jobs out to the Engine across many
//! parameterized system states in parallel, while caching read-mostly
//! domain objects in a cluster-replicated, locally-fronted cache.
//!
//! # Components
//!
//! - [`chemistflow_common`] - Domain model, error taxonomy, configuration
//! - [`chemistflow_cache`] - Local TTL tier, replicated tier, two-tier facade
//! - [`chemistflow_client`] - Preprocessor and Engine HTTP clients
//! - [`chemistflow_server`] - Proxy services, compute fan-out, HTTP surface

pub use chemistflow_cache as cache;
pub use chemistflow_client as client;
pub use chemistflow_common as common;
pub use chemistflow_server as server;
