//! Proxy services over the upstreams.
//!
//! [`ReactionService`] and [`MechanismService`] expose the same shape
//! over their resource: cache-first get, passthrough create with
//! write-through, passthrough delete with local invalidation.
//! [`ReaktoroService`] expands one reaction into parallel Engine calls.

pub mod mechanism;
pub mod reaction;
pub mod reaktoro;

pub use mechanism::MechanismService;
pub use reaction::ReactionService;
pub use reaktoro::ReaktoroService;
