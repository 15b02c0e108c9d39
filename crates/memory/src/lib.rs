//! Tiered context store, scope stack and context graph for HyperMind.

pub mod canonical;
pub mod tier_store;
pub mod graph;
pub mod scope_stack;
pub mod router;
pub mod noop;
pub mod hypermind;

pub use canonical::canonical_json;
pub use tier_store::{MaintenanceReport, TierMatch, TierPolicy, TierStats, TierStore};
pub use graph::{ContextGraph, GraphMatch};
pub use scope_stack::ScopeStack;
pub use router::SearchRouter;
pub use noop::NoopRegistry;
pub use hypermind::{HyperMind, HyperMindStats};
