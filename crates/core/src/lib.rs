//! # HyperMind Core
//!
//! Domain types, traits, and error definitions for the HyperMind tiered
//! context store. This crate holds no store logic: it defines the domain
//! model that the memory crate implements against.
//!
//! ## Domain
//!
//! - [`context`]: tiers and the entries they hold
//! - [`scope`]: scope frames and descriptors
//! - [`graph`]: node and edge records of the context graph
//! - [`search`]: search requests and normalized hits
//! - [`event`]: broadcast bus for store and scope events
//! - [`registry`]: the trait for scope bookkeeping collaborators

pub mod error;
pub mod context;
pub mod scope;
pub mod graph;
pub mod search;
pub mod event;
pub mod registry;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result, ScopeError};
pub use context::{ContextEntry, StoreOptions, Tier, DEFAULT_SIGNIFICANCE};
pub use scope::{ScopeDescriptor, ScopeFrame, ScopeId, ARCHIVE_KEY_PREFIX};
pub use graph::{EdgeType, GraphEdge, GraphNode, NodeType};
pub use search::{SearchHit, SearchRequest, SearchType};
pub use event::{EventBus, MemoryEvent, MAX_EVENT_CAPACITY};
pub use registry::ScopeRegistry;
