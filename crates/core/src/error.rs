//! Error types for the HyperMind domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Misses (`retrieve` on an unknown key) and unsupported search types are
//! not errors: they surface as `None` or an empty result set.

use thiserror::Error;

/// The top-level error type for all HyperMind operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Scope stack errors ---
    #[error("Scope error: {0}")]
    Scope(#[from] ScopeError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// `pop` was called while no scope frame was active.
    #[error("Cannot pop scope: the scope stack is empty")]
    EmptyStack,

    /// The frame could not be snapshotted for archival. Raised before the
    /// frame leaves the stack.
    #[error("Failed to snapshot scope {scope_id}: {reason}")]
    Snapshot { scope_id: String, reason: String },
}
