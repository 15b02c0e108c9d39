//! ScopeRegistry trait: bookkeeping collaborators told about new scopes.
//!
//! Registries are notified after a scope is pushed. Notification is
//! fire-and-forget: nothing is returned, and a registry must not block.

use crate::scope::ScopeId;

/// A collaborator that tracks scope ids for its own bookkeeping.
///
/// Implementations: `NoopRegistry` in `hypermind-memory`, plus whatever
/// numeric or spatial registries the embedding application provides.
pub trait ScopeRegistry: Send + Sync {
    /// The registry name (e.g., "tensor", "spatial", "none").
    fn name(&self) -> &str;

    /// A scope was pushed onto the stack.
    fn on_scope_pushed(&self, scope_id: &ScopeId);
}
