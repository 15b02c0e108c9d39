//! No-op scope registry: accepts notifications and records nothing.

use hypermind_core::registry::ScopeRegistry;
use hypermind_core::scope::ScopeId;

/// A registry that ignores every scope it is told about.
pub struct NoopRegistry;

impl ScopeRegistry for NoopRegistry {
    fn name(&self) -> &str { "none" }

    fn on_scope_pushed(&self, _scope_id: &ScopeId) {}
}
