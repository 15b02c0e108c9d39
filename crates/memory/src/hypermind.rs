//! HyperMind: one handle over the tier store, scope stack, context graph
//! and search router.
//!
//! Each instance owns its own state; nothing is process-global. Share it by
//! reference or `Arc` between threads.

use hypermind_config::HyperMindConfig;
use hypermind_core::context::StoreOptions;
use hypermind_core::error::ScopeError;
use hypermind_core::event::{EventBus, MemoryEvent};
use hypermind_core::registry::ScopeRegistry;
use hypermind_core::scope::{ScopeDescriptor, ScopeFrame};
use hypermind_core::search::{SearchHit, SearchRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::graph::ContextGraph;
use crate::router::SearchRouter;
use crate::scope_stack::ScopeStack;
use crate::tier_store::{MaintenanceReport, TierPolicy, TierStats, TierStore};

/// Point-in-time counts across all components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperMindStats {
    pub tiers: TierStats,
    pub stack_depth: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
}

pub struct HyperMind {
    store: Arc<TierStore>,
    graph: Arc<ContextGraph>,
    stack: ScopeStack,
    router: SearchRouter,
    events: Arc<EventBus>,
    registries: Vec<Arc<dyn ScopeRegistry>>,
}

impl HyperMind {
    /// A store with the built-in thresholds.
    pub fn new() -> Self {
        Self::from_config(&HyperMindConfig::default())
    }

    /// Build from `~/.hypermind/config.toml` and `HYPERMIND_*` overrides.
    pub fn load() -> hypermind_core::Result<Self> {
        let config = HyperMindConfig::load()?;
        Ok(Self::from_config(&config))
    }

    /// Build from the config file at `path`. A missing file means defaults.
    pub fn load_from(path: &Path) -> hypermind_core::Result<Self> {
        let config = HyperMindConfig::load_from(path)?;
        Ok(Self::from_config(&config))
    }

    pub fn from_config(config: &HyperMindConfig) -> Self {
        let events = Arc::new(EventBus::new(config.events.capacity));
        let store = Arc::new(TierStore::new(TierPolicy::from(config)).with_events(events.clone()));
        let graph = Arc::new(ContextGraph::new());
        let stack = ScopeStack::new(store.clone(), graph.clone()).with_events(events.clone());
        let router = SearchRouter::new(store.clone(), graph.clone());
        info!(
            default_tier = %config.tiers.default_tier,
            promote_above = config.maintenance.promote_above_accesses,
            demote_after_hours = config.maintenance.demote_after_hours,
            "HyperMind initialized"
        );
        Self {
            store,
            graph,
            stack,
            router,
            events,
            registries: Vec::new(),
        }
    }

    /// Notify `registry` of every scope pushed from now on.
    pub fn with_registry(mut self, registry: Arc<dyn ScopeRegistry>) -> Self {
        debug!(registry = registry.name(), "Registered scope registry");
        self.registries.push(registry);
        self
    }

    // ── Context entries ──

    pub fn store(&self, key: impl Into<String>, value: Value, options: StoreOptions) {
        self.store.store(key, value, options);
    }

    pub fn retrieve(&self, key: &str) -> Option<Value> {
        self.store.retrieve(key)
    }

    pub fn search(&self, request: &SearchRequest) -> Vec<SearchHit> {
        self.router.search(request)
    }

    pub fn maintain(&self) -> MaintenanceReport {
        self.store.maintain()
    }

    // ── Scopes ──

    /// Push an anonymous scope frame.
    pub fn push_scope(&self, config: Map<String, Value>) -> Result<ScopeFrame, ScopeError> {
        let frame = self.stack.push(config)?;
        self.notify_registries(&frame);
        Ok(frame)
    }

    /// Push a frame for a scope chosen by the caller's scope selector.
    pub fn enter_scope(
        &self,
        descriptor: ScopeDescriptor,
        config: Map<String, Value>,
    ) -> Result<ScopeFrame, ScopeError> {
        let frame = self.stack.push_scope(descriptor, config)?;
        self.notify_registries(&frame);
        Ok(frame)
    }

    /// Pop the current scope and archive it.
    pub fn pop_scope(&self) -> Result<ScopeFrame, ScopeError> {
        self.stack.pop()
    }

    pub fn current_scope(&self) -> Option<ScopeFrame> {
        self.stack.top()
    }

    fn notify_registries(&self, frame: &ScopeFrame) {
        for registry in &self.registries {
            registry.on_scope_pushed(&frame.id);
        }
    }

    // ── Components ──

    pub fn tier_store(&self) -> &TierStore {
        &self.store
    }

    pub fn scope_stack(&self) -> &ScopeStack {
        &self.stack
    }

    pub fn graph(&self) -> &ContextGraph {
        &self.graph
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<MemoryEvent>> {
        self.events.subscribe()
    }

    pub fn stats(&self) -> HyperMindStats {
        HyperMindStats {
            tiers: self.store.stats(),
            stack_depth: self.stack.depth(),
            graph_nodes: self.graph.node_count(),
            graph_edges: self.graph.edge_count(),
        }
    }

    /// Drop all entries, frames and graph records. Registries and event
    /// subscribers stay attached.
    pub fn reset(&self) {
        self.stack.clear();
        self.graph.clear();
        self.store.clear();
        info!("HyperMind state reset");
    }
}

impl Default for HyperMind {
    fn default() -> Self {
        Self::new()
    }
}
