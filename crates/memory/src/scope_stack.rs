//! Scope stack: LIFO frames with parent links fixed at push time.
//!
//! Lock order is stack, then graph (on push) or stack, then tiers (on pop).
//! Both cross-component steps happen while the stack's write guard is held,
//! so no other caller can observe a pushed frame missing from the graph or a
//! popped frame that is not yet archived. Scope events are published under
//! the same guard, so subscribers see a frame's push before its pop.

use chrono::Utc;
use hypermind_core::context::{StoreOptions, Tier};
use hypermind_core::error::ScopeError;
use hypermind_core::event::{EventBus, MemoryEvent};
use hypermind_core::scope::{ScopeDescriptor, ScopeFrame, ScopeId};
use serde_json::{Map, Value};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::graph::ContextGraph;
use crate::tier_store::TierStore;

#[derive(Debug, Default)]
struct StackState {
    frames: Vec<ScopeFrame>,
    next_seq: u64,
}

pub struct ScopeStack {
    state: RwLock<StackState>,
    store: Arc<TierStore>,
    graph: Arc<ContextGraph>,
    events: Option<Arc<EventBus>>,
}

impl ScopeStack {
    /// Create an empty stack that records pushes in `graph` and archives
    /// popped frames into `store`.
    pub fn new(store: Arc<TierStore>, graph: Arc<ContextGraph>) -> Self {
        Self {
            state: RwLock::new(StackState::default()),
            store,
            graph,
            events: None,
        }
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, StackState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StackState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: MemoryEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }

    /// Push a new frame whose parent is the current top.
    ///
    /// Fails with [`ScopeError::Snapshot`] before anything changes when the
    /// frame cannot be recorded in the graph.
    pub fn push(&self, config: Map<String, Value>) -> Result<ScopeFrame, ScopeError> {
        self.push_frame(config, None)
    }

    /// Push a new frame entered for `descriptor`.
    pub fn push_scope(
        &self,
        descriptor: ScopeDescriptor,
        config: Map<String, Value>,
    ) -> Result<ScopeFrame, ScopeError> {
        self.push_frame(config, Some(descriptor))
    }

    fn push_frame(
        &self,
        config: Map<String, Value>,
        descriptor: Option<ScopeDescriptor>,
    ) -> Result<ScopeFrame, ScopeError> {
        let mut state = self.write();
        let parent = state.frames.last().map(|top| top.id.clone());
        let mut frame = ScopeFrame::new(state.next_seq, config, parent);
        frame.descriptor = descriptor;
        let snapshot = frame.snapshot()?;
        state.next_seq += 1;

        self.graph.record_push(&frame, snapshot);
        state.frames.push(frame.clone());

        self.publish(MemoryEvent::ScopePushed {
            scope_id: frame.id.clone(),
            parent_id: frame.parent.clone(),
            timestamp: frame.created_at,
        });
        debug!(
            scope_id = %frame.id,
            parent = ?frame.parent.as_ref().map(ScopeId::as_str),
            depth = state.frames.len(),
            "Pushed scope"
        );
        Ok(frame)
    }

    /// Remove the top frame and archive it under `scope_<id>`.
    ///
    /// Fails with [`ScopeError::EmptyStack`] without touching anything when
    /// no frame is active.
    pub fn pop(&self) -> Result<ScopeFrame, ScopeError> {
        let mut state = self.write();
        let top = state.frames.last().ok_or(ScopeError::EmptyStack)?;
        let snapshot = top.snapshot()?;
        let archive_key = top.archive_key();

        self.store
            .store(archive_key.clone(), snapshot, StoreOptions::in_tier(Tier::Archived));
        let frame = state.frames.pop().ok_or(ScopeError::EmptyStack)?;

        self.publish(MemoryEvent::ScopePopped {
            scope_id: frame.id.clone(),
            archived_key: archive_key.clone(),
            timestamp: Utc::now(),
        });
        debug!(scope_id = %frame.id, archive_key = %archive_key, depth = state.frames.len(), "Popped scope");
        Ok(frame)
    }

    /// The current top frame, if any.
    pub fn top(&self) -> Option<ScopeFrame> {
        self.read().frames.last().cloned()
    }

    /// A frame still on the stack, looked up by id.
    pub fn get(&self, id: &ScopeId) -> Option<ScopeFrame> {
        self.read().frames.iter().find(|f| &f.id == id).cloned()
    }

    /// Snapshot of the stack, bottom first.
    pub fn frames(&self) -> Vec<ScopeFrame> {
        self.read().frames.clone()
    }

    pub fn depth(&self) -> usize {
        self.read().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    /// Drop every frame without archiving them.
    pub fn clear(&self) {
        self.write().frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier_store::TierPolicy;
    use serde_json::json;

    fn named(name: &str) -> Map<String, Value> {
        let mut config = Map::new();
        config.insert("name".into(), json!(name));
        config
    }

    fn stack() -> (ScopeStack, Arc<TierStore>, Arc<ContextGraph>) {
        let store = Arc::new(TierStore::new(TierPolicy::default()));
        let graph = Arc::new(ContextGraph::new());
        (ScopeStack::new(store.clone(), graph.clone()), store, graph)
    }

    #[test]
    fn empty_stack_has_no_top() {
        let (stack, _, _) = stack();
        assert!(stack.top().is_none());
        assert!(stack.is_empty());
    }

    #[test]
    fn pop_on_empty_fails_without_mutation() {
        let (stack, store, graph) = stack();
        assert_eq!(stack.pop(), Err(ScopeError::EmptyStack));
        assert!(store.is_empty());
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn push_links_parent_to_previous_top() {
        let (stack, _, _) = stack();
        let parent = stack.push(named("parent")).unwrap();
        let child = stack.push(named("child")).unwrap();
        assert_eq!(parent.parent, None);
        assert_eq!(child.parent, Some(parent.id.clone()));
        assert_eq!(stack.top(), Some(child.clone()));
        assert!(child.seq > parent.seq);
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn pops_return_reverse_push_order() {
        let (stack, _, _) = stack();
        let pushed: Vec<ScopeFrame> = (0..5).map(|i| stack.push(named(&format!("s{i}"))).unwrap()).collect();
        let popped: Vec<ScopeFrame> = (0..5).map(|_| stack.pop().unwrap()).collect();
        let expected: Vec<ScopeFrame> = pushed.into_iter().rev().collect();
        assert_eq!(popped, expected);
        assert!(stack.is_empty());
    }

    #[test]
    fn parent_is_top_at_push_time_not_bottom() {
        let (stack, _, _) = stack();
        let a = stack.push(named("a")).unwrap();
        let b = stack.push(named("b")).unwrap();
        stack.pop().unwrap();
        let c = stack.push(named("c")).unwrap();
        assert_eq!(c.parent, Some(a.id.clone()));
        assert_ne!(c.parent, Some(b.id));
    }

    #[test]
    fn pop_archives_frame() {
        let (stack, store, _) = stack();
        stack.push(named("parent")).unwrap();
        let child = stack.push(named("child")).unwrap();
        let popped = stack.pop().unwrap();
        assert_eq!(popped, child);

        assert_eq!(store.tier_of(&child.archive_key()), Some(Tier::Archived));
        let archived = store.retrieve(&format!("scope_{}", child.id)).unwrap();
        assert_eq!(archived["id"], json!(child.id.as_str()));
        let restored: ScopeFrame = serde_json::from_value(archived).unwrap();
        assert_eq!(restored, child);
    }

    #[test]
    fn push_records_graph_nodes_and_edges() {
        let (stack, _, graph) = stack();
        let root = stack.push(named("root")).unwrap();
        let child = stack.push(named("child")).unwrap();
        stack.pop().unwrap();
        stack.push(named("sibling")).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.children_of(&root.id).len(), 2);
        assert_eq!(graph.parent_of(&child.id), Some(root.id));
    }

    #[test]
    fn push_scope_carries_descriptor() {
        let (stack, _, _) = stack();
        let frame = stack.push_scope(ScopeDescriptor::project("p1"), Map::new()).unwrap();
        assert_eq!(frame.descriptor, Some(ScopeDescriptor::project("p1")));
        assert_eq!(stack.get(&frame.id), Some(frame));
    }

    #[test]
    fn frames_are_bottom_first() {
        let (stack, _, _) = stack();
        let a = stack.push(named("a")).unwrap();
        let b = stack.push(named("b")).unwrap();
        let ids: Vec<ScopeId> = stack.frames().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn events_cover_push_and_pop() {
        let (stack, _, _) = stack();
        let bus = Arc::new(EventBus::new(16));
        let mut rx = bus.subscribe();
        let stack = stack.with_events(bus);

        let frame = stack.push(named("x")).unwrap();
        stack.pop().unwrap();

        let first = rx.try_recv().unwrap();
        assert!(matches!(first.as_ref(), MemoryEvent::ScopePushed { scope_id, .. } if *scope_id == frame.id));
        let second = rx.try_recv().unwrap();
        match second.as_ref() {
            MemoryEvent::ScopePopped { archived_key, .. } => assert_eq!(*archived_key, frame.archive_key()),
            other => panic!("Expected ScopePopped, got {other:?}"),
        }
    }

    #[test]
    fn concurrent_pops_are_published_after_their_push() {
        let (stack, _, _) = stack();
        let bus = Arc::new(EventBus::new(1024));
        let mut rx = bus.subscribe();
        let stack = Arc::new(stack.with_events(bus));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let stack = Arc::clone(&stack);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        stack.push(named(&format!("t{t}-{i}"))).unwrap();
                        stack.pop().unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut pushed = std::collections::HashSet::new();
        let mut popped = 0;
        while let Ok(event) = rx.try_recv() {
            match event.as_ref() {
                MemoryEvent::ScopePushed { scope_id, .. } => {
                    pushed.insert(scope_id.clone());
                }
                MemoryEvent::ScopePopped { scope_id, .. } => {
                    assert!(pushed.contains(scope_id), "pop of {scope_id} seen before its push");
                    popped += 1;
                }
                _ => {}
            }
        }
        assert_eq!((pushed.len(), popped), (200, 200));
    }
}
