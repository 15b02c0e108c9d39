//! Context graph: append-only record of pushed scopes and their parents.

use hypermind_core::graph::{EdgeType, GraphEdge, GraphNode, NodeType};
use hypermind_core::scope::{ScopeFrame, ScopeId};
use serde_json::Value;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::canonical::canonical_json;

/// A graph search hit: node id and the snapshot it recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphMatch {
    pub key: ScopeId,
    pub value: Value,
}

#[derive(Debug, Default)]
struct GraphState {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

/// Nodes and edges only ever get appended; `clear` exists for teardown.
#[derive(Debug, Default)]
pub struct ContextGraph {
    state: RwLock<GraphState>,
}

impl ContextGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, GraphState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a node for `frame` holding `data`, its snapshot.
    pub fn add_node(&self, frame: &ScopeFrame, data: Value) {
        let node = scope_node(frame, data);
        self.write().nodes.push(node);
    }

    /// Append a `parent -> frame` edge if the frame has a parent.
    pub fn add_edge_if_parent(&self, frame: &ScopeFrame) -> bool {
        match parent_edge(frame) {
            Some(edge) => {
                self.write().edges.push(edge);
                true
            }
            None => false,
        }
    }

    /// Record a push: the node holding `data` and, when there is a parent,
    /// its edge, under one write guard.
    pub fn record_push(&self, frame: &ScopeFrame, data: Value) {
        let node = scope_node(frame, data);
        let edge = parent_edge(frame);
        let mut state = self.write();
        state.nodes.push(node);
        if let Some(edge) = edge {
            state.edges.push(edge);
        }
        debug!(
            scope_id = %frame.id,
            nodes = state.nodes.len(),
            edges = state.edges.len(),
            "Recorded scope in context graph"
        );
    }

    /// Nodes whose serialized snapshot contains `term`, in insertion order.
    ///
    /// A flat scan over node data; edges are not followed.
    pub fn traverse_search(&self, term: &str) -> Vec<GraphMatch> {
        self.read()
            .nodes
            .iter()
            .filter(|node| canonical_json(&node.data).contains(term))
            .map(|node| GraphMatch {
                key: node.id.clone(),
                value: node.data.clone(),
            })
            .collect()
    }

    pub fn nodes(&self) -> Vec<GraphNode> {
        self.read().nodes.clone()
    }

    pub fn edges(&self) -> Vec<GraphEdge> {
        self.read().edges.clone()
    }

    pub fn node_count(&self) -> usize {
        self.read().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.read().edges.len()
    }

    /// Ids of every scope pushed while `id` was on top.
    pub fn children_of(&self, id: &ScopeId) -> Vec<ScopeId> {
        self.read()
            .edges
            .iter()
            .filter(|edge| &edge.from == id)
            .map(|edge| edge.to.clone())
            .collect()
    }

    pub fn parent_of(&self, id: &ScopeId) -> Option<ScopeId> {
        self.read()
            .edges
            .iter()
            .find(|edge| &edge.to == id)
            .map(|edge| edge.from.clone())
    }

    pub fn clear(&self) {
        let mut state = self.write();
        state.nodes.clear();
        state.edges.clear();
    }
}

fn scope_node(frame: &ScopeFrame, data: Value) -> GraphNode {
    GraphNode {
        id: frame.id.clone(),
        node_type: NodeType::Scope,
        data,
    }
}

fn parent_edge(frame: &ScopeFrame) -> Option<GraphEdge> {
    frame.parent.as_ref().map(|parent| GraphEdge {
        from: parent.clone(),
        to: frame.id.clone(),
        edge_type: EdgeType::ParentChild,
    })
}
