//! Context graph records: nodes for pushed scopes, edges for parent links.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scope::ScopeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    Scope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeType {
    ParentChild,
}

/// A graph node holding a snapshot of the frame taken at push time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: ScopeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub data: Value,
}

/// A directed edge `from -> to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: ScopeId,
    pub to: ScopeId,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
}
