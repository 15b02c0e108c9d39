//! Search requests and the normalized hits every search mode returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Tier;

/// Which index a search runs against.
///
/// Unrecognized names are kept as `Unknown` rather than rejected; searching
/// with them yields no hits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SearchType {
    /// Substring match on stored keys, most recent first
    #[default]
    Chronological,
    /// Substring match on scope snapshots in the context graph
    Graph,
    Unknown(String),
}

impl SearchType {
    pub fn parse(name: &str) -> Self {
        match name {
            "chronological" => SearchType::Chronological,
            "graph" => SearchType::Graph,
            other => SearchType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SearchType::Chronological => "chronological",
            SearchType::Graph => "graph",
            SearchType::Unknown(name) => name,
        }
    }
}

impl From<String> for SearchType {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<SearchType> for String {
    fn from(search_type: SearchType) -> Self {
        search_type.as_str().to_string()
    }
}

/// A search over the store or the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub search_type: SearchType,

    /// Substring to look for
    pub term: String,

    /// Maximum number of hits, applied after ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl SearchRequest {
    pub fn chronological(term: impl Into<String>) -> Self {
        Self {
            search_type: SearchType::Chronological,
            term: term.into(),
            limit: None,
        }
    }

    pub fn graph(term: impl Into<String>) -> Self {
        Self {
            search_type: SearchType::Graph,
            term: term.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One search result, in the same shape for every search type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Entry key, or node id for graph hits
    pub key: String,

    /// Stored value, or node snapshot for graph hits
    pub value: Value,

    /// Tier holding the entry; `None` for graph hits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
