//! Search router: sends a request to the tier store or the context graph
//! and returns hits in one shape.

use hypermind_core::search::{SearchHit, SearchRequest, SearchType};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::graph::ContextGraph;
use crate::tier_store::TierStore;

pub struct SearchRouter {
    store: Arc<TierStore>,
    graph: Arc<ContextGraph>,
}

impl SearchRouter {
    pub fn new(store: Arc<TierStore>, graph: Arc<ContextGraph>) -> Self {
        Self { store, graph }
    }

    /// Run `request`. Unknown search types return no hits.
    pub fn search(&self, request: &SearchRequest) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = match &request.search_type {
            SearchType::Chronological => self
                .store
                .search_chronological(&request.term)
                .into_iter()
                .map(|m| SearchHit {
                    key: m.key,
                    value: m.entry.value,
                    tier: Some(m.tier),
                    created_at: Some(m.entry.created_at),
                })
                .collect(),
            SearchType::Graph => self
                .graph
                .traverse_search(&request.term)
                .into_iter()
                .map(|m| SearchHit {
                    key: m.key.0,
                    value: m.value,
                    tier: None,
                    created_at: None,
                })
                .collect(),
            SearchType::Unknown(name) => {
                warn!(search_type = %name, "Unsupported search type, returning no results");
                Vec::new()
            }
        };

        if let Some(limit) = request.limit {
            hits.truncate(limit);
        }
        debug!(
            search_type = request.search_type.as_str(),
            term = %request.term,
            hits = hits.len(),
            "Search complete"
        );
        hits
    }
}
