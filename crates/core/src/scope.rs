//! Scope frames: the entries of the hierarchical scope stack.
//!
//! A frame records which frame was on top when it was pushed. That link is a
//! lookup id, not an owning reference: the stack owns frame lifetime, and a
//! popped frame survives only as an archived context entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ScopeError;

/// Prefix of the context key a popped frame is archived under.
pub const ARCHIVE_KEY_PREFIX: &str = "scope_";

/// Unique identifier of a scope frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub String);

impl ScopeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The context key this scope is archived under once popped.
    pub fn archive_key(&self) -> String {
        format!("{ARCHIVE_KEY_PREFIX}{}", self.0)
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Describes the logical scope a frame belongs to.
///
/// Supplied by whatever selects the active scope (global, organisation or
/// project); the store never resolves scopes on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDescriptor {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub is_global: bool,

    #[serde(default)]
    pub is_org: bool,

    #[serde(default)]
    pub is_project: bool,
}

impl ScopeDescriptor {
    pub fn global() -> Self {
        Self {
            id: "global".into(),
            kind: "global".into(),
            is_global: true,
            is_org: false,
            is_project: false,
        }
    }

    pub fn org(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "org".into(),
            is_global: false,
            is_org: true,
            is_project: false,
        }
    }

    pub fn project(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "project".into(),
            is_global: false,
            is_org: false,
            is_project: true,
        }
    }
}

/// One entry of the scope stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeFrame {
    /// Unique frame ID
    pub id: ScopeId,

    /// Push sequence number; strictly increasing within one stack
    pub seq: u64,

    /// Caller-supplied configuration
    #[serde(default)]
    pub config: Map<String, Value>,

    /// Logical scope this frame was entered for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<ScopeDescriptor>,

    /// When the frame was pushed
    pub created_at: DateTime<Utc>,

    /// Frame that was on top of the stack at push time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ScopeId>,
}

impl ScopeFrame {
    pub fn new(seq: u64, config: Map<String, Value>, parent: Option<ScopeId>) -> Self {
        Self {
            id: ScopeId::new(),
            seq,
            config,
            descriptor: None,
            created_at: Utc::now(),
            parent,
        }
    }

    pub fn with_descriptor(mut self, descriptor: ScopeDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn archive_key(&self) -> String {
        self.id.archive_key()
    }

    /// The JSON form recorded in the context graph on push and archived on
    /// pop.
    pub fn snapshot(&self) -> Result<Value, ScopeError> {
        serde_json::to_value(self).map_err(|e| ScopeError::Snapshot {
            scope_id: self.id.to_string(),
            reason: e.to_string(),
        })
    }
}
