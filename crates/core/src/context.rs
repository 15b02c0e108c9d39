//! Context entries and the tiers that hold them.
//!
//! Every stored value lives in exactly one of four tiers. Tiers are ordered
//! `Archived < Cold < Warm < Hot`: promotion moves an entry one step toward
//! `Hot`, demotion one step toward `Archived`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Default significance assigned to an entry when the caller gives none.
pub const DEFAULT_SIGNIFICANCE: f64 = 1.0;

/// One of the four storage tiers.
///
/// Variant order is the promotion order, so the derived `Ord` gives
/// `Archived < Cold < Warm < Hot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Archived,
    Cold,
    Warm,
    #[default]
    Hot,
}

impl Tier {
    /// Lookup order used by retrieval and search: hottest first.
    pub const SCAN_ORDER: [Tier; 4] = [Tier::Hot, Tier::Warm, Tier::Cold, Tier::Archived];

    /// Tiers that take part in value deduplication.
    pub const DEDUP_ORDER: [Tier; 3] = [Tier::Hot, Tier::Warm, Tier::Cold];

    /// The next tier toward `Hot`, or `None` if already there.
    pub fn promoted(self) -> Option<Tier> {
        match self {
            Tier::Archived => Some(Tier::Cold),
            Tier::Cold => Some(Tier::Warm),
            Tier::Warm => Some(Tier::Hot),
            Tier::Hot => None,
        }
    }

    /// The next tier toward `Archived`, or `None` if already there.
    pub fn demoted(self) -> Option<Tier> {
        match self {
            Tier::Hot => Some(Tier::Warm),
            Tier::Warm => Some(Tier::Cold),
            Tier::Cold => Some(Tier::Archived),
            Tier::Archived => None,
        }
    }

    /// Stable slot index, used for array-backed tier storage.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Hot => "hot",
            Tier::Warm => "warm",
            Tier::Cold => "cold",
            Tier::Archived => "archived",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(Tier::Hot),
            "warm" => Ok(Tier::Warm),
            "cold" => Ok(Tier::Cold),
            "archived" => Ok(Tier::Archived),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

/// A single stored context value plus its access metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Lookup key, unique within the tier that holds the entry
    pub key: String,

    /// The caller's opaque value
    pub value: Value,

    /// When the entry was stored
    pub created_at: DateTime<Utc>,

    /// Number of successful retrievals
    #[serde(default)]
    pub access_count: u32,

    /// When the entry was last retrieved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,

    /// Caller-assigned importance weight
    #[serde(default = "default_significance")]
    pub significance: f64,
}

fn default_significance() -> f64 {
    DEFAULT_SIGNIFICANCE
}

impl ContextEntry {
    /// Create a fresh, never-accessed entry stamped with the current time.
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
            created_at: Utc::now(),
            access_count: 0,
            last_accessed_at: None,
            significance: DEFAULT_SIGNIFICANCE,
        }
    }

    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Record one retrieval.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed_at = Some(now);
    }
}

/// Options accepted by a store operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Target tier; the store's configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,

    /// Importance weight; `DEFAULT_SIGNIFICANCE` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub significance: Option<f64>,
}

impl StoreOptions {
    pub fn in_tier(tier: Tier) -> Self {
        Self {
            tier: Some(tier),
            significance: None,
        }
    }

    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = Some(significance);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tier_ordering_matches_promotion_order() {
        assert!(Tier::Archived < Tier::Cold);
        assert!(Tier::Cold < Tier::Warm);
        assert!(Tier::Warm < Tier::Hot);
        assert_eq!(Tier::default(), Tier::Hot);
    }

    #[test]
    fn promotion_is_one_step() {
        assert_eq!(Tier::Archived.promoted(), Some(Tier::Cold));
        assert_eq!(Tier::Cold.promoted(), Some(Tier::Warm));
        assert_eq!(Tier::Warm.promoted(), Some(Tier::Hot));
        assert_eq!(Tier::Hot.promoted(), None);
        assert_eq!(Tier::Hot.demoted(), Some(Tier::Warm));
        assert_eq!(Tier::Archived.demoted(), None);
    }

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("COLD".parse::<Tier>(), Ok(Tier::Cold));
        assert_eq!(" archived ".parse::<Tier>(), Ok(Tier::Archived));
        assert!("lukewarm".parse::<Tier>().is_err());
    }

    #[test]
    fn tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Warm).unwrap(), "\"warm\"");
        let t: Tier = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(t, Tier::Archived);
    }

    #[test]
    fn new_entry_defaults() {
        let entry = ContextEntry::new("k1", json!({"a": 1}));
        assert_eq!(entry.access_count, 0);
        assert!(entry.last_accessed_at.is_none());
        assert_eq!(entry.significance, DEFAULT_SIGNIFICANCE);
    }

    #[test]
    fn touch_updates_access_metadata() {
        let mut entry = ContextEntry::new("k1", json!(1));
        let now = Utc::now();
        entry.touch(now);
        entry.touch(now);
        assert_eq!(entry.access_count, 2);
        assert_eq!(entry.last_accessed_at, Some(now));
    }

    #[test]
    fn entry_deserializes_with_missing_metadata() {
        let entry: ContextEntry = serde_json::from_value(json!({
            "key": "k",
            "value": [1, 2],
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(entry.access_count, 0);
        assert_eq!(entry.significance, 1.0);
    }
}
