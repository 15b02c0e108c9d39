//! Tiered store: four ordered key/value tiers with access-driven promotion.
//!
//! Entries move between tiers, never get copied: a move removes the entry
//! from its source map and inserts it into the destination map under the
//! same write guard. Within a tier, entries are kept in key order, which is
//! also the order deduplication walks them in.

use chrono::{DateTime, Duration, Utc};
use hypermind_config::HyperMindConfig;
use hypermind_core::context::{ContextEntry, StoreOptions, Tier, DEFAULT_SIGNIFICANCE};
use hypermind_core::event::{EventBus, MemoryEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use crate::canonical::canonical_json;

// Ages beyond a century are treated as "never".
const MAX_DEMOTE_AFTER_HOURS: i64 = 100 * 365 * 24;

/// Thresholds that drive tier movement.
#[derive(Debug, Clone, PartialEq)]
pub struct TierPolicy {
    /// Tier used when a store names none.
    pub default_tier: Tier,
    /// Hot entries strictly older than this may be demoted.
    pub demote_after: Duration,
    /// Demotion only applies below this access count.
    pub demote_below_accesses: u32,
    /// Retrieval promotes once the access count exceeds this.
    pub promote_above_accesses: u32,
    /// Run `maintain` after every store.
    pub maintain_on_store: bool,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            default_tier: Tier::Hot,
            demote_after: Duration::hours(24),
            demote_below_accesses: 5,
            promote_above_accesses: 10,
            maintain_on_store: true,
        }
    }
}

impl From<&HyperMindConfig> for TierPolicy {
    fn from(config: &HyperMindConfig) -> Self {
        let hours = i64::try_from(config.maintenance.demote_after_hours)
            .unwrap_or(MAX_DEMOTE_AFTER_HOURS)
            .min(MAX_DEMOTE_AFTER_HOURS);
        Self {
            default_tier: config.tiers.default_tier,
            demote_after: Duration::hours(hours),
            demote_below_accesses: config.maintenance.demote_below_accesses,
            promote_above_accesses: config.maintenance.promote_above_accesses,
            maintain_on_store: config.maintenance.maintain_on_store,
        }
    }
}

/// A chronological search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct TierMatch {
    pub key: String,
    pub entry: ContextEntry,
    pub tier: Tier,
}

/// What one maintenance pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub demoted: usize,
    pub deduplicated: usize,
}

impl MaintenanceReport {
    pub fn is_noop(&self) -> bool {
        self.demoted == 0 && self.deduplicated == 0
    }
}

/// Entry counts per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStats {
    pub hot: usize,
    pub warm: usize,
    pub cold: usize,
    pub archived: usize,
}

impl TierStats {
    pub fn total(&self) -> usize {
        self.hot + self.warm + self.cold + self.archived
    }

    pub fn count(&self, tier: Tier) -> usize {
        match tier {
            Tier::Hot => self.hot,
            Tier::Warm => self.warm,
            Tier::Cold => self.cold,
            Tier::Archived => self.archived,
        }
    }
}

#[derive(Debug, Default)]
struct Tiers {
    slots: [BTreeMap<String, ContextEntry>; 4],
}

impl Tiers {
    fn slot(&self, tier: Tier) -> &BTreeMap<String, ContextEntry> {
        &self.slots[tier.index()]
    }

    fn slot_mut(&mut self, tier: Tier) -> &mut BTreeMap<String, ContextEntry> {
        &mut self.slots[tier.index()]
    }

    /// First tier in scan order holding `key`.
    fn locate(&self, key: &str) -> Option<Tier> {
        Tier::SCAN_ORDER
            .into_iter()
            .find(|tier| self.slot(*tier).contains_key(key))
    }

    /// Transfer `key` from one tier to another. Returns false if absent.
    fn move_entry(&mut self, key: &str, from: Tier, to: Tier) -> bool {
        match self.slot_mut(from).remove(key) {
            Some(entry) => {
                self.slot_mut(to).insert(key.to_string(), entry);
                true
            }
            None => false,
        }
    }
}

/// The tiered context store.
///
/// Thread-safe via a single `RwLock` over all four tiers; every mutating
/// operation (including retrieval, which may promote) takes the write lock.
pub struct TierStore {
    policy: TierPolicy,
    tiers: RwLock<Tiers>,
    events: Option<Arc<EventBus>>,
}

impl TierStore {
    /// Create an empty store with the given policy.
    pub fn new(policy: TierPolicy) -> Self {
        Self {
            policy,
            tiers: RwLock::new(Tiers::default()),
            events: None,
        }
    }

    /// Publish tier movements on `events`.
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Tiers> {
        self.tiers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tiers> {
        self.tiers.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: MemoryEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }

    // ── Store / retrieve ──────────────────────────────────────────────

    /// Insert `value` under `key` in the requested tier (default tier if
    /// none), replacing any entry with that key in the same tier only.
    ///
    /// Copies of the key in other tiers are left alone. Runs a maintenance
    /// pass afterwards when the policy asks for it.
    pub fn store(&self, key: impl Into<String>, value: Value, options: StoreOptions) {
        let key = key.into();
        let tier = options.tier.unwrap_or(self.policy.default_tier);
        let entry = ContextEntry::new(key.clone(), value)
            .with_significance(options.significance.unwrap_or(DEFAULT_SIGNIFICANCE));
        let now = entry.created_at;

        let mut tiers = self.write();
        if let Some(other) = Tier::SCAN_ORDER
            .into_iter()
            .find(|t| *t != tier && tiers.slot(*t).contains_key(&key))
        {
            warn!(key = %key, tier = %tier, existing = %other, "Key already stored in another tier");
        }
        tiers.slot_mut(tier).insert(key.clone(), entry);
        debug!(key = %key, tier = %tier, "Stored context entry");
        self.publish(MemoryEvent::EntryStored {
            key,
            tier,
            timestamp: now,
        });

        if self.policy.maintain_on_store {
            self.maintain_locked(&mut tiers, now);
        }
    }

    /// Look `key` up hottest tier first, record the access, and promote the
    /// entry one tier if it has become eligible.
    pub fn retrieve(&self, key: &str) -> Option<Value> {
        let now = Utc::now();
        let mut tiers = self.write();
        let tier = tiers.locate(key)?;
        let entry = tiers.slot_mut(tier).get_mut(key)?;
        entry.touch(now);
        let value = entry.value.clone();
        self.promote_locked(&mut tiers, key, tier, now);
        Some(value)
    }

    /// Look `key` up without recording an access.
    pub fn peek(&self, key: &str) -> Option<(Tier, ContextEntry)> {
        let tiers = self.read();
        let tier = tiers.locate(key)?;
        tiers.slot(tier).get(key).map(|entry| (tier, entry.clone()))
    }

    /// Tier currently holding `key`, hottest first.
    pub fn tier_of(&self, key: &str) -> Option<Tier> {
        self.read().locate(key)
    }

    /// Remove `key` from every tier. Returns the hottest removed entry.
    pub fn remove(&self, key: &str) -> Option<ContextEntry> {
        let mut tiers = self.write();
        let mut removed = None;
        for tier in Tier::SCAN_ORDER {
            if let Some(entry) = tiers.slot_mut(tier).remove(key) {
                debug!(key = %key, tier = %tier, "Removed context entry");
                removed.get_or_insert(entry);
            }
        }
        removed
    }

    // ── Promotion ─────────────────────────────────────────────────────

    /// Move `key` one tier up from `from_tier` if its access count is past
    /// the promotion threshold. Returns the tier it moved to.
    pub fn promote_if_eligible(&self, key: &str, from_tier: Tier) -> Option<Tier> {
        let mut tiers = self.write();
        self.promote_locked(&mut tiers, key, from_tier, Utc::now())
    }

    fn promote_locked(&self, tiers: &mut Tiers, key: &str, from: Tier, now: DateTime<Utc>) -> Option<Tier> {
        let to = from.promoted()?;
        let access_count = tiers.slot(from).get(key)?.access_count;
        if access_count <= self.policy.promote_above_accesses {
            return None;
        }
        if !tiers.move_entry(key, from, to) {
            return None;
        }
        debug!(key = %key, from = %from, to = %to, access_count, "Promoted context entry");
        self.publish(MemoryEvent::EntryPromoted {
            key: key.to_string(),
            from,
            to,
            timestamp: now,
        });
        Some(to)
    }

    // ── Search ────────────────────────────────────────────────────────

    /// Entries whose key contains `term`, newest first.
    ///
    /// Equal timestamps are ordered by key, then hotter tier first.
    pub fn search_chronological(&self, term: &str) -> Vec<TierMatch> {
        let tiers = self.read();
        let mut matches = Vec::new();
        for tier in Tier::SCAN_ORDER {
            for (key, entry) in tiers.slot(tier) {
                if key.contains(term) {
                    matches.push(TierMatch {
                        key: key.clone(),
                        entry: entry.clone(),
                        tier,
                    });
                }
            }
        }

        matches.sort_by(|a, b| {
            b.entry
                .created_at
                .cmp(&a.entry.created_at)
                .then_with(|| a.key.cmp(&b.key))
                .then_with(|| b.tier.cmp(&a.tier))
        });
        matches
    }

    // ── Maintenance ───────────────────────────────────────────────────

    /// Demote stale hot entries, then drop duplicate values.
    pub fn maintain(&self) -> MaintenanceReport {
        self.maintain_at(Utc::now())
    }

    /// Same as [`maintain`](Self::maintain), judging age against `now`.
    pub fn maintain_at(&self, now: DateTime<Utc>) -> MaintenanceReport {
        let mut tiers = self.write();
        self.maintain_locked(&mut tiers, now)
    }

    fn maintain_locked(&self, tiers: &mut Tiers, now: DateTime<Utc>) -> MaintenanceReport {
        let stale: Vec<String> = tiers
            .slot(Tier::Hot)
            .iter()
            .filter(|(_, entry)| {
                now - entry.created_at > self.policy.demote_after
                    && entry.access_count < self.policy.demote_below_accesses
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            tiers.move_entry(key, Tier::Hot, Tier::Warm);
            debug!(key = %key, "Demoted stale hot entry to warm");
            self.publish(MemoryEvent::EntryDemoted {
                key: key.clone(),
                from: Tier::Hot,
                to: Tier::Warm,
                timestamp: now,
            });
        }

        let report = MaintenanceReport {
            demoted: stale.len(),
            deduplicated: self.deduplicate_locked(tiers, now),
        };
        if !report.is_noop() {
            info!(demoted = report.demoted, deduplicated = report.deduplicated, "Maintenance pass complete");
        }
        report
    }

    /// Keep the first entry of every distinct value across hot, warm and
    /// cold; delete the rest. Archived entries are never touched.
    pub fn deduplicate(&self) -> usize {
        let mut tiers = self.write();
        self.deduplicate_locked(&mut tiers, Utc::now())
    }

    fn deduplicate_locked(&self, tiers: &mut Tiers, now: DateTime<Utc>) -> usize {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for tier in Tier::DEDUP_ORDER {
            for (key, entry) in tiers.slot(tier) {
                if !seen.insert(canonical_json(&entry.value)) {
                    duplicates.push((tier, key.clone()));
                }
            }
        }

        for (tier, key) in &duplicates {
            tiers.slot_mut(*tier).remove(key);
            debug!(key = %key, tier = %tier, "Dropped duplicate context entry");
        }

        if !duplicates.is_empty() {
            self.publish(MemoryEvent::EntriesDeduplicated {
                removed: duplicates.len(),
                timestamp: now,
            });
        }
        duplicates.len()
    }

    // ── Inspection / lifecycle ────────────────────────────────────────

    pub fn stats(&self) -> TierStats {
        let tiers = self.read();
        TierStats {
            hot: tiers.slot(Tier::Hot).len(),
            warm: tiers.slot(Tier::Warm).len(),
            cold: tiers.slot(Tier::Cold).len(),
            archived: tiers.slot(Tier::Archived).len(),
        }
    }

    /// Keys held by `tier`, in key order.
    pub fn keys(&self, tier: Tier) -> Vec<String> {
        self.read().slot(tier).keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.stats().total()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry in every tier.
    pub fn clear(&self) {
        let mut tiers = self.write();
        for slot in tiers.slots.iter_mut() {
            slot.clear();
        }
    }

    #[cfg(test)]
    fn insert_entry(&self, tier: Tier, entry: ContextEntry) {
        self.write().slot_mut(tier).insert(entry.key.clone(), entry);
    }
}

impl Default for TierStore {
    fn default() -> Self {
        Self::new(TierPolicy::default())
    }
}
