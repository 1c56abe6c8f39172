//! Mapping recomputation between the two canonical record sets.
//!
//! Runs after every successful sync. Manual mappings are immune: they are
//! never rescored, relinked, or deleted, and the legacy records they
//! consume are withheld from automatic matching.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use invar_core::error::SyncResult;
use invar_core::types::{Mapping, MatchType, SourceRecord, SourceType};

use crate::reconcile::scoring::{score_pair, MatchConfig};
use crate::store::{InventoryStore, MappingFilter};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileSummary {
    /// Azure records linked automatically.
    pub auto_matched: usize,
    /// Azure records left without a legacy counterpart.
    pub unmatched: usize,
    /// Manual mappings passed through untouched.
    pub manual_kept: usize,
    /// Rows written this pass (new or materially changed).
    pub updated: usize,
    /// Stale rows deleted this pass.
    pub removed: usize,
}

/// Recomputes the mapping set from current canonical records.
pub struct Reconciler {
    store: Arc<dyn InventoryStore>,
    config: MatchConfig,
}

impl Reconciler {
    /// Create a reconciler with the default match configuration.
    #[must_use]
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            store,
            config: MatchConfig::default(),
        }
    }

    /// Create with custom configuration.
    #[must_use]
    pub fn with_config(store: Arc<dyn InventoryStore>, config: MatchConfig) -> Self {
        Self { store, config }
    }

    /// Run a full reconciliation pass against the store.
    ///
    /// Reads last-committed record state for both sides; one side may be
    /// stale if its sync has not completed, which the next pass resolves.
    pub async fn reconcile(&self) -> SyncResult<ReconcileSummary> {
        let azure = self.store.list_records(SourceType::Azure).await?;
        let legacy = self.store.list_records(SourceType::Legacy).await?;
        let existing = self.store.list_mappings(&MappingFilter::default()).await?;

        let plan = compute_mappings(&azure, &legacy, &existing, &self.config);

        for id in &plan.deleted {
            self.store.delete_mapping(*id).await?;
        }
        for mapping in &plan.changed {
            self.store.upsert_mapping(mapping).await?;
        }

        let summary = ReconcileSummary {
            auto_matched: plan
                .mappings
                .iter()
                .filter(|m| m.match_type == MatchType::Auto)
                .count(),
            unmatched: plan
                .mappings
                .iter()
                .filter(|m| m.match_type == MatchType::Unmatched)
                .count(),
            manual_kept: plan
                .mappings
                .iter()
                .filter(|m| m.match_type == MatchType::Manual)
                .count(),
            updated: plan.changed.len(),
            removed: plan.deleted.len(),
        };

        info!(
            auto_matched = summary.auto_matched,
            unmatched = summary.unmatched,
            manual_kept = summary.manual_kept,
            updated = summary.updated,
            removed = summary.removed,
            "reconciliation pass finished"
        );

        Ok(summary)
    }
}

/// The recomputed mapping set plus the writes needed to reach it.
#[derive(Debug, Clone)]
pub(crate) struct MappingPlan {
    /// Full mapping set after the pass, ordered by azure record id.
    pub mappings: Vec<Mapping>,
    /// Rows needing an upsert (new or materially changed).
    pub changed: Vec<Mapping>,
    /// Stale auto/unmatched rows to delete.
    pub deleted: Vec<Uuid>,
}

/// Pure recomputation; deterministic for identical input.
pub(crate) fn compute_mappings(
    azure: &[SourceRecord],
    legacy: &[SourceRecord],
    existing: &[Mapping],
    config: &MatchConfig,
) -> MappingPlan {
    let manual: Vec<&Mapping> = existing
        .iter()
        .filter(|m| m.match_type == MatchType::Manual)
        .collect();
    let manual_azure: HashSet<&str> = manual
        .iter()
        .map(|m| m.azure_record_id.as_str())
        .collect();
    let consumed_legacy: HashSet<&str> = manual
        .iter()
        .filter_map(|m| m.legacy_record_id.as_deref())
        .collect();
    let existing_by_azure: HashMap<&str, &Mapping> = existing
        .iter()
        .filter(|m| m.match_type != MatchType::Manual)
        .map(|m| (m.azure_record_id.as_str(), m))
        .collect();
    let azure_present: HashSet<&str> = azure.iter().map(|r| r.source_id.as_str()).collect();

    let mut eligible_azure: Vec<&SourceRecord> = azure
        .iter()
        .filter(|r| !manual_azure.contains(r.source_id.as_str()))
        .collect();
    eligible_azure.sort_by(|a, b| a.source_id.cmp(&b.source_id));

    let mut eligible_legacy: Vec<&SourceRecord> = legacy
        .iter()
        .filter(|r| !consumed_legacy.contains(r.source_id.as_str()))
        .collect();
    eligible_legacy.sort_by(|a, b| a.source_id.cmp(&b.source_id));

    // Score every candidate pair; keep the best raw score per azure
    // record for the unmatched confidence.
    let mut best_score: HashMap<&str, f64> = HashMap::new();
    let mut pairs: Vec<(f64, &str, &str)> = Vec::new();
    for a in &eligible_azure {
        for l in &eligible_legacy {
            let score = score_pair(a, l, config);
            let entry = best_score.entry(a.source_id.as_str()).or_insert(0.0);
            if score > *entry {
                *entry = score;
            }
            if score >= config.auto_accept_threshold {
                pairs.push((score, a.source_id.as_str(), l.source_id.as_str()));
            }
        }
    }

    // Greedy one-to-one assignment: a legacy record consumed by a
    // higher-confidence match is unavailable to a lower one. Order is
    // fully deterministic: score desc, azure id asc, legacy id asc.
    pairs.sort_by(|x, y| {
        y.0.partial_cmp(&x.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| x.1.cmp(y.1))
            .then_with(|| x.2.cmp(y.2))
    });

    let mut assigned: HashMap<&str, (&str, f64)> = HashMap::new();
    let mut taken_legacy: HashSet<&str> = HashSet::new();
    for &(score, azure_id, legacy_id) in &pairs {
        if assigned.contains_key(azure_id) || taken_legacy.contains(legacy_id) {
            continue;
        }
        assigned.insert(azure_id, (legacy_id, score));
        taken_legacy.insert(legacy_id);
    }

    let now = Utc::now();
    let mut mappings: Vec<Mapping> = manual.iter().map(|m| (*m).clone()).collect();
    let mut changed: Vec<Mapping> = Vec::new();

    for a in &eligible_azure {
        let azure_id = a.source_id.as_str();
        let (match_type, legacy_id, confidence) = match assigned.get(azure_id) {
            Some((legacy_id, score)) => (MatchType::Auto, Some(*legacy_id), *score),
            None => (
                MatchType::Unmatched,
                None,
                best_score.get(azure_id).copied().unwrap_or(0.0),
            ),
        };

        match existing_by_azure.get(azure_id) {
            Some(prev) => {
                let unchanged = prev.match_type == match_type
                    && prev.legacy_record_id.as_deref() == legacy_id
                    && prev.confidence == confidence;
                if unchanged {
                    mappings.push((*prev).clone());
                } else {
                    let mut updated = (*prev).clone();
                    updated.match_type = match_type;
                    updated.legacy_record_id = legacy_id.map(str::to_string);
                    updated.confidence = confidence;
                    updated.updated_at = now;
                    changed.push(updated.clone());
                    mappings.push(updated);
                }
            }
            None => {
                let mapping = match legacy_id {
                    Some(legacy_id) => Mapping::auto(azure_id, legacy_id, confidence),
                    None => Mapping::unmatched(azure_id, confidence),
                };
                changed.push(mapping.clone());
                mappings.push(mapping);
            }
        }
    }

    let deleted: Vec<Uuid> = existing
        .iter()
        .filter(|m| {
            m.match_type != MatchType::Manual && !azure_present.contains(m.azure_record_id.as_str())
        })
        .map(|m| m.id)
        .collect();

    mappings.sort_by(|a, b| a.azure_record_id.cmp(&b.azure_record_id));
    debug!(
        total = mappings.len(),
        changed = changed.len(),
        deleted = deleted.len(),
        "mapping plan computed"
    );

    MappingPlan {
        mappings,
        changed,
        deleted,
    }
}
