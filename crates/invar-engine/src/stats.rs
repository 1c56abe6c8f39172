//! Read-side statistics over the current store state.
//!
//! Pure derived metrics; nothing here mutates the store.

use std::sync::Arc;

use serde::Serialize;

use invar_core::error::SyncResult;
use invar_core::types::{MatchType, SourceType};

use crate::store::{InventoryStore, MappingFilter};

/// Totals and match coverage across both sides.
#[derive(Debug, Clone, Serialize)]
pub struct OverviewStats {
    /// Azure-side record total.
    pub azure_total: usize,
    /// Legacy-side record total.
    pub legacy_total: usize,
    /// Mappings linking the two sides (auto or manual).
    pub matched_count: usize,
    /// Azure records without a match.
    pub unmatched_azure: usize,
    /// Legacy records without a match.
    pub unmatched_legacy: usize,
    /// Percentage of azure records matched, one decimal place; 0.0 when
    /// the azure side is empty.
    pub match_percentage: f64,
}

/// Confidence buckets over automatic mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfidenceDistribution {
    /// Confidence >= 0.9.
    pub high: usize,
    /// Confidence in [0.7, 0.9).
    pub medium: usize,
    /// Confidence < 0.7.
    pub low: usize,
}

/// Match-state breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct MatchingStats {
    /// Automatic mappings.
    pub auto_matched: usize,
    /// Human-entered mappings.
    pub manual_matched: usize,
    /// Azure records without a legacy counterpart.
    pub unmatched: usize,
    /// Buckets partitioning `auto_matched` exactly.
    pub confidence_distribution: ConfidenceDistribution,
}

/// Read-only aggregation over the canonical store.
pub struct StatisticsAggregator {
    store: Arc<dyn InventoryStore>,
}

impl StatisticsAggregator {
    /// Create a new aggregator.
    #[must_use]
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Totals and match coverage for the status view.
    pub async fn overview_stats(&self) -> SyncResult<OverviewStats> {
        let azure_total = self.store.list_records(SourceType::Azure).await?.len();
        let legacy_total = self.store.list_records(SourceType::Legacy).await?.len();
        let mappings = self.store.list_mappings(&MappingFilter::default()).await?;
        let matched_count = mappings.iter().filter(|m| m.is_matched()).count();

        // The two sides can have different unmatched semantics, so each
        // is computed independently against the shared matched count.
        let unmatched_azure = azure_total.saturating_sub(matched_count);
        let unmatched_legacy = legacy_total.saturating_sub(matched_count);

        let match_percentage = if azure_total == 0 {
            0.0
        } else {
            round_one_decimal(matched_count as f64 / azure_total as f64 * 100.0)
        };

        Ok(OverviewStats {
            azure_total,
            legacy_total,
            matched_count,
            unmatched_azure,
            unmatched_legacy,
            match_percentage,
        })
    }

    /// Match-state breakdown with confidence buckets.
    pub async fn matching_stats(&self) -> SyncResult<MatchingStats> {
        let mappings = self.store.list_mappings(&MappingFilter::default()).await?;

        let mut stats = MatchingStats {
            auto_matched: 0,
            manual_matched: 0,
            unmatched: 0,
            confidence_distribution: ConfidenceDistribution::default(),
        };

        for mapping in &mappings {
            match mapping.match_type {
                MatchType::Auto => {
                    stats.auto_matched += 1;
                    if mapping.confidence >= 0.9 {
                        stats.confidence_distribution.high += 1;
                    } else if mapping.confidence >= 0.7 {
                        stats.confidence_distribution.medium += 1;
                    } else {
                        stats.confidence_distribution.low += 1;
                    }
                }
                MatchType::Manual => stats.manual_matched += 1,
                MatchType::Unmatched => stats.unmatched += 1,
            }
        }

        Ok(stats)
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use invar_core::types::{Mapping, SourceRecord};

    #[test]
    fn test_round_one_decimal() {
        assert!((round_one_decimal(66.666) - 66.7).abs() < 1e-9);
        assert!((round_one_decimal(90.0) - 90.0).abs() < 1e-9);
        assert!((round_one_decimal(0.04) - 0.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_overview_empty_azure_is_zero_percent() {
        let store = Arc::new(MemoryStore::new());
        let stats = StatisticsAggregator::new(store);

        let overview = stats.overview_stats().await.unwrap();
        assert_eq!(overview.azure_total, 0);
        assert!((overview.match_percentage - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_confidence_buckets_partition_auto() {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_mapping(&Mapping::auto("vm-1", "l-1", 0.95))
            .await
            .unwrap();
        store
            .upsert_mapping(&Mapping::auto("vm-2", "l-2", 0.9))
            .await
            .unwrap();
        store
            .upsert_mapping(&Mapping::auto("vm-3", "l-3", 0.7))
            .await
            .unwrap();
        store
            .upsert_mapping(&Mapping::manual("vm-4", Some("l-4".to_string())))
            .await
            .unwrap();
        store
            .upsert_mapping(&Mapping::unmatched("vm-5", 0.3))
            .await
            .unwrap();

        let stats = StatisticsAggregator::new(store).matching_stats().await.unwrap();
        assert_eq!(stats.auto_matched, 3);
        assert_eq!(stats.manual_matched, 1);
        assert_eq!(stats.unmatched, 1);
        // 0.9 lands in high, 0.7 in medium; buckets sum to auto_matched.
        assert_eq!(
            stats.confidence_distribution,
            ConfidenceDistribution {
                high: 2,
                medium: 1,
                low: 0
            }
        );
    }

    #[tokio::test]
    async fn test_overview_unmatched_per_side() {
        let store = Arc::new(MemoryStore::new());
        store
            .replace_records(
                SourceType::Azure,
                (1..=3)
                    .map(|i| SourceRecord::new(SourceType::Azure, format!("vm-{i}"), "m"))
                    .collect(),
            )
            .await
            .unwrap();
        store
            .replace_records(
                SourceType::Legacy,
                vec![SourceRecord::new(SourceType::Legacy, "l-1", "m")],
            )
            .await
            .unwrap();
        store
            .upsert_mapping(&Mapping::auto("vm-1", "l-1", 0.8))
            .await
            .unwrap();

        let overview = StatisticsAggregator::new(store).overview_stats().await.unwrap();
        assert_eq!(overview.matched_count, 1);
        assert_eq!(overview.unmatched_azure, 2);
        // Legacy side clamps at zero instead of going negative.
        assert_eq!(overview.unmatched_legacy, 0);
        assert!((overview.match_percentage - 33.3).abs() < 1e-9);
    }
}
