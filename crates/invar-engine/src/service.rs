//! Caller-facing engine facade.
//!
//! One constructor-injected struct wiring the store, adapters, executor,
//! scheduler, health monitor and statistics; the excluded API layer
//! talks to this and nothing else.

use std::sync::Arc;

use tracing::{info, instrument};

use invar_connector::SourceRegistry;
use invar_core::error::{SyncError, SyncResult};
use invar_core::types::{ConnectionHealth, Mapping, SourceType, SyncSchedule};

use crate::executor::{SyncExecutor, SyncOutcome};
use crate::health::{HealthConfig, HealthMonitor};
use crate::reconcile::{MatchConfig, Reconciler};
use crate::scheduler::SyncScheduler;
use crate::stats::{MatchingStats, OverviewStats, StatisticsAggregator};
use crate::store::{InventoryStore, MappingFilter};

/// The synchronization engine behind the API layer.
pub struct SyncService {
    store: Arc<dyn InventoryStore>,
    scheduler: SyncScheduler,
    executor: Arc<SyncExecutor>,
    health: Arc<HealthMonitor>,
    stats: StatisticsAggregator,
}

impl SyncService {
    /// Wire the engine with default configuration.
    #[must_use]
    pub fn new(store: Arc<dyn InventoryStore>, sources: SourceRegistry) -> Self {
        Self::with_configs(
            store,
            sources,
            HealthConfig::default(),
            MatchConfig::default(),
        )
    }

    /// Wire the engine with custom health and matching configuration.
    #[must_use]
    pub fn with_configs(
        store: Arc<dyn InventoryStore>,
        sources: SourceRegistry,
        health_config: HealthConfig,
        match_config: MatchConfig,
    ) -> Self {
        let health = Arc::new(HealthMonitor::with_config(
            Arc::clone(&store),
            sources.clone(),
            health_config,
        ));
        let reconciler = Reconciler::with_config(Arc::clone(&store), match_config);
        let executor = Arc::new(SyncExecutor::new(
            Arc::clone(&store),
            sources,
            reconciler,
            Arc::clone(&health),
        ));
        let scheduler = SyncScheduler::new(Arc::clone(&store), Arc::clone(&executor));
        let stats = StatisticsAggregator::new(Arc::clone(&store));

        Self {
            store,
            scheduler,
            executor,
            health,
            stats,
        }
    }

    /// Start timers for every enabled schedule. Call once at process
    /// start.
    pub async fn initialize_on_startup(&self) -> SyncResult<()> {
        self.scheduler.initialize_on_startup().await
    }

    /// Cancel every timer. Call once at process stop.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }

    /// Current schedule for a source.
    pub async fn get_schedule(&self, source_type: SourceType) -> SyncResult<SyncSchedule> {
        self.scheduler.get_schedule(source_type).await
    }

    /// Current schedule for every known source.
    pub async fn get_all_schedules(&self) -> SyncResult<Vec<SyncSchedule>> {
        self.scheduler.get_all_schedules().await
    }

    /// Reconfigure a source's schedule and timer.
    pub async fn update_schedule(
        &self,
        source_type: SourceType,
        enabled: bool,
        interval_minutes: Option<u32>,
    ) -> SyncResult<SyncSchedule> {
        self.scheduler
            .update_schedule(source_type, enabled, interval_minutes)
            .await
    }

    /// Run one sync cycle for a source, now.
    pub async fn trigger_sync(&self, source_type: SourceType) -> SyncResult<SyncOutcome> {
        self.executor.trigger_sync(source_type).await
    }

    /// Health snapshot for every known source.
    pub async fn get_all_health(&self) -> SyncResult<Vec<ConnectionHealth>> {
        self.health.get_all_health().await
    }

    /// Probe one source and persist the classified result.
    pub async fn check_health(&self, source_type: SourceType) -> SyncResult<ConnectionHealth> {
        self.health.check_health(source_type).await
    }

    /// Probe every registered source.
    pub async fn check_all_health(&self) -> Vec<ConnectionHealth> {
        self.health.check_all_health().await
    }

    /// Totals and match coverage.
    pub async fn get_overview_stats(&self) -> SyncResult<OverviewStats> {
        self.stats.overview_stats().await
    }

    /// Match-state breakdown with confidence buckets.
    pub async fn get_matching_stats(&self) -> SyncResult<MatchingStats> {
        self.stats.matching_stats().await
    }

    /// Mappings passing the filter.
    pub async fn list_mappings(&self, filter: &MappingFilter) -> SyncResult<Vec<Mapping>> {
        Ok(self.store.list_mappings(filter).await?)
    }

    /// Record a human match decision for an azure record. The
    /// reconciler never alters it afterwards.
    #[instrument(skip(self))]
    pub async fn set_manual_mapping(
        &self,
        azure_record_id: &str,
        legacy_record_id: Option<String>,
    ) -> SyncResult<Mapping> {
        let azure = self.store.list_records(SourceType::Azure).await?;
        if !azure.iter().any(|r| r.source_id == azure_record_id) {
            return Err(SyncError::validation(format!(
                "unknown azure record id: {azure_record_id}"
            )));
        }
        if let Some(legacy_id) = &legacy_record_id {
            let legacy = self.store.list_records(SourceType::Legacy).await?;
            if !legacy.iter().any(|r| &r.source_id == legacy_id) {
                return Err(SyncError::validation(format!(
                    "unknown legacy record id: {legacy_id}"
                )));
            }
        }

        let mut mapping = Mapping::manual(azure_record_id, legacy_record_id);
        let existing = self.store.list_mappings(&MappingFilter::default()).await?;
        if let Some(prev) = existing
            .iter()
            .find(|m| m.azure_record_id == azure_record_id)
        {
            mapping.id = prev.id;
            mapping.created_at = prev.created_at;
        }
        self.store.upsert_mapping(&mapping).await?;

        info!(azure_record_id, "manual mapping recorded");
        Ok(mapping)
    }

    /// Remove the mapping for an azure record, whatever its type. The
    /// next reconciliation pass recomputes an automatic row.
    pub async fn clear_mapping(&self, azure_record_id: &str) -> SyncResult<bool> {
        let existing = self.store.list_mappings(&MappingFilter::default()).await?;
        match existing
            .iter()
            .find(|m| m.azure_record_id == azure_record_id)
        {
            Some(mapping) => {
                self.store.delete_mapping(mapping.id).await?;
                info!(azure_record_id, "mapping cleared");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
