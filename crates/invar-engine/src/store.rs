//! Canonical store contract and in-memory implementation.
//!
//! Storage engine internals are external to this system; every component
//! consumes [`InventoryStore`]. The crate ships [`MemoryStore`] for tests
//! and small single-process embeddings.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use invar_core::error::SyncError;
use invar_core::types::{
    ConnectionHealth, Mapping, MatchType, SourceRecord, SourceType, SyncSchedule,
};

/// Store failure, surfaced to callers as a persistence error.
#[derive(Debug, Error)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        SyncError::Persistence(err.to_string())
    }
}

/// Filter for mapping queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingFilter {
    /// Restrict to one match type.
    pub match_type: Option<MatchType>,
    /// Inclusive lower confidence bound.
    pub min_confidence: Option<f64>,
    /// Exclusive upper confidence bound.
    pub max_confidence: Option<f64>,
}

impl MappingFilter {
    /// Filter to a single match type.
    #[must_use]
    pub fn by_match_type(match_type: MatchType) -> Self {
        Self {
            match_type: Some(match_type),
            ..Self::default()
        }
    }

    /// Whether a mapping passes this filter.
    #[must_use]
    pub fn matches(&self, mapping: &Mapping) -> bool {
        if let Some(match_type) = self.match_type {
            if mapping.match_type != match_type {
                return false;
            }
        }
        if let Some(min) = self.min_confidence {
            if mapping.confidence < min {
                return false;
            }
        }
        if let Some(max) = self.max_confidence {
            if mapping.confidence >= max {
                return false;
            }
        }
        true
    }
}

/// Canonical store consumed by the engine.
///
/// Keyed by `(source_type, source_id)` for records, `source_type` for
/// schedules and health, and `id` for mappings.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Atomically replace the canonical record set for one source.
    async fn replace_records(
        &self,
        source_type: SourceType,
        records: Vec<SourceRecord>,
    ) -> StoreResult<()>;

    /// All records for one source, ordered by source id.
    async fn list_records(&self, source_type: SourceType) -> StoreResult<Vec<SourceRecord>>;

    /// Read the schedule row for a source.
    async fn get_schedule(&self, source_type: SourceType) -> StoreResult<Option<SyncSchedule>>;

    /// Write a schedule row.
    async fn put_schedule(&self, schedule: &SyncSchedule) -> StoreResult<()>;

    /// Read the health row for a source.
    async fn get_health(&self, source_type: SourceType) -> StoreResult<Option<ConnectionHealth>>;

    /// Write a health row.
    async fn put_health(&self, health: &ConnectionHealth) -> StoreResult<()>;

    /// Mappings passing the filter, ordered by azure record id.
    async fn list_mappings(&self, filter: &MappingFilter) -> StoreResult<Vec<Mapping>>;

    /// Insert or overwrite a mapping keyed by its id.
    async fn upsert_mapping(&self, mapping: &Mapping) -> StoreResult<()>;

    /// Remove a mapping; removing an unknown id is not an error.
    async fn delete_mapping(&self, id: Uuid) -> StoreResult<()>;

    /// Load a schedule, lazily creating the default row on first access.
    async fn schedule_or_default(&self, source_type: SourceType) -> StoreResult<SyncSchedule> {
        match self.get_schedule(source_type).await? {
            Some(schedule) => Ok(schedule),
            None => {
                let schedule = SyncSchedule::with_defaults(source_type);
                self.put_schedule(&schedule).await?;
                Ok(schedule)
            }
        }
    }

    /// Load a health row, lazily creating the default on first access.
    async fn health_or_default(&self, source_type: SourceType) -> StoreResult<ConnectionHealth> {
        match self.get_health(source_type).await? {
            Some(health) => Ok(health),
            None => {
                let health = ConnectionHealth::with_defaults(source_type);
                self.put_health(&health).await?;
                Ok(health)
            }
        }
    }
}

#[derive(Default)]
struct MemoryInner {
    records: HashMap<SourceType, BTreeMap<String, SourceRecord>>,
    schedules: HashMap<SourceType, SyncSchedule>,
    health: HashMap<SourceType, ConnectionHealth>,
    mappings: HashMap<Uuid, Mapping>,
}

/// In-memory canonical store.
///
/// Backs the test suites and small embeddings; production deployments
/// implement [`InventoryStore`] over their own storage.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn replace_records(
        &self,
        source_type: SourceType,
        records: Vec<SourceRecord>,
    ) -> StoreResult<()> {
        let set = records
            .into_iter()
            .map(|record| (record.source_id.clone(), record))
            .collect();
        self.inner.write().await.records.insert(source_type, set);
        Ok(())
    }

    async fn list_records(&self, source_type: SourceType) -> StoreResult<Vec<SourceRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .records
            .get(&source_type)
            .map(|set| set.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_schedule(&self, source_type: SourceType) -> StoreResult<Option<SyncSchedule>> {
        Ok(self.inner.read().await.schedules.get(&source_type).cloned())
    }

    async fn put_schedule(&self, schedule: &SyncSchedule) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .schedules
            .insert(schedule.source_type, schedule.clone());
        Ok(())
    }

    async fn get_health(&self, source_type: SourceType) -> StoreResult<Option<ConnectionHealth>> {
        Ok(self.inner.read().await.health.get(&source_type).cloned())
    }

    async fn put_health(&self, health: &ConnectionHealth) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .health
            .insert(health.source_type, health.clone());
        Ok(())
    }

    async fn list_mappings(&self, filter: &MappingFilter) -> StoreResult<Vec<Mapping>> {
        let mut mappings: Vec<Mapping> = self
            .inner
            .read()
            .await
            .mappings
            .values()
            .filter(|mapping| filter.matches(mapping))
            .cloned()
            .collect();
        mappings.sort_by(|a, b| a.azure_record_id.cmp(&b.azure_record_id));
        Ok(mappings)
    }

    async fn upsert_mapping(&self, mapping: &Mapping) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .mappings
            .insert(mapping.id, mapping.clone());
        Ok(())
    }

    async fn delete_mapping(&self, id: Uuid) -> StoreResult<()> {
        self.inner.write().await.mappings.remove(&id);
        Ok(())
    }
}
