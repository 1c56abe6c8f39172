//! Per-source sync cycle execution.
//!
//! One cycle: mark running, fetch, persist records, reconcile, refresh
//! the machine count, finalize the schedule. Failure at any step is
//! captured into the schedule; nothing escapes past `trigger_sync`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use invar_connector::{InventorySource, SourceRegistry};
use invar_core::error::{SyncError, SyncResult};
use invar_core::types::{SourceType, SyncRunStatus};

use crate::health::HealthMonitor;
use crate::reconcile::Reconciler;
use crate::store::InventoryStore;

/// Result of one sync cycle, mirrored into the persisted schedule.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    /// Source the cycle ran for.
    pub source_type: SourceType,
    /// Final cycle status; never `Running`.
    pub status: SyncRunStatus,
    /// Records fetched, when the cycle succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_synced: Option<i64>,
    /// Wall-clock cycle duration.
    pub duration_ms: u64,
    /// Captured failure, when the cycle failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Next due time per the post-cycle schedule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_sync_at: Option<DateTime<Utc>>,
}

/// Runs sync cycles, one at a time per source.
pub struct SyncExecutor {
    store: Arc<dyn InventoryStore>,
    sources: SourceRegistry,
    reconciler: Reconciler,
    health: Arc<HealthMonitor>,
    /// Sources with a cycle in flight. Guarded check-and-set makes a
    /// manual trigger racing a timer tick resolve to exactly one cycle.
    in_flight: Mutex<HashSet<SourceType>>,
}

impl SyncExecutor {
    /// Create a new executor.
    #[must_use]
    pub fn new(
        store: Arc<dyn InventoryStore>,
        sources: SourceRegistry,
        reconciler: Reconciler,
        health: Arc<HealthMonitor>,
    ) -> Self {
        Self {
            store,
            sources,
            reconciler,
            health,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Run one sync cycle for a source.
    ///
    /// Returns [`SyncError::ConcurrentSync`] without fetching when a
    /// cycle is already in flight for this source. Source failures are
    /// encoded in the returned outcome, not raised.
    #[instrument(skip(self))]
    pub async fn trigger_sync(&self, source_type: SourceType) -> SyncResult<SyncOutcome> {
        let adapter = self
            .sources
            .get(source_type)
            .ok_or(SyncError::SourceNotRegistered { source_type })?;

        if !self.begin(source_type) {
            debug!(source = %source_type, "sync already in flight");
            return Err(SyncError::ConcurrentSync { source_type });
        }

        let result = self.run_cycle(source_type, adapter).await;
        self.finish(source_type);
        result
    }

    /// Atomically claim the in-flight slot for a source.
    fn begin(&self, source_type: SourceType) -> bool {
        self.in_flight
            .lock()
            .map(|mut set| set.insert(source_type))
            .unwrap_or(false)
    }

    /// Release the in-flight slot.
    fn finish(&self, source_type: SourceType) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&source_type);
        }
    }

    async fn run_cycle(
        &self,
        source_type: SourceType,
        adapter: Arc<dyn InventorySource>,
    ) -> SyncResult<SyncOutcome> {
        let started = Instant::now();

        let mut schedule = self.store.schedule_or_default(source_type).await?;
        schedule.last_sync_status = Some(SyncRunStatus::Running);
        schedule.last_sync_error = None;
        self.store.put_schedule(&schedule).await?;

        info!(source = %source_type, "sync cycle started");

        let (status, count, error) = match adapter.fetch_all().await {
            Ok(records) => {
                let count = records.len() as i64;
                match self.store.replace_records(source_type, records).await {
                    Ok(()) => {
                        if let Err(e) = self.reconciler.reconcile().await {
                            warn!(source = %source_type, error = %e, "reconciliation failed after sync");
                        }
                        if let Err(e) = self.health.update_machine_count(source_type, count).await {
                            warn!(source = %source_type, error = %e, "failed to refresh machine count");
                        }
                        (SyncRunStatus::Success, Some(count), None)
                    }
                    Err(e) => {
                        warn!(source = %source_type, error = %e, "failed to persist fetched records");
                        (SyncRunStatus::Failed, None, Some(e.to_string()))
                    }
                }
            }
            Err(e) => {
                warn!(source = %source_type, error = %e, "source fetch failed");
                let err = SyncError::SourceUnavailable {
                    source_type,
                    message: e.to_string(),
                };
                (SyncRunStatus::Failed, None, Some(err.to_string()))
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let now = Utc::now();

        // Finalize against the schedule as it is now, not the pre-fetch
        // snapshot: a reconfiguration racing this cycle must win for
        // enabled/interval.
        let mut schedule = self.store.schedule_or_default(source_type).await?;
        schedule.last_sync_status = Some(status);
        schedule.last_sync_at = Some(now);
        schedule.last_sync_duration_ms = Some(duration_ms);
        schedule.last_sync_error = error.clone();
        if count.is_some() {
            schedule.last_sync_count = count;
        }
        schedule.next_sync_at = schedule.compute_next_sync(now);
        self.store.put_schedule(&schedule).await?;

        info!(
            source = %source_type,
            status = %status,
            duration_ms,
            records = count.unwrap_or(0),
            "sync cycle finished"
        );

        Ok(SyncOutcome {
            source_type,
            status,
            records_synced: count,
            duration_ms,
            error,
            next_sync_at: schedule.next_sync_at,
        })
    }
}
