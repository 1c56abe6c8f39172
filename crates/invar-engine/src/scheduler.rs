//! Per-source sync timers.
//!
//! Owns one cancellable tokio task per source in an explicit registry —
//! instance state, never process-global — so `initialize_on_startup` and
//! `shutdown` are deterministic and testable. Each tick spawns the cycle
//! as a detached task: canceling a timer stops future firings without
//! aborting a cycle already in progress.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use invar_core::error::{SyncError, SyncResult};
use invar_core::types::{SourceType, SyncSchedule, ALLOWED_SYNC_INTERVALS};

use crate::executor::SyncExecutor;
use crate::store::InventoryStore;

/// Starts, stops and reconfigures the per-source sync timers.
pub struct SyncScheduler {
    store: Arc<dyn InventoryStore>,
    executor: Arc<SyncExecutor>,
    timers: Mutex<HashMap<SourceType, JoinHandle<()>>>,
}

impl SyncScheduler {
    /// Create a scheduler with no timers running.
    #[must_use]
    pub fn new(store: Arc<dyn InventoryStore>, executor: Arc<SyncExecutor>) -> Self {
        Self {
            store,
            executor,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Current schedule for a source, lazily created.
    pub async fn get_schedule(&self, source_type: SourceType) -> SyncResult<SyncSchedule> {
        Ok(self.store.schedule_or_default(source_type).await?)
    }

    /// Current schedule for every known source.
    pub async fn get_all_schedules(&self) -> SyncResult<Vec<SyncSchedule>> {
        let mut schedules = Vec::with_capacity(SourceType::ALL.len());
        for source_type in SourceType::ALL {
            schedules.push(self.store.schedule_or_default(source_type).await?);
        }
        Ok(schedules)
    }

    /// Reconfigure a source's schedule and its timer.
    ///
    /// Rejects intervals outside [`ALLOWED_SYNC_INTERVALS`]. Enabling
    /// computes the next due time and (re)starts the timer at the new
    /// interval, canceling any prior timer first; disabling cancels the
    /// timer and clears the due time.
    #[instrument(skip(self))]
    pub async fn update_schedule(
        &self,
        source_type: SourceType,
        enabled: bool,
        interval_minutes: Option<u32>,
    ) -> SyncResult<SyncSchedule> {
        if let Some(minutes) = interval_minutes {
            if !SyncSchedule::is_valid_interval(minutes) {
                return Err(SyncError::validation(format!(
                    "interval must be one of {ALLOWED_SYNC_INTERVALS:?} minutes, got {minutes}"
                )));
            }
        }

        let mut schedule = self.store.schedule_or_default(source_type).await?;
        schedule.enabled = enabled;
        if let Some(minutes) = interval_minutes {
            schedule.interval_minutes = minutes;
        }
        schedule.next_sync_at = schedule.compute_next_sync(Utc::now());
        self.store.put_schedule(&schedule).await?;

        self.cancel_timer(source_type).await;
        if enabled {
            self.start_timer(source_type, schedule.interval()).await;
        }

        info!(
            source = %source_type,
            enabled,
            interval_minutes = schedule.interval_minutes,
            "schedule updated"
        );
        Ok(schedule)
    }

    /// Start timers for every enabled schedule. Called once at process
    /// start.
    pub async fn initialize_on_startup(&self) -> SyncResult<()> {
        for source_type in SourceType::ALL {
            let schedule = self.store.schedule_or_default(source_type).await?;
            if schedule.enabled {
                self.cancel_timer(source_type).await;
                self.start_timer(source_type, schedule.interval()).await;
                info!(
                    source = %source_type,
                    interval_minutes = schedule.interval_minutes,
                    "sync timer started"
                );
            }
        }
        Ok(())
    }

    /// Cancel every timer. No tick fires after this returns; cycles
    /// already in flight run to completion in their own tasks.
    pub async fn shutdown(&self) {
        let handles: Vec<(SourceType, JoinHandle<()>)> =
            self.timers.lock().await.drain().collect();
        for (source_type, handle) in handles {
            handle.abort();
            let _ = handle.await;
            debug!(source = %source_type, "sync timer stopped");
        }
        info!("scheduler shut down");
    }

    async fn start_timer(&self, source_type: SourceType, period: Duration) {
        let executor = Arc::clone(&self.executor);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                let executor = Arc::clone(&executor);
                // Detached so a cancelled timer never aborts a cycle
                // mid-flight.
                tokio::spawn(async move {
                    match executor.trigger_sync(source_type).await {
                        Ok(outcome) => {
                            debug!(
                                source = %source_type,
                                status = %outcome.status,
                                "scheduled sync finished"
                            );
                        }
                        // A failed tick must never stop the timer; the
                        // next tick gets a fresh attempt.
                        Err(e) => {
                            warn!(source = %source_type, error = %e, "scheduled sync failed");
                        }
                    }
                });
            }
        });

        if let Some(old) = self.timers.lock().await.insert(source_type, handle) {
            old.abort();
        }
    }

    async fn cancel_timer(&self, source_type: SourceType) {
        if let Some(handle) = self.timers.lock().await.remove(&source_type) {
            handle.abort();
            let _ = handle.await;
            debug!(source = %source_type, "sync timer cancelled");
        }
    }
}
