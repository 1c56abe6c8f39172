//! Source availability monitoring.
//!
//! Probes each source independently, classifies the result and persists
//! the snapshot. Probe failure is data, not an error: it lands in the
//! health row and never propagates out of a check.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use invar_connector::SourceRegistry;
use invar_core::error::SyncResult;
use invar_core::types::{ConnectionHealth, HealthStatus, SourceType};

use crate::store::InventoryStore;

/// Configuration for health monitoring.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Probes slower than this are classified degraded (milliseconds).
    pub degraded_threshold_ms: u64,
    /// Timeout for probe requests (in seconds).
    pub probe_timeout_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            degraded_threshold_ms: 2000,
            probe_timeout_secs: 30,
        }
    }
}

/// Service for monitoring source availability.
pub struct HealthMonitor {
    store: Arc<dyn InventoryStore>,
    sources: SourceRegistry,
    config: HealthConfig,
}

impl HealthMonitor {
    /// Create a new health monitor.
    #[must_use]
    pub fn new(store: Arc<dyn InventoryStore>, sources: SourceRegistry) -> Self {
        Self {
            store,
            sources,
            config: HealthConfig::default(),
        }
    }

    /// Create with custom configuration.
    #[must_use]
    pub fn with_config(
        store: Arc<dyn InventoryStore>,
        sources: SourceRegistry,
        config: HealthConfig,
    ) -> Self {
        Self {
            store,
            sources,
            config,
        }
    }

    /// Probe one source and persist the classified result.
    ///
    /// Returns `Err` only on a store failure.
    #[instrument(skip(self))]
    pub async fn check_health(&self, source_type: SourceType) -> SyncResult<ConnectionHealth> {
        let mut health = self.store.health_or_default(source_type).await?;
        health.last_check_at = Some(chrono::Utc::now());

        match self.sources.get(source_type) {
            None => {
                health.status = HealthStatus::Down;
                health.response_time_ms = None;
                health.error = Some(format!("no adapter registered for source {source_type}"));
            }
            Some(adapter) => {
                let timeout = Duration::from_secs(self.config.probe_timeout_secs);
                match tokio::time::timeout(timeout, adapter.probe()).await {
                    Ok(Ok(rtt)) => {
                        let rtt_ms = rtt.as_millis() as u64;
                        health.status = if rtt_ms <= self.config.degraded_threshold_ms {
                            HealthStatus::Healthy
                        } else {
                            HealthStatus::Degraded
                        };
                        health.response_time_ms = Some(rtt_ms);
                        health.error = None;
                    }
                    Ok(Err(e)) => {
                        warn!(source = %source_type, error = %e, "health probe failed");
                        health.status = HealthStatus::Down;
                        health.response_time_ms = None;
                        health.error = Some(e.to_string());
                    }
                    Err(_) => {
                        warn!(
                            source = %source_type,
                            timeout_secs = self.config.probe_timeout_secs,
                            "health probe timed out"
                        );
                        health.status = HealthStatus::Down;
                        health.response_time_ms = None;
                        health.error = Some(format!(
                            "probe timed out after {}s",
                            self.config.probe_timeout_secs
                        ));
                    }
                }
            }
        }

        self.store.put_health(&health).await?;
        debug!(source = %source_type, status = %health.status, "health check recorded");
        Ok(health)
    }

    /// Check every registered source; one failure never aborts the rest.
    pub async fn check_all_health(&self) -> Vec<ConnectionHealth> {
        let mut results = Vec::new();
        for source_type in self.sources.source_types() {
            match self.check_health(source_type).await {
                Ok(health) => results.push(health),
                Err(e) => {
                    warn!(source = %source_type, error = %e, "health check failed to persist");
                }
            }
        }
        results
    }

    /// Current snapshot for one source, lazily created.
    pub async fn get_health(&self, source_type: SourceType) -> SyncResult<ConnectionHealth> {
        Ok(self.store.health_or_default(source_type).await?)
    }

    /// Current snapshot for every known source.
    pub async fn get_all_health(&self) -> SyncResult<Vec<ConnectionHealth>> {
        let mut results = Vec::with_capacity(SourceType::ALL.len());
        for source_type in SourceType::ALL {
            results.push(self.store.health_or_default(source_type).await?);
        }
        Ok(results)
    }

    /// Refresh the machine count after a successful sync; the probe
    /// classification is left alone.
    pub async fn update_machine_count(
        &self,
        source_type: SourceType,
        count: i64,
    ) -> SyncResult<()> {
        let mut health = self.store.health_or_default(source_type).await?;
        health.machine_count = Some(count);
        self.store.put_health(&health).await?;
        debug!(source = %source_type, count, "machine count refreshed");
        Ok(())
    }
}
