//! # invar Synchronization Engine
//!
//! Pulls machine inventory from two independent sources on per-source
//! timers, maintains a stable mapping between records that denote the
//! same machine, and tracks each source's availability.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐  tick / manual   ┌────────────────┐
//! │  SyncScheduler │─────────────────►│  SyncExecutor  │
//! │ (timer per     │                  │ (one cycle per │
//! │  source)       │                  │  source)       │
//! └────────────────┘                  └───────┬────────┘
//!                                             │ fetch via InventorySource
//!                                             ▼
//!                    ┌───────────────────────────────────┐
//!                    │          InventoryStore           │
//!                    └───┬───────────────┬───────────┬───┘
//!                        │               │           │
//!                        ▼               ▼           ▼
//!                ┌────────────┐  ┌───────────────┐  ┌──────────────────┐
//!                │ Reconciler │  │ HealthMonitor │  │ StatisticsAggre- │
//!                │ (mappings) │  │ (probes)      │  │ gator (read-only)│
//!                └────────────┘  └───────────────┘  └──────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use invar_connector::SourceRegistry;
//! use invar_core::types::SourceType;
//! use invar_engine::{MemoryStore, SyncService};
//!
//! let mut sources = SourceRegistry::new();
//! sources.register(azure_adapter);
//! sources.register(legacy_adapter);
//!
//! let service = SyncService::new(Arc::new(MemoryStore::new()), sources);
//! service.initialize_on_startup().await?;
//!
//! let outcome = service.trigger_sync(SourceType::Azure).await?;
//! let overview = service.get_overview_stats().await?;
//! ```

pub mod executor;
pub mod health;
pub mod reconcile;
pub mod scheduler;
pub mod service;
pub mod stats;
pub mod store;

// Re-exports for convenience
pub use executor::{SyncExecutor, SyncOutcome};
pub use health::{HealthConfig, HealthMonitor};
pub use reconcile::{MatchConfig, ReconcileSummary, Reconciler};
pub use scheduler::SyncScheduler;
pub use service::SyncService;
pub use stats::{ConfidenceDistribution, MatchingStats, OverviewStats, StatisticsAggregator};
pub use store::{InventoryStore, MappingFilter, MemoryStore, StoreError, StoreResult};
