//! invar Core Library
//!
//! Shared domain types and the error taxonomy for the invar
//! synchronization engine.
//!
//! # Modules
//!
//! - [`types`] - Domain types (sources, records, mappings, schedules, health)
//! - [`error`] - Engine-wide error taxonomy ([`SyncError`])

pub mod error;
pub mod types;

// Re-export main types for convenient access
pub use error::{SyncError, SyncResult};
pub use types::{
    ConnectionHealth, HealthStatus, Mapping, MatchType, SourceRecord, SourceType, SyncRunStatus,
    SyncSchedule, ALLOWED_SYNC_INTERVALS, DEFAULT_SYNC_INTERVAL_MINUTES,
};
