//! Domain types shared across the invar workspace.
//!
//! Every status field is a closed enum so illegal states are
//! unrepresentable; wire-facing structs carry serde derives in the
//! snake_case conventions the API layer expects.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// The two inventory systems being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Cloud discovery service.
    Azure,
    /// Legacy database-backed inventory.
    Legacy,
}

impl SourceType {
    /// All known sources, in a stable iteration order.
    pub const ALL: [SourceType; 2] = [SourceType::Azure, SourceType::Legacy];

    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Azure => "azure",
            SourceType::Legacy => "legacy",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "azure" => Ok(SourceType::Azure),
            "legacy" => Ok(SourceType::Legacy),
            _ => Err(format!("Unknown source type: {s}")),
        }
    }
}

/// Normalized representation of one discovered machine from one source.
///
/// Created or overwritten on each successful sync for that source; an
/// upsert is atomic per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Which source discovered this machine.
    pub source_type: SourceType,
    /// Source-assigned identifier, opaque to the engine.
    pub source_id: String,
    /// Human-readable machine name.
    pub display_name: String,
    /// Raw attribute bag as returned by the adapter (`fqdn`,
    /// `ip_address`, `mac_address`, `bios_uuid`, `serial_number`, ...).
    #[serde(default)]
    pub attributes: Value,
}

impl SourceRecord {
    /// Create a record with an empty attribute bag.
    #[must_use]
    pub fn new(
        source_type: SourceType,
        source_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            source_type,
            source_id: source_id.into(),
            display_name: display_name.into(),
            attributes: Value::Null,
        }
    }

    /// Attach an attribute bag.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Value) -> Self {
        self.attributes = attributes;
        self
    }

    /// Look up a string attribute, treating blank values as absent.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

/// How a mapping between the two sides came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Accepted by the reconciler above the confidence threshold.
    Auto,
    /// Entered or confirmed by a human; never touched by the reconciler.
    Manual,
    /// No acceptable candidate on the legacy side.
    Unmatched,
}

impl MatchType {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Auto => "auto",
            MatchType::Manual => "manual",
            MatchType::Unmatched => "unmatched",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(MatchType::Auto),
            "manual" => Ok(MatchType::Manual),
            "unmatched" => Ok(MatchType::Unmatched),
            _ => Err(format!("Unknown match type: {s}")),
        }
    }
}

/// The belief that records from the two sides denote the same machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    /// Mapping ID.
    pub id: Uuid,
    /// Azure-side record this mapping belongs to.
    pub azure_record_id: String,
    /// Linked legacy-side record; always `None` for `Unmatched`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_record_id: Option<String>,
    /// How this mapping came to be.
    pub match_type: MatchType,
    /// Match certainty in [0, 1].
    pub confidence: f64,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Mapping {
    /// Create an automatic mapping accepted at the given confidence.
    #[must_use]
    pub fn auto(
        azure_record_id: impl Into<String>,
        legacy_record_id: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            azure_record_id: azure_record_id.into(),
            legacy_record_id: Some(legacy_record_id.into()),
            match_type: MatchType::Auto,
            confidence: confidence.clamp(0.0, 1.0),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a manual mapping from a human decision.
    #[must_use]
    pub fn manual(azure_record_id: impl Into<String>, legacy_record_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            azure_record_id: azure_record_id.into(),
            legacy_record_id,
            match_type: MatchType::Manual,
            confidence: 1.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an unmatched marker carrying the best rejected score.
    #[must_use]
    pub fn unmatched(azure_record_id: impl Into<String>, best_score: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            azure_record_id: azure_record_id.into(),
            legacy_record_id: None,
            match_type: MatchType::Unmatched,
            confidence: best_score.clamp(0.0, 1.0),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this mapping links the two sides.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.match_type != MatchType::Unmatched
    }
}

/// Outcome of the most recent sync cycle for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    /// The cycle fetched and persisted records.
    Success,
    /// The fetch or the record write failed.
    Failed,
    /// A cycle is in flight right now.
    Running,
}

impl SyncRunStatus {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncRunStatus::Success => "success",
            SyncRunStatus::Failed => "failed",
            SyncRunStatus::Running => "running",
        }
    }

    /// Whether a cycle is currently in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, SyncRunStatus::Running)
    }
}

impl fmt::Display for SyncRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SyncRunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(SyncRunStatus::Success),
            "failed" => Ok(SyncRunStatus::Failed),
            "running" => Ok(SyncRunStatus::Running),
            _ => Err(format!("Unknown sync status: {s}")),
        }
    }
}

/// Sync intervals a schedule may be configured with, in minutes.
pub const ALLOWED_SYNC_INTERVALS: [u32; 5] = [15, 30, 60, 360, 1440];

/// Interval assigned to lazily-created schedules.
pub const DEFAULT_SYNC_INTERVAL_MINUTES: u32 = 60;

/// Per-source configuration and last-run state governing periodic sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSchedule {
    /// Source this schedule governs.
    pub source_type: SourceType,
    /// Whether periodic sync is on.
    pub enabled: bool,
    /// Minutes between cycles; one of [`ALLOWED_SYNC_INTERVALS`].
    pub interval_minutes: u32,
    /// When the last cycle finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<DateTime<Utc>>,
    /// When the next cycle is due; `None` while disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_sync_at: Option<DateTime<Utc>>,
    /// Outcome of the last cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_status: Option<SyncRunStatus>,
    /// Error message captured from the last failed cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_error: Option<String>,
    /// Records fetched by the last successful cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_count: Option<i64>,
    /// Wall-clock duration of the last cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_duration_ms: Option<u64>,
}

impl SyncSchedule {
    /// The lazily-created schedule row: disabled, default interval.
    #[must_use]
    pub fn with_defaults(source_type: SourceType) -> Self {
        Self {
            source_type,
            enabled: false,
            interval_minutes: DEFAULT_SYNC_INTERVAL_MINUTES,
            last_sync_at: None,
            next_sync_at: None,
            last_sync_status: None,
            last_sync_error: None,
            last_sync_count: None,
            last_sync_duration_ms: None,
        }
    }

    /// Whether the given interval is one the engine accepts.
    #[must_use]
    pub fn is_valid_interval(minutes: u32) -> bool {
        ALLOWED_SYNC_INTERVALS.contains(&minutes)
    }

    /// The configured interval as a [`std::time::Duration`].
    #[must_use]
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.interval_minutes) * 60)
    }

    /// The next due time counted from `from`, `None` while disabled.
    #[must_use]
    pub fn compute_next_sync(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.enabled
            .then(|| from + Duration::minutes(i64::from(self.interval_minutes)))
    }
}

/// Availability classification for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Probe succeeded within the fast-response bound.
    Healthy,
    /// Probe succeeded but was slow.
    Degraded,
    /// Probe failed or timed out.
    Down,
}

impl HealthStatus {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Down => "down",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "healthy" => Ok(HealthStatus::Healthy),
            "degraded" => Ok(HealthStatus::Degraded),
            "down" => Ok(HealthStatus::Down),
            _ => Err(format!("Unknown health status: {s}")),
        }
    }
}

/// Last observed availability of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionHealth {
    /// Source this snapshot describes.
    pub source_type: SourceType,
    /// Availability classification.
    pub status: HealthStatus,
    /// When the source was last probed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check_at: Option<DateTime<Utc>>,
    /// Machine count from the last successful sync.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_count: Option<i64>,
    /// Probe round-trip time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// Error captured from a failed probe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionHealth {
    /// The lazily-created health row: presumed reachable until probed.
    #[must_use]
    pub fn with_defaults(source_type: SourceType) -> Self {
        Self {
            source_type,
            status: HealthStatus::Healthy,
            last_check_at: None,
            machine_count: None,
            response_time_ms: None,
            error: None,
        }
    }
}
