//! Source adapter contract.
//!
//! Adapters are implemented externally per source system (cloud discovery
//! API, legacy inventory database); the engine only consumes this trait.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use invar_core::types::{SourceRecord, SourceType};

use crate::error::ConnectorResult;

/// An inventory source adapter.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Which source this adapter serves.
    fn source_type(&self) -> SourceType;

    /// Human-readable name for logs and health views.
    fn display_name(&self) -> &str;

    /// Fetch every machine record the source currently knows about.
    ///
    /// Fails with a transient [`crate::ConnectorError`] on network or
    /// auth errors; a successful call returns the complete record set.
    async fn fetch_all(&self) -> ConnectorResult<Vec<SourceRecord>>;

    /// Lightweight liveness probe returning the round-trip time.
    async fn probe(&self) -> ConnectorResult<Duration>;
}

/// Registry of adapters keyed by source.
///
/// The engine holds one registry instance; lookups clone the inner `Arc`.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    sources: HashMap<SourceType, Arc<dyn InventorySource>>,
}

impl SourceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own source type, replacing any
    /// previous adapter for that source.
    pub fn register(&mut self, source: Arc<dyn InventorySource>) {
        self.sources.insert(source.source_type(), source);
    }

    /// Look up the adapter for a source.
    #[must_use]
    pub fn get(&self, source_type: SourceType) -> Option<Arc<dyn InventorySource>> {
        self.sources.get(&source_type).cloned()
    }

    /// Registered sources in the stable [`SourceType::ALL`] order.
    #[must_use]
    pub fn source_types(&self) -> Vec<SourceType> {
        SourceType::ALL
            .into_iter()
            .filter(|source_type| self.sources.contains_key(source_type))
            .collect()
    }

    /// Number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no adapter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.source_types())
            .finish()
    }
}
