//! Shared test fixtures: a scriptable in-memory source adapter.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use invar_connector::{ConnectorError, ConnectorResult, InventorySource, SourceRegistry};
use invar_core::types::{SourceRecord, SourceType};
use invar_engine::{MemoryStore, SyncService};

/// Scriptable adapter: records, delays and failures are set per test.
pub struct MockSource {
    source_type: SourceType,
    records: Mutex<Vec<SourceRecord>>,
    fetch_delay: Mutex<Option<Duration>>,
    probe_delay: Mutex<Duration>,
    fail_fetch: AtomicBool,
    fail_probe: AtomicBool,
    fetch_calls: AtomicUsize,
}

impl MockSource {
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            records: Mutex::new(Vec::new()),
            fetch_delay: Mutex::new(None),
            probe_delay: Mutex::new(Duration::ZERO),
            fail_fetch: AtomicBool::new(false),
            fail_probe: AtomicBool::new(false),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_records(&self, records: Vec<SourceRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_probe_delay(&self, delay: Duration) {
        *self.probe_delay.lock().unwrap() = delay;
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_probe(&self, fail: bool) {
        self.fail_probe.store(fail, Ordering::SeqCst);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventorySource for MockSource {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn display_name(&self) -> &str {
        "mock"
    }

    async fn fetch_all(&self) -> ConnectorResult<Vec<SourceRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ConnectorError::unavailable("mock fetch failure"));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn probe(&self) -> ConnectorResult<Duration> {
        let delay = *self.probe_delay.lock().unwrap();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        if self.fail_probe.load(Ordering::SeqCst) {
            return Err(ConnectorError::unavailable("mock probe failure"));
        }
        Ok(delay)
    }
}

/// A machine record with an empty attribute bag.
pub fn machine(source_type: SourceType, id: &str, name: &str) -> SourceRecord {
    SourceRecord::new(source_type, id, name)
}

/// A fully-wired service over a fresh in-memory store and two mock
/// sources.
pub fn build_service() -> (
    Arc<SyncService>,
    Arc<MockSource>,
    Arc<MockSource>,
    Arc<MemoryStore>,
) {
    let azure = Arc::new(MockSource::new(SourceType::Azure));
    let legacy = Arc::new(MockSource::new(SourceType::Legacy));
    let mut sources = SourceRegistry::new();
    sources.register(azure.clone());
    sources.register(legacy.clone());

    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(SyncService::new(store.clone(), sources));
    (service, azure, legacy, store)
}
