// # Memory Backend
//
// In-memory implementation of every collaborator trait.
//
// ## Purpose
//
// Behaves like a hosted DNS provider without leaving the process:
// paged listings, upsert/delete with exact-content delete matching, and
// changes that stay PENDING for a configurable number of status reads.
//
// ## When to Use
//
// - Testing environments
// - Dry runs of the create/remove flow
//
// All state is lost when the backend is dropped.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{apply_change, page_of};
use crate::config::BackendConfig;
use crate::error::{BackendError, BackendResult, Error};
use crate::traits::{
    Backend, BackendFactory, BackendProvider, ChangeStatusSource, LoadBalancerDirectory,
    RecordDirectory, RecordMutator, ZoneDirectory,
};
use crate::types::{
    AliasRecord, ChangeState, ChangeStatus, LoadBalancerTarget, Page, PageRequest, RecordChange,
    Zone,
};

/// Largest page the memory backend returns when not told otherwise
const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Default)]
struct MemoryState {
    zones: Vec<Zone>,
    records: HashMap<String, Vec<AliasRecord>>,
    load_balancers: Vec<LoadBalancerTarget>,
    changes: HashMap<String, TrackedChange>,
    submitted: Vec<RecordChange>,
    next_change: u64,
}

#[derive(Debug, Clone)]
struct TrackedChange {
    status: ChangeStatus,
    pending_reads: usize,
}

/// In-memory backend
///
/// Cloning shares the underlying state, so a test can keep a handle for
/// inspection while the core owns another.
///
/// # Example
///
/// ```rust
/// use alias_core::backend::MemoryBackend;
/// use alias_core::{LoadBalancerTarget, Zone};
///
/// let backend = MemoryBackend::new()
///     .with_page_size(1)
///     .with_zone(Zone::new("/hostedzone/Z1", "example.com."))
///     .with_load_balancer(LoadBalancerTarget::new("lb.elb.amazonaws.com", "ZLB"));
/// assert_eq!(backend.zones().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
    page_size: usize,
    propagation_reads: usize,
    credentials_valid: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MemoryBackend {
    /// Create a new empty memory backend
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            page_size: DEFAULT_PAGE_SIZE,
            propagation_reads: 0,
            credentials_valid: Arc::new(AtomicBool::new(true)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Cap every page at `page_size` items
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Number of status reads that still report PENDING after a submission
    pub fn with_propagation_reads(mut self, reads: usize) -> Self {
        self.propagation_reads = reads;
        self
    }

    /// Add a hosted zone
    pub fn with_zone(self, zone: Zone) -> Self {
        {
            let mut state = self.lock();
            state.records.entry(zone.id.clone()).or_default();
            state.zones.push(zone);
        }
        self
    }

    /// Add an alias record to the zone with id `zone_id`
    pub fn with_record(self, zone_id: &str, record: AliasRecord) -> Self {
        self.lock()
            .records
            .entry(zone_id.to_string())
            .or_default()
            .push(record);
        self
    }

    /// Add a load balancer
    pub fn with_load_balancer(self, lb: LoadBalancerTarget) -> Self {
        self.lock().load_balancers.push(lb);
        self
    }

    /// Simulate a credential chain with no usable credentials
    pub fn without_credentials(self) -> Self {
        self.set_credentials_valid(false);
        self
    }

    /// Toggle the credential simulation
    pub fn set_credentials_valid(&self, valid: bool) {
        self.credentials_valid.store(valid, Ordering::SeqCst);
    }

    /// Snapshot of the hosted zones
    pub fn zones(&self) -> Vec<Zone> {
        self.lock().zones.clone()
    }

    /// Snapshot of the alias records in zone `zone_id`
    pub fn records(&self, zone_id: &str) -> Vec<AliasRecord> {
        self.lock().records.get(zone_id).cloned().unwrap_or_default()
    }

    /// Every change submitted so far, in order
    pub fn submitted_changes(&self) -> Vec<RecordChange> {
        self.lock().submitted.clone()
    }

    /// Total number of backend calls served
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin_call(&self) -> BackendResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.credentials_valid.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::no_credentials())
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ZoneDirectory for MemoryBackend {
    async fn list_zones_page(&self, request: PageRequest) -> BackendResult<Page<Zone>> {
        self.begin_call()?;
        page_of(&self.lock().zones, &request, self.page_size)
    }
}

#[async_trait]
impl RecordDirectory for MemoryBackend {
    async fn list_records_page(
        &self,
        zone_id: &str,
        request: PageRequest,
    ) -> BackendResult<Page<AliasRecord>> {
        self.begin_call()?;
        let state = self.lock();
        let records = state.records.get(zone_id).ok_or_else(|| {
            BackendError::new(
                BackendError::NO_SUCH_HOSTED_ZONE,
                format!("No hosted zone found with ID: {}", zone_id),
            )
        })?;
        page_of(records, &request, self.page_size)
    }
}

#[async_trait]
impl LoadBalancerDirectory for MemoryBackend {
    async fn list_load_balancers_page(
        &self,
        request: PageRequest,
    ) -> BackendResult<Page<LoadBalancerTarget>> {
        self.begin_call()?;
        page_of(&self.lock().load_balancers, &request, self.page_size)
    }
}

#[async_trait]
impl RecordMutator for MemoryBackend {
    async fn submit_change(
        &self,
        zone_id: &str,
        change: &RecordChange,
    ) -> BackendResult<ChangeStatus> {
        self.begin_call()?;
        let mut state = self.lock();

        let records = state.records.get_mut(zone_id).ok_or_else(|| {
            BackendError::new(
                BackendError::NO_SUCH_HOSTED_ZONE,
                format!("No hosted zone found with ID: {}", zone_id),
            )
        })?;
        apply_change(records, change)?;

        state.next_change += 1;
        let status = ChangeStatus {
            id: format!("/change/C{:010}", state.next_change),
            state: ChangeState::Pending,
            submitted_at: Utc::now(),
            comment: change.comment.clone(),
        };
        state.changes.insert(
            status.id.clone(),
            TrackedChange {
                status: status.clone(),
                pending_reads: self.propagation_reads,
            },
        );
        state.submitted.push(change.clone());

        Ok(status)
    }
}

#[async_trait]
impl ChangeStatusSource for MemoryBackend {
    async fn get_change(&self, id: &str) -> BackendResult<ChangeStatus> {
        self.begin_call()?;
        let mut state = self.lock();
        let tracked = state
            .changes
            .get_mut(id)
            .ok_or_else(|| BackendError::no_such_change(id))?;

        if tracked.pending_reads > 0 {
            tracked.pending_reads -= 1;
        } else {
            tracked.status.state = ChangeState::InSync;
        }
        Ok(tracked.status.clone())
    }
}

impl BackendProvider for MemoryBackend {
    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating memory backends
pub struct MemoryBackendFactory;

#[async_trait]
impl BackendFactory for MemoryBackendFactory {
    async fn create(&self, config: &BackendConfig) -> crate::Result<Backend> {
        match config {
            BackendConfig::Memory => Ok(Backend::from_provider(Arc::new(MemoryBackend::new()))),
            _ => Err(Error::config("Invalid config for memory backend")),
        }
    }
}
