//! Test doubles and common utilities for contract tests
//!
//! These doubles serve fixed pages and scripted statuses and count every
//! call, so tests can assert exactly how many backend requests were issued.

#![allow(dead_code)]

use alias_core::error::{BackendError, BackendResult};
use alias_core::traits::{
    Backend, ChangeStatusSource, LoadBalancerDirectory, RecordDirectory, RecordMutator,
    ZoneDirectory,
};
use alias_core::types::{
    AliasRecord, ChangeState, ChangeStatus, LoadBalancerTarget, Page, PageRequest, RecordChange,
    Zone,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Listing that serves a fixed sequence of pages
///
/// The marker for page `n` is `"page-n"`. Every call is counted.
pub struct PagedListing<T> {
    pages: Vec<Vec<T>>,
    failure: Option<BackendError>,
    calls: AtomicUsize,
}

impl<T: Clone> PagedListing<T> {
    pub fn new(pages: Vec<Vec<T>>) -> Self {
        Self {
            pages,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every call with `error`
    pub fn failing(error: BackendError) -> Self {
        Self {
            pages: Vec::new(),
            failure: Some(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn serve(&self, request: &PageRequest) -> BackendResult<Page<T>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let index = match request.marker.as_deref() {
            None => 0,
            Some(marker) => marker
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| BackendError::new("InvalidPaginationToken", marker))?,
        };

        let items = self.pages.get(index).cloned().unwrap_or_default();
        if index + 1 < self.pages.len() {
            Ok(Page::more(items, format!("page-{}", index + 1)))
        } else {
            Ok(Page::last(items))
        }
    }
}

#[async_trait]
impl ZoneDirectory for PagedListing<Zone> {
    async fn list_zones_page(&self, request: PageRequest) -> BackendResult<Page<Zone>> {
        self.serve(&request)
    }
}

#[async_trait]
impl LoadBalancerDirectory for PagedListing<LoadBalancerTarget> {
    async fn list_load_balancers_page(
        &self,
        request: PageRequest,
    ) -> BackendResult<Page<LoadBalancerTarget>> {
        self.serve(&request)
    }
}

#[async_trait]
impl RecordDirectory for PagedListing<AliasRecord> {
    async fn list_records_page(
        &self,
        _zone_id: &str,
        request: PageRequest,
    ) -> BackendResult<Page<AliasRecord>> {
        self.serve(&request)
    }
}

/// Mutator that records every submission and answers PENDING
pub struct RecordingMutator {
    submitted: Mutex<Vec<(String, RecordChange)>>,
    failure: Option<BackendError>,
}

impl RecordingMutator {
    pub fn new() -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    pub fn failing(error: BackendError) -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            failure: Some(error),
        }
    }

    pub fn submitted(&self) -> Vec<(String, RecordChange)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordMutator for RecordingMutator {
    async fn submit_change(
        &self,
        zone_id: &str,
        change: &RecordChange,
    ) -> BackendResult<ChangeStatus> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push((zone_id.to_string(), change.clone()));
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(status(
            &format!("/change/C{}", submitted.len()),
            ChangeState::Pending,
        ))
    }
}

/// Change source that plays back a script of responses
///
/// Once the script runs out, the last response repeats.
pub struct ScriptedChanges {
    script: Mutex<VecDeque<BackendResult<ChangeState>>>,
    last: Mutex<BackendResult<ChangeState>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedChanges {
    pub fn new(script: Vec<BackendResult<ChangeState>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(Ok(ChangeState::Pending)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Reports PENDING forever
    pub fn never_in_sync() -> Self {
        Self::new(Vec::new())
    }

    /// Shared handle on the call counter
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChangeStatusSource for ScriptedChanges {
    async fn get_change(&self, id: &str) -> BackendResult<ChangeStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().unwrap().pop_front();
        let response = match next {
            Some(response) => {
                *self.last.lock().unwrap() = response.clone();
                response
            }
            None => self.last.lock().unwrap().clone(),
        };
        response.map(|state| status(id, state))
    }
}

pub fn status(id: &str, state: ChangeState) -> ChangeStatus {
    ChangeStatus {
        id: id.to_string(),
        state,
        submitted_at: Utc::now(),
        comment: None,
    }
}

pub fn zone(id: &str, name: &str) -> Zone {
    Zone::new(id, name)
}

pub fn alias_record(name: &str, target: &str, target_zone: &str) -> AliasRecord {
    AliasRecord {
        name: name.to_string(),
        target_dns_name: target.to_string(),
        target_hosted_zone_id: target_zone.to_string(),
        evaluate_target_health: true,
    }
}

/// Handles on every double behind a [`Backend`]
pub struct Doubles {
    pub zones: Arc<PagedListing<Zone>>,
    pub records: Arc<PagedListing<AliasRecord>>,
    pub load_balancers: Arc<PagedListing<LoadBalancerTarget>>,
    pub mutator: Arc<RecordingMutator>,
    pub changes: Arc<ScriptedChanges>,
}

impl Doubles {
    pub fn new(
        zones: PagedListing<Zone>,
        records: PagedListing<AliasRecord>,
        load_balancers: PagedListing<LoadBalancerTarget>,
    ) -> Self {
        Self {
            zones: Arc::new(zones),
            records: Arc::new(records),
            load_balancers: Arc::new(load_balancers),
            mutator: Arc::new(RecordingMutator::new()),
            changes: Arc::new(ScriptedChanges::never_in_sync()),
        }
    }

    pub fn with_mutator(mut self, mutator: RecordingMutator) -> Self {
        self.mutator = Arc::new(mutator);
        self
    }

    pub fn with_changes(mut self, changes: ScriptedChanges) -> Self {
        self.changes = Arc::new(changes);
        self
    }

    pub fn backend(&self) -> Backend {
        Backend {
            name: "doubles".to_string(),
            zones: self.zones.clone(),
            records: self.records.clone(),
            load_balancers: self.load_balancers.clone(),
            mutator: self.mutator.clone(),
            changes: self.changes.clone(),
        }
    }
}
