//! Directory client
//!
//! Resolves loosely formatted, user-supplied names into canonical
//! [`Zone`], [`LoadBalancerTarget`] and [`AliasRecord`] values by paging
//! through the backend listings.
//!
//! ## Matching Rules
//!
//! - Names compare case-insensitively.
//! - Zone names are dot-terminated before comparison.
//! - Alias names are expanded with [`crate::name::alias_fqdn`].
//! - The first match in page order wins; a search returns early on a match
//!   but reports "not found" only after the last page has been consumed.

mod paginate;

pub use paginate::paginate;

use futures::{Stream, TryStreamExt};
use std::sync::Arc;
use tracing::debug;

use crate::config::DirectoryConfig;
use crate::error::{Error, Result};
use crate::name::{alias_fqdn, fqdn, names_match};
use crate::traits::{Backend, LoadBalancerDirectory, RecordDirectory, ZoneDirectory};
use crate::types::{AliasRecord, LoadBalancerTarget, Zone};

/// Name lookups over the backend listings
///
/// Stateless: every call pages through the backend from the start.
#[derive(Clone)]
pub struct DirectoryClient {
    zones: Arc<dyn ZoneDirectory>,
    records: Arc<dyn RecordDirectory>,
    load_balancers: Arc<dyn LoadBalancerDirectory>,
    config: DirectoryConfig,
}

impl DirectoryClient {
    /// Create a directory client over `backend`
    pub fn new(backend: &Backend, config: DirectoryConfig) -> Self {
        Self {
            zones: backend.zones.clone(),
            records: backend.records.clone(),
            load_balancers: backend.load_balancers.clone(),
            config,
        }
    }

    /// Stream the hosted zones page by page
    pub fn zone_pages(&self) -> impl Stream<Item = Result<Vec<Zone>>> + '_ {
        paginate(self.config.zone_page_size, move |request| {
            self.zones.list_zones_page(request)
        })
    }

    /// Stream the load balancers page by page
    pub fn load_balancer_pages(&self) -> impl Stream<Item = Result<Vec<LoadBalancerTarget>>> + '_ {
        paginate(self.config.load_balancer_page_size, move |request| {
            self.load_balancers.list_load_balancers_page(request)
        })
    }

    /// Stream the alias records of `zone` page by page
    pub fn record_pages<'a>(
        &'a self,
        zone: &'a Zone,
    ) -> impl Stream<Item = Result<Vec<AliasRecord>>> + 'a {
        paginate(self.config.record_page_size, move |request| {
            self.records.list_records_page(&zone.id, request)
        })
    }

    /// List every hosted zone visible to the caller
    ///
    /// # Errors
    ///
    /// - `Error::Authentication` if the credential chain is invalid
    /// - `Error::Transport` for any other backend failure
    pub async fn list_zones(&self) -> Result<Vec<Zone>> {
        let zones: Vec<Zone> = collect_all(self.zone_pages()).await?;
        debug!(count = zones.len(), "listed zones");
        Ok(zones)
    }

    /// Find a zone by name
    ///
    /// `name` may omit the trailing dot.
    ///
    /// # Errors
    ///
    /// `Error::ZoneNotFound` if no zone matches after the last page.
    pub async fn find_zone(&self, name: &str) -> Result<Zone> {
        let zone_name = fqdn(name);
        debug!(zone = %zone_name, "looking up zone");

        let found = find_first(self.zone_pages(), |zone: &Zone| {
            names_match(&zone.name, &zone_name)
        })
        .await?;
        found.ok_or(Error::ZoneNotFound(zone_name))
    }

    /// List every load balancer visible to the caller
    pub async fn list_load_balancers(&self) -> Result<Vec<LoadBalancerTarget>> {
        let lbs: Vec<LoadBalancerTarget> = collect_all(self.load_balancer_pages()).await?;
        debug!(count = lbs.len(), "listed load balancers");
        Ok(lbs)
    }

    /// Find a load balancer by its DNS name
    ///
    /// # Errors
    ///
    /// `Error::LoadBalancerNotFound` if no load balancer matches after the
    /// last page.
    pub async fn find_load_balancer(&self, dns_name: &str) -> Result<LoadBalancerTarget> {
        debug!(dns_name, "looking up load balancer");

        find_first(self.load_balancer_pages(), |lb: &LoadBalancerTarget| {
            names_match(&lb.dns_name, dns_name)
        })
        .await?
        .ok_or_else(|| Error::LoadBalancerNotFound(dns_name.to_string()))
    }

    /// Find the alias record for `alias` in `zone`
    ///
    /// `alias` may be a bare label, a partially qualified name or a fully
    /// qualified name.
    ///
    /// # Errors
    ///
    /// `Error::RecordNotFound` if no record matches after the last page.
    pub async fn find_record(&self, zone: &Zone, alias: &str) -> Result<AliasRecord> {
        let record_name = alias_fqdn(alias, &zone.name);
        debug!(zone = %zone.name, record = %record_name, "looking up alias record");

        let found = find_first(self.record_pages(zone), |record: &AliasRecord| {
            names_match(&record.name, &record_name)
        })
        .await?;
        found.ok_or(Error::RecordNotFound(record_name))
    }
}

impl std::fmt::Debug for DirectoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryClient")
            .field("config", &self.config)
            .finish()
    }
}

async fn collect_all<T, S>(pages: S) -> Result<Vec<T>>
where
    S: Stream<Item = Result<Vec<T>>>,
{
    let mut pages = std::pin::pin!(pages);
    let mut all = Vec::new();
    while let Some(items) = pages.try_next().await? {
        all.extend(items);
    }
    Ok(all)
}

async fn find_first<T, S, P>(pages: S, mut predicate: P) -> Result<Option<T>>
where
    S: Stream<Item = Result<Vec<T>>>,
    P: FnMut(&T) -> bool,
{
    let mut pages = std::pin::pin!(pages);
    let mut page_number = 0usize;
    while let Some(items) = pages.try_next().await? {
        page_number += 1;
        debug!(page = page_number, items = items.len(), "scanning page");

        if let Some(found) = items.into_iter().find(|item| predicate(item)) {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
