// # Directory Traits
//
// Paged listings of zones, alias records and load balancers.
//
// ## Paging Contract
//
// Every call returns exactly one page. A page whose `next_marker` is `None`
// is the last one; otherwise the caller passes the marker back in the next
// `PageRequest`. Implementations keep no cursor state between calls, so a
// listing can be restarted at any time by passing `marker: None`.

use async_trait::async_trait;

use crate::error::BackendResult;
use crate::types::{AliasRecord, LoadBalancerTarget, Page, PageRequest, Zone};

/// Paged listing of hosted zones
///
/// # Trust Level: Untrusted
///
/// Implementations perform a single remote call per invocation and never
/// retry. Failures are returned as-is and classified by the core.
#[async_trait]
pub trait ZoneDirectory: Send + Sync {
    /// Fetch one page of hosted zones
    ///
    /// Zone names are returned as the provider stores them, dot-terminated.
    async fn list_zones_page(&self, request: PageRequest) -> BackendResult<Page<Zone>>;
}

/// Paged listing of alias records inside a zone
#[async_trait]
pub trait RecordDirectory: Send + Sync {
    /// Fetch one page of alias records for the zone with id `zone_id`
    async fn list_records_page(
        &self,
        zone_id: &str,
        request: PageRequest,
    ) -> BackendResult<Page<AliasRecord>>;
}

/// Paged listing of load balancers
#[async_trait]
pub trait LoadBalancerDirectory: Send + Sync {
    /// Fetch one page of load balancers
    async fn list_load_balancers_page(
        &self,
        request: PageRequest,
    ) -> BackendResult<Page<LoadBalancerTarget>>;
}
