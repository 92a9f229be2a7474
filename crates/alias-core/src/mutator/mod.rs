//! Alias mutator
//!
//! Builds and submits the single record change that points an alias at a
//! load balancer, or removes it again.
//!
//! ## Guarantees
//!
//! - Exactly one state-changing backend call per operation
//! - No retries: every error goes straight back to the caller
//! - Deletes mirror the record as currently stored, field for field

use std::sync::Arc;
use tracing::info;

use crate::directory::DirectoryClient;
use crate::error::Result;
use crate::name::alias_fqdn;
use crate::traits::RecordMutator;
use crate::types::{AliasRecord, ChangeStatus, RecordChange, Zone};

/// Submits alias upserts and deletes
#[derive(Clone)]
pub struct AliasMutator {
    mutator: Arc<dyn RecordMutator>,
    directory: DirectoryClient,
}

impl AliasMutator {
    /// Create a mutator
    ///
    /// `directory` is used by [`AliasMutator::remove_alias`] to read the
    /// record being deleted.
    pub fn new(mutator: Arc<dyn RecordMutator>, directory: DirectoryClient) -> Self {
        Self { mutator, directory }
    }

    /// Point `alias` in `zone` at a load balancer
    ///
    /// Submits an upsert of an alias record with target health evaluation
    /// enabled. Submitting the same alias twice leaves the zone in the same
    /// state.
    ///
    /// # Returns
    ///
    /// The status of the submitted change, normally `PENDING`.
    pub async fn set_alias(
        &self,
        zone: &Zone,
        target_hosted_zone_id: &str,
        target_dns_name: &str,
        alias: &str,
    ) -> Result<ChangeStatus> {
        let record = AliasRecord {
            name: alias_fqdn(alias, &zone.name),
            target_dns_name: target_dns_name.to_string(),
            target_hosted_zone_id: target_hosted_zone_id.to_string(),
            evaluate_target_health: true,
        };

        let status = self
            .mutator
            .submit_change(&zone.id, &RecordChange::upsert(record.clone()))
            .await?;

        info!(
            zone = %zone.name,
            alias = %record.name,
            target = %record.target_dns_name,
            change_id = %status.id,
            state = %status.state,
            "submitted alias upsert"
        );
        Ok(status)
    }

    /// Remove the alias record for `alias` in `zone`
    ///
    /// Reads the record first and submits a delete carrying its exact
    /// current values, since the backend matches deletes on full content.
    ///
    /// # Errors
    ///
    /// `Error::RecordNotFound` if the alias does not exist; nothing is
    /// submitted in that case.
    pub async fn remove_alias(&self, zone: &Zone, alias: &str) -> Result<ChangeStatus> {
        let (_, status) = self.remove_alias_record(zone, alias).await?;
        Ok(status)
    }

    /// Like [`AliasMutator::remove_alias`], also returning the record as it
    /// was stored before the delete
    pub async fn remove_alias_record(
        &self,
        zone: &Zone,
        alias: &str,
    ) -> Result<(AliasRecord, ChangeStatus)> {
        let existing = self.directory.find_record(zone, alias).await?;

        let status = self
            .mutator
            .submit_change(&zone.id, &RecordChange::delete(existing.clone()))
            .await?;

        info!(
            zone = %zone.name,
            alias = %existing.name,
            target = %existing.target_dns_name,
            change_id = %status.id,
            state = %status.state,
            "submitted alias delete"
        );
        Ok((existing, status))
    }
}

impl std::fmt::Debug for AliasMutator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasMutator")
            .field("directory", &self.directory)
            .finish()
    }
}
