// # Record Mutator Trait
//
// Submits a single record change to a zone.

use async_trait::async_trait;

use crate::error::BackendResult;
use crate::types::{ChangeStatus, RecordChange};

/// Trait for submitting record changes
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform exactly one state-changing remote call per invocation
/// - ✅ Return the provider's change id and initial status
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (the caller owns retry policy)
/// - ❌ Wait for propagation (owned by `ConvergenceWaiter`)
/// - ❌ Read the record first (owned by `AliasMutator`)
#[async_trait]
pub trait RecordMutator: Send + Sync {
    /// Submit `change` to the zone with id `zone_id`
    ///
    /// Upserts replace a record with the same name or create it. Deletes
    /// must match the current record content exactly; a mismatch is an
    /// error reported by the provider.
    async fn submit_change(
        &self,
        zone_id: &str,
        change: &RecordChange,
    ) -> BackendResult<ChangeStatus>;
}
