// # Change Status Source Trait
//
// Point-in-time status reads for submitted changes.

use async_trait::async_trait;

use crate::error::BackendResult;
use crate::types::ChangeStatus;

/// Trait for reading the propagation status of a change
///
/// Reads have no side effects and are safe to repeat. Unknown ids must be
/// reported with the `NoSuchChange` code so they classify as
/// `Error::ChangeNotFound`.
#[async_trait]
pub trait ChangeStatusSource: Send + Sync {
    /// Get the current status of change `id`
    async fn get_change(&self, id: &str) -> BackendResult<ChangeStatus>;
}
