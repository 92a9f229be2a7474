//! Change tracker
//!
//! Point-in-time status reads for submitted changes. Re-reading is the only
//! way a `PENDING` change is ever observed as `INSYNC`.

use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::traits::ChangeStatusSource;
use crate::types::ChangeStatus;

/// Reads change status from the backend
#[derive(Clone)]
pub struct ChangeTracker {
    source: Arc<dyn ChangeStatusSource>,
}

impl ChangeTracker {
    /// Create a tracker over `source`
    pub fn new(source: Arc<dyn ChangeStatusSource>) -> Self {
        Self { source }
    }

    /// Current status of change `id`
    ///
    /// Pure read; safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// - `Error::ChangeNotFound` if the backend does not know `id`
    /// - `Error::Authentication` / `Error::Transport` otherwise
    pub async fn get_change_status(&self, id: &str) -> Result<ChangeStatus> {
        let status = self.source.get_change(id).await?;
        debug!(change_id = %status.id, state = %status.state, "read change status");
        Ok(status)
    }
}

impl std::fmt::Debug for ChangeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeTracker").finish_non_exhaustive()
    }
}
