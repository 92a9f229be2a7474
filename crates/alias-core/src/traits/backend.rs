// # Backend Bundle
//
// A `Backend` is the full set of collaborators the core needs. Most
// providers implement all five traits on one type; `Backend::from_provider`
// covers that case. Tests can also mix and match individual collaborators.

use async_trait::async_trait;
use std::sync::Arc;

use super::{
    ChangeStatusSource, LoadBalancerDirectory, RecordDirectory, RecordMutator, ZoneDirectory,
};
use crate::config::BackendConfig;

/// A type that implements every collaborator trait
pub trait BackendProvider:
    ZoneDirectory + RecordDirectory + LoadBalancerDirectory + RecordMutator + ChangeStatusSource
{
    /// Provider name (for logging/debugging)
    fn backend_name(&self) -> &'static str;
}

/// The collaborators used by one reconciliation episode
#[derive(Clone)]
pub struct Backend {
    /// Name of the backend (for logging/debugging)
    pub name: String,
    /// Hosted zone listing
    pub zones: Arc<dyn ZoneDirectory>,
    /// Alias record listing
    pub records: Arc<dyn RecordDirectory>,
    /// Load balancer listing
    pub load_balancers: Arc<dyn LoadBalancerDirectory>,
    /// Change submission
    pub mutator: Arc<dyn RecordMutator>,
    /// Change status reads
    pub changes: Arc<dyn ChangeStatusSource>,
}

impl Backend {
    /// Use one provider for every collaborator
    pub fn from_provider<P>(provider: Arc<P>) -> Self
    where
        P: BackendProvider + 'static,
    {
        Self {
            name: provider.backend_name().to_string(),
            zones: provider.clone(),
            records: provider.clone(),
            load_balancers: provider.clone(),
            mutator: provider.clone(),
            changes: provider,
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").field("name", &self.name).finish()
    }
}

/// Helper trait for constructing backends from configuration
#[async_trait]
pub trait BackendFactory: Send + Sync {
    /// Create a Backend from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Backend)`: Ready-to-use collaborators
    /// - `Err(Error)`: If the configuration does not fit this factory or
    ///   the backend could not be opened
    async fn create(&self, config: &BackendConfig) -> crate::Result<Backend>;
}
