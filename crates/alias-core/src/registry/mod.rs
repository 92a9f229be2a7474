//! Backend registry
//!
//! Maps backend type names to factories so the CLI (or any embedding
//! program) can build a [`Backend`] from configuration without hardcoding
//! the set of available backends.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use alias_core::registry::BackendRegistry;
//! use alias_core::config::BackendConfig;
//!
//! let registry = BackendRegistry::with_builtin();
//! registry.register_backend("route53", Arc::new(Route53Factory));
//!
//! let backend = registry.create_backend(&BackendConfig::Memory).await?;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::backend::{FileBackendFactory, MemoryBackendFactory};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::traits::{Backend, BackendFactory};

/// Registry of backend factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct BackendRegistry {
    factories: RwLock<HashMap<String, Arc<dyn BackendFactory>>>,
}

impl BackendRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `memory` and `file` backends registered
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_backend("memory", Arc::new(MemoryBackendFactory));
        registry.register_backend("file", Arc::new(FileBackendFactory));
        registry
    }

    /// Register a backend factory under `name`
    ///
    /// Replaces any factory already registered under that name.
    pub fn register_backend(&self, name: impl Into<String>, factory: Arc<dyn BackendFactory>) {
        let name = name.into();
        tracing::debug!(backend = %name, "registering backend factory");
        self.factories
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name, factory);
    }

    /// Create a backend from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Backend)`: Created backend
    /// - `Err(Error)`: If the backend type is not registered or creation fails
    pub async fn create_backend(&self, config: &BackendConfig) -> Result<Backend> {
        let backend_type = config.type_name();

        // Release the lock before calling async create
        let factory = self
            .factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(backend_type)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown backend type: {}", backend_type)))?;

        factory.create(config).await
    }

    /// List all registered backend types
    pub fn list_backends(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Check if a backend type is registered
    pub fn has_backend(&self, name: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(name)
    }
}
