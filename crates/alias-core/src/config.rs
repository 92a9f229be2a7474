//! Configuration types for alias reconciliation
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliasConfig {
    /// Backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Listing settings
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Convergence wait settings
    #[serde(default)]
    pub wait: WaitConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AliasConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.backend.validate()?;
        self.directory.validate()?;
        self.wait.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-process backend (not persistent)
    #[default]
    Memory,

    /// JSON sandbox file
    File {
        /// Path to the sandbox file
        path: String,
        /// Seconds before a submitted change reports INSYNC
        #[serde(default)]
        propagation_delay_secs: u64,
    },

    /// Custom backend
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl BackendConfig {
    /// Validate the backend configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            BackendConfig::Memory => Ok(()),
            BackendConfig::File { path, .. } => {
                if path.is_empty() {
                    return Err(crate::Error::config("File backend path cannot be empty"));
                }
                Ok(())
            }
            BackendConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom backend factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom backend config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the backend type name
    pub fn type_name(&self) -> &str {
        match self {
            BackendConfig::Memory => "memory",
            BackendConfig::File { .. } => "file",
            BackendConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Page sizes for the listing calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Hosted zones per page
    #[serde(default = "default_zone_page_size")]
    pub zone_page_size: usize,

    /// Alias records per page
    #[serde(default = "default_record_page_size")]
    pub record_page_size: usize,

    /// Load balancers per page
    #[serde(default = "default_load_balancer_page_size")]
    pub load_balancer_page_size: usize,
}

impl DirectoryConfig {
    /// Validate the page sizes
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_page_size == 0
            || self.record_page_size == 0
            || self.load_balancer_page_size == 0
        {
            return Err(crate::Error::config("Page sizes must be > 0"));
        }
        Ok(())
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            zone_page_size: default_zone_page_size(),
            record_page_size: default_record_page_size(),
            load_balancer_page_size: default_load_balancer_page_size(),
        }
    }
}

/// Convergence wait policy
///
/// The defaults (poll every 2 seconds, give up after 60) are policy, not
/// protocol; both can be changed freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Delay between status polls (in milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum time to wait for INSYNC (in milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl WaitConfig {
    /// Build a policy from durations
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval_ms: saturating_millis(poll_interval),
            timeout_ms: saturating_millis(timeout),
        }
    }

    /// Delay between status polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Maximum time to wait
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the wait policy
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_ms == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.timeout_ms == 0 {
            return Err(crate::Error::config("Wait timeout must be > 0"));
        }
        if self.poll_interval() >= self.timeout() {
            return Err(crate::Error::config(format!(
                "Poll interval ({}ms) must be shorter than the wait timeout ({}ms)",
                self.poll_interval_ms, self.timeout_ms
            )));
        }
        Ok(())
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_zone_page_size() -> usize {
    100
}

fn default_record_page_size() -> usize {
    100
}

fn default_load_balancer_page_size() -> usize {
    400
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn default_event_channel_capacity() -> usize {
    100
}
