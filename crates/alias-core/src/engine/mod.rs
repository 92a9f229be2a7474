//! Alias workflow engine
//!
//! The AliasEngine wires the directory client, mutator, tracker and waiter
//! into the two end-to-end workflows:
//!
//! - **create**: resolve zone → resolve load balancer → upsert alias → wait
//! - **remove**: resolve zone → delete alias (no wait)
//!
//! ## Architecture
//!
//! ```text
//!                     ┌──────────────┐
//!   Request ─────────▶│ AliasEngine  │──────── Report
//!                     └──────────────┘
//!                            │
//!      ┌─────────────┬───────┴──────┬──────────────┐
//!      ▼             ▼              ▼              ▼
//! ┌──────────┐ ┌────────────┐ ┌──────────┐ ┌────────────┐
//! │Directory │ │  Mutator   │ │ Tracker  │ │   Waiter   │
//! │ (lookup) │ │ (submit)   │ │ (status) │ │ (converge) │
//! └──────────┘ └────────────┘ └──────────┘ └────────────┘
//! ```
//!
//! Every call is an independent episode. Parameters travel in the request
//! structs and results come back in the report structs; the engine keeps no
//! state between calls besides its collaborators.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{AliasConfig, WaitConfig};
use crate::directory::DirectoryClient;
use crate::error::Result;
use crate::mutator::AliasMutator;
use crate::name::alias_fqdn;
use crate::traits::Backend;
use crate::tracker::ChangeTracker;
use crate::types::{ChangeStatus, LoadBalancerTarget, Zone};
use crate::waiter::{ConvergenceWaiter, WaitOutcome};

/// Events emitted by the AliasEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Zone name resolved
    ZoneResolved { zone: Zone },

    /// Load balancer DNS name resolved
    LoadBalancerResolved { load_balancer: LoadBalancerTarget },

    /// Record change accepted by the backend
    ChangeSubmitted {
        record_name: String,
        change_id: String,
    },

    /// Change reported INSYNC
    Converged { change_id: String, polls: usize },

    /// Deadline passed before the change reported INSYNC
    TimedOut { change_id: String, waited: Duration },
}

/// Parameters of a create run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAliasRequest {
    /// Alias as typed by the user (bare label or qualified name)
    pub alias: String,
    /// Zone name, with or without trailing dot
    pub zone: String,
    /// DNS name of the target load balancer
    pub load_balancer_dns_name: String,
    /// Wait for the change to converge
    pub wait: bool,
    /// Override of the configured wait timeout
    pub timeout: Option<Duration>,
}

impl CreateAliasRequest {
    /// Create a request that waits with the configured timeout
    pub fn new(
        alias: impl Into<String>,
        zone: impl Into<String>,
        load_balancer_dns_name: impl Into<String>,
    ) -> Self {
        Self {
            alias: alias.into(),
            zone: zone.into(),
            load_balancer_dns_name: load_balancer_dns_name.into(),
            wait: true,
            timeout: None,
        }
    }

    /// Return as soon as the change is submitted
    pub fn no_wait(mut self) -> Self {
        self.wait = false;
        self
    }

    /// Wait at most `timeout` for convergence
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Result of a create run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAliasReport {
    /// Resolved zone
    pub zone: Zone,
    /// Resolved load balancer
    pub load_balancer: LoadBalancerTarget,
    /// Fully-qualified alias name written
    pub record_name: String,
    /// Status returned by the submission
    pub change: ChangeStatus,
    /// How the wait ended; `None` if waiting was skipped
    pub wait: Option<WaitOutcome>,
}

/// Parameters of a remove run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveAliasRequest {
    /// Alias as typed by the user
    pub alias: String,
    /// Zone name, with or without trailing dot
    pub zone: String,
}

impl RemoveAliasRequest {
    pub fn new(alias: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            zone: zone.into(),
        }
    }
}

/// Result of a remove run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveAliasReport {
    /// Resolved zone
    pub zone: Zone,
    /// Name of the deleted record as it was stored
    pub record_name: String,
    /// Status returned by the submission
    pub change: ChangeStatus,
}

/// Alias workflow engine
///
/// ## Lifecycle
///
/// 1. Create with [`AliasEngine::new()`]
/// 2. Call [`AliasEngine::create_alias()`] / [`AliasEngine::remove_alias()`]
/// 3. Drain the event receiver if interested; dropping it is fine
pub struct AliasEngine {
    directory: DirectoryClient,
    mutator: AliasMutator,
    tracker: ChangeTracker,
    waiter: ConvergenceWaiter,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl AliasEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `backend`: Collaborators to run against
    /// - `config`: Validated before use
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(backend: Backend, config: AliasConfig) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let directory = DirectoryClient::new(&backend, config.directory);
        let tracker = ChangeTracker::new(backend.changes.clone());
        let engine = Self {
            mutator: AliasMutator::new(backend.mutator.clone(), directory.clone()),
            waiter: ConvergenceWaiter::new(tracker.clone(), config.wait)?,
            directory,
            tracker,
            event_tx: tx,
        };

        debug!(backend = %backend.name, "alias engine ready");
        Ok((engine, rx))
    }

    /// The directory client used for lookups
    pub fn directory(&self) -> &DirectoryClient {
        &self.directory
    }

    /// Point an alias at a load balancer
    ///
    /// Resolves the zone and load balancer, submits the upsert and, unless
    /// `request.wait` is false, waits for convergence. A wait that times out
    /// still yields `Ok`: the change was accepted, only its propagation is
    /// unconfirmed.
    ///
    /// # Errors
    ///
    /// Lookup and submission errors are returned as-is; so is a failed
    /// status poll during the wait.
    pub async fn create_alias(&self, request: CreateAliasRequest) -> Result<CreateAliasReport> {
        let waiter = match request.timeout {
            Some(timeout) => self.waiter_with_timeout(timeout)?,
            None => self.waiter.clone(),
        };

        let zone = self.directory.find_zone(&request.zone).await?;
        self.emit_event(EngineEvent::ZoneResolved { zone: zone.clone() });

        let load_balancer = self
            .directory
            .find_load_balancer(&request.load_balancer_dns_name)
            .await?;
        self.emit_event(EngineEvent::LoadBalancerResolved {
            load_balancer: load_balancer.clone(),
        });

        let change = self
            .mutator
            .set_alias(
                &zone,
                &load_balancer.hosted_zone_id,
                &load_balancer.dns_name,
                &request.alias,
            )
            .await?;
        let record_name = alias_fqdn(&request.alias, &zone.name);
        self.emit_event(EngineEvent::ChangeSubmitted {
            record_name: record_name.clone(),
            change_id: change.id.clone(),
        });

        let wait = if request.wait {
            let outcome = waiter.wait(&change).await?;
            self.emit_outcome(&outcome);
            Some(outcome)
        } else {
            debug!(change_id = %change.id, "skipping convergence wait");
            None
        };

        Ok(CreateAliasReport {
            zone,
            load_balancer,
            record_name,
            change,
            wait,
        })
    }

    /// Delete an alias record
    ///
    /// Does not wait for convergence.
    ///
    /// # Errors
    ///
    /// `Error::RecordNotFound` if the alias does not exist; nothing is
    /// submitted in that case.
    pub async fn remove_alias(&self, request: RemoveAliasRequest) -> Result<RemoveAliasReport> {
        let zone = self.directory.find_zone(&request.zone).await?;
        self.emit_event(EngineEvent::ZoneResolved { zone: zone.clone() });

        let (removed, change) = self
            .mutator
            .remove_alias_record(&zone, &request.alias)
            .await?;
        let record_name = removed.name;
        self.emit_event(EngineEvent::ChangeSubmitted {
            record_name: record_name.clone(),
            change_id: change.id.clone(),
        });

        Ok(RemoveAliasReport {
            zone,
            record_name,
            change,
        })
    }

    /// Current status of change `id`
    pub async fn change_status(&self, id: &str) -> Result<ChangeStatus> {
        self.tracker.get_change_status(id).await
    }

    /// Wait for change `id` to converge
    ///
    /// Reads the current status first, so an already converged change
    /// returns without polling.
    pub async fn wait_for_change(&self, id: &str) -> Result<WaitOutcome> {
        let current = self.tracker.get_change_status(id).await?;
        let outcome = self.waiter.wait(&current).await?;
        self.emit_outcome(&outcome);
        Ok(outcome)
    }

    fn waiter_with_timeout(&self, timeout: Duration) -> Result<ConvergenceWaiter> {
        let config = WaitConfig::new(self.waiter.config().poll_interval(), timeout);
        ConvergenceWaiter::new(self.tracker.clone(), config)
    }

    fn emit_outcome(&self, outcome: &WaitOutcome) {
        match outcome {
            WaitOutcome::Converged { status, polls } => {
                info!(change_id = %status.id, polls, "alias change converged");
                self.emit_event(EngineEvent::Converged {
                    change_id: status.id.clone(),
                    polls: *polls,
                });
            }
            WaitOutcome::TimedOut { change_id, waited } => {
                self.emit_event(EngineEvent::TimedOut {
                    change_id: change_id.clone(),
                    waited: *waited,
                });
            }
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full or closed, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

impl std::fmt::Debug for AliasEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasEngine")
            .field("directory", &self.directory)
            .field("waiter", &self.waiter)
            .finish()
    }
}
