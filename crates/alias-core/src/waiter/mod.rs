//! Convergence waiter
//!
//! Blocks until a submitted change reports `INSYNC` or a deadline passes.
//!
//! ## State Machine
//!
//! ```text
//!            ┌──── still PENDING ────┐
//!            ▼                       │
//!      ┌──────────┐   interval   ┌───┴────┐
//!      │ Waiting  │─────────────▶│  Poll  │
//!      └──────────┘              └───┬────┘
//!            │                       │
//!   deadline │          INSYNC       │  query error
//!            ▼          ▼            ▼
//!       TimedOut    Converged      Failed
//! ```
//!
//! The poll loop runs on its own task and reports back over a oneshot
//! channel. Whichever way the wait ends, the task is aborted and joined
//! before [`ConvergenceWaiter::wait`] returns, so no status query is ever
//! issued after it.

use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info, warn};

use crate::config::WaitConfig;
use crate::error::{Error, Result};
use crate::tracker::ChangeTracker;
use crate::types::ChangeStatus;

/// How a wait ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The change reported INSYNC
    Converged {
        /// Status as last observed
        status: ChangeStatus,
        /// Status queries issued by the waiter
        polls: usize,
    },

    /// The deadline passed first
    ///
    /// The change itself was accepted; only confirmation is missing.
    TimedOut {
        /// Id to check later
        change_id: String,
        /// How long the waiter waited
        waited: Duration,
    },
}

impl WaitOutcome {
    /// Id of the change waited on
    pub fn change_id(&self) -> &str {
        match self {
            WaitOutcome::Converged { status, .. } => &status.id,
            WaitOutcome::TimedOut { change_id, .. } => change_id,
        }
    }

    /// Whether the change reported INSYNC
    pub fn is_converged(&self) -> bool {
        matches!(self, WaitOutcome::Converged { .. })
    }

    /// Treat a timeout as an error
    pub fn into_result(self) -> Result<ChangeStatus> {
        match self {
            WaitOutcome::Converged { status, .. } => Ok(status),
            WaitOutcome::TimedOut { change_id, waited } => Err(Error::Timeout { change_id, waited }),
        }
    }
}

/// Polls a change until it converges or the deadline passes
#[derive(Debug, Clone)]
pub struct ConvergenceWaiter {
    tracker: ChangeTracker,
    config: WaitConfig,
}

impl ConvergenceWaiter {
    /// Create a waiter with the given policy
    ///
    /// Fails with `Error::Config` when the policy is invalid.
    pub fn new(tracker: ChangeTracker, config: WaitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { tracker, config })
    }

    /// The policy in use
    pub fn config(&self) -> &WaitConfig {
        &self.config
    }

    /// Wait for `initial` to converge
    ///
    /// Returns immediately, without querying, if `initial` is already
    /// INSYNC. Otherwise the status is re-read every poll interval until it
    /// is INSYNC or the timeout elapses.
    ///
    /// # Returns
    ///
    /// - `Ok(WaitOutcome::Converged)`: the change propagated
    /// - `Ok(WaitOutcome::TimedOut)`: the deadline passed first
    /// - `Err(Error)`: a status query failed; the wait is abandoned
    pub async fn wait(&self, initial: &ChangeStatus) -> Result<WaitOutcome> {
        if initial.is_in_sync() {
            debug!(change_id = %initial.id, "change already in sync");
            return Ok(WaitOutcome::Converged {
                status: initial.clone(),
                polls: 0,
            });
        }

        let timeout = self.config.timeout();
        let (done_tx, done_rx) = oneshot::channel();
        let poller = tokio::spawn(poll_until_in_sync(
            self.tracker.clone(),
            initial.id.clone(),
            self.config.poll_interval(),
            done_tx,
        ));

        let outcome = match tokio::time::timeout(timeout, done_rx).await {
            Ok(Ok(Ok((status, polls)))) => {
                info!(change_id = %status.id, polls, "change in sync");
                Ok(WaitOutcome::Converged { status, polls })
            }
            Ok(Ok(Err(e))) => {
                warn!(change_id = %initial.id, error = %e, "status poll failed");
                Err(e)
            }
            Ok(Err(_)) => Err(Error::Other(format!(
                "status poller for change {} stopped without a result",
                initial.id
            ))),
            Err(_) => {
                warn!(
                    change_id = %initial.id,
                    timeout_ms = timeout.as_millis() as u64,
                    "timed out waiting for change to sync"
                );
                Ok(WaitOutcome::TimedOut {
                    change_id: initial.id.clone(),
                    waited: timeout,
                })
            }
        };

        poller.abort();
        let _ = poller.await;
        outcome
    }
}

/// Poll loop run on its own task
///
/// Sends exactly one message: the INSYNC status with the poll count, or the
/// first query error.
async fn poll_until_in_sync(
    tracker: ChangeTracker,
    change_id: String,
    every: Duration,
    done: oneshot::Sender<Result<(ChangeStatus, usize)>>,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + every, every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = IntervalStream::new(interval);

    let mut polls = 0usize;
    while ticks.next().await.is_some() {
        polls += 1;
        match tracker.get_change_status(&change_id).await {
            Ok(status) if status.is_in_sync() => {
                let _ = done.send(Ok((status, polls)));
                return;
            }
            Ok(status) => {
                debug!(change_id = %change_id, poll = polls, state = %status.state, "change not in sync yet");
            }
            Err(e) => {
                let _ = done.send(Err(e));
                return;
            }
        }
    }
}
