//! Entitlement reconciliation poller
//!
//! After a viewer returns from the external payment flow, the webhook that
//! grants entitlement races the redirect back to the success page. This
//! module re-queries authoritative entitlement at a fixed interval until it
//! reflects the purchase or a bounded attempt budget is exhausted.
//!
//! The interval is deliberately fixed, not exponential: the window is short
//! (about 20 seconds) and the webhook almost always lands inside it. Do not
//! swap in a generic backoff scheme without re-examining that budget.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use async_trait::async_trait;

use fanforge_types::{ContentUnitId, CreatorId, ViewerId};

use crate::EntitlementError;

/// What the poller verifies after a payment redirect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileTarget {
    /// Viewer who just paid
    pub viewer_id: ViewerId,
    /// Creator the payment targeted
    pub creator_id: CreatorId,
    /// Specific unit for PPV purchases; `None` verifies the subscription
    pub content_unit_id: Option<ContentUnitId>,
}

/// Source of truth the poller queries
///
/// Abstracted so the loop is testable against fakes; the production
/// implementation is the entitlement read service.
#[async_trait]
pub trait EntitlementProbe: Send + Sync + 'static {
    /// Whether the target is entitled right now
    async fn check(&self, target: &ReconcileTarget) -> Result<bool, EntitlementError>;
}

#[async_trait]
impl<C, F, S, U> EntitlementProbe for crate::EntitlementService<C, F, S, U>
where
    C: fanforge_db::ContentRepository + 'static,
    F: fanforge_db::FollowRepository + 'static,
    S: fanforge_db::SubscriptionRepository + 'static,
    U: fanforge_db::UnlockRepository + 'static,
{
    async fn check(&self, target: &ReconcileTarget) -> Result<bool, EntitlementError> {
        match target.content_unit_id {
            Some(content_unit_id) => {
                let resolved = self
                    .resolve_for(Some(target.viewer_id), content_unit_id)
                    .await?;
                Ok(!resolved.decision.locked)
            }
            None => {
                self.subscription_active(target.viewer_id, target.creator_id)
                    .await
            }
        }
    }
}

/// Configuration for the reconciliation loop
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Fixed delay between polls
    pub interval: Duration,
    /// Maximum number of polls before giving up
    pub max_attempts: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 10,
        }
    }
}

impl ReconcileConfig {
    /// Create a new reconcile configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the poll interval
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the maximum number of polls
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }
}

/// Poller state, observable while the loop runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    /// Still querying entitlement
    Polling,
    /// Entitlement reflects the purchase
    Confirmed,
    /// Attempt budget exhausted without confirmation
    ///
    /// Not an error: the purchase almost certainly succeeded and the webhook
    /// is late. Callers surface soft "may take a moment" copy, never an
    /// alarming failure.
    GaveUp,
}

/// Terminal outcome of a reconciliation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Entitlement confirmed after `attempts` polls
    Confirmed {
        /// Polls issued, including the confirming one
        attempts: u32,
    },
    /// Budget exhausted after `attempts` polls
    GaveUp {
        /// Polls issued
        attempts: u32,
    },
}

/// Handle to a running reconciliation loop
///
/// Dropping the handle cancels the loop, so a view teardown cannot leak a
/// pending timer. A response arriving after cancellation is discarded, never
/// applied.
pub struct ReconcileHandle {
    token: CancellationToken,
    state: watch::Receiver<ReconcileState>,
    join: Option<JoinHandle<Option<ReconcileOutcome>>>,
}

impl ReconcileHandle {
    /// Cancel the loop
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Current poller state
    pub fn state(&self) -> ReconcileState {
        *self.state.borrow()
    }

    /// Wait for the loop to finish
    ///
    /// Returns `None` if the loop was cancelled before reaching an outcome.
    pub async fn outcome(mut self) -> Option<ReconcileOutcome> {
        let join = self.join.take()?;
        join.await.ok().flatten()
    }
}

impl Drop for ReconcileHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for ReconcileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcileHandle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Spawn a reconciliation loop for one target
///
/// One loop per page instance per target; spawning a second loop for the
/// same target is the caller's bug, not deduplicated here.
pub fn spawn_reconcile<P: EntitlementProbe>(
    probe: Arc<P>,
    target: ReconcileTarget,
    config: ReconcileConfig,
) -> ReconcileHandle {
    let token = CancellationToken::new();
    let (state_tx, state_rx) = watch::channel(ReconcileState::Polling);

    let cancel = token.clone();
    let join = tokio::spawn(async move {
        let mut attempts = 0u32;

        while attempts < config.max_attempts {
            // Racing the probe against cancellation discards a late response
            // instead of applying it to state after navigation.
            let entitled = tokio::select! {
                () = cancel.cancelled() => {
                    debug!(attempts, "reconciliation cancelled");
                    return None;
                }
                result = probe.check(&target) => match result {
                    Ok(entitled) => entitled,
                    Err(e) => {
                        // Transport failures consume attempts; the budget is
                        // the only thing that ends the loop early.
                        warn!(error = %e, attempts, "entitlement poll failed");
                        false
                    }
                },
            };
            attempts += 1;

            if entitled {
                debug!(attempts, "entitlement confirmed");
                let _ = state_tx.send(ReconcileState::Confirmed);
                return Some(ReconcileOutcome::Confirmed { attempts });
            }

            if attempts < config.max_attempts {
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!(attempts, "reconciliation cancelled");
                        return None;
                    }
                    () = sleep(config.interval) => {}
                }
            }
        }

        debug!(attempts, "reconciliation gave up");
        let _ = state_tx.send(ReconcileState::GaveUp);
        Some(ReconcileOutcome::GaveUp { attempts })
    });

    ReconcileHandle {
        token,
        state: state_rx,
        join: Some(join),
    }
}
