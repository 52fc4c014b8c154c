//! Entitlement read service
//!
//! Assembles resolver inputs from authoritative storage on every check.
//! There is deliberately no cache at this layer: a stale relationship or
//! unlock record turns into a wrong entitlement decision, so staleness here
//! is a correctness bug, not a performance one.

use std::sync::Arc;

use tracing::{instrument, warn};

use fanforge_db::{
    ContentRepository, FollowRepository, SubscriptionRepository, UnlockRepository,
};
use fanforge_types::{
    ContentUnitId, ContentVisibility, CreatorId, LockDecision, MediaDirective, PpvLock,
    SubscriptionStatus, UnlockRecord, ViewerId, ViewerRelationship,
};

use crate::resolver::resolve;
use crate::EntitlementError;

/// A resolved entitlement for one (viewer, content unit) pair
#[derive(Debug, Clone)]
pub struct ResolvedEntitlement {
    /// The access decision
    pub decision: LockDecision,
    /// What the media collaborator should serve for this decision
    pub media: MediaDirective,
    /// Creator who owns the content unit
    pub creator_id: CreatorId,
    /// The unit's PPV lock, if it is individually sold
    pub ppv_lock: Option<PpvLock>,
}

/// Entitlement read service
///
/// Explicit viewer context is passed into every call; nothing is read from
/// ambient state, so a stale cached identity cannot leak into a decision.
#[derive(Clone)]
pub struct EntitlementService<C, F, S, U> {
    content: Arc<C>,
    follows: Arc<F>,
    subscriptions: Arc<S>,
    unlocks: Arc<U>,
}

impl<C, F, S, U> EntitlementService<C, F, S, U>
where
    C: ContentRepository,
    F: FollowRepository,
    S: SubscriptionRepository,
    U: UnlockRepository,
{
    /// Create a new entitlement service
    pub fn new(content: Arc<C>, follows: Arc<F>, subscriptions: Arc<S>, unlocks: Arc<U>) -> Self {
        Self {
            content,
            follows,
            subscriptions,
            unlocks,
        }
    }

    /// Resolve entitlement for a viewer (or anonymous) and a content unit
    #[instrument(skip(self))]
    pub async fn resolve_for(
        &self,
        viewer: Option<ViewerId>,
        content_unit_id: ContentUnitId,
    ) -> Result<ResolvedEntitlement, EntitlementError> {
        let unit = self
            .content
            .find_by_id(content_unit_id.0)
            .await?
            .ok_or(EntitlementError::ContentNotFound)?;

        let creator_id = CreatorId(unit.creator_id);
        let visibility: ContentVisibility = unit.visibility.parse().unwrap_or_else(|_| {
            warn!(content_unit_id = %content_unit_id, visibility = %unit.visibility,
                  "unknown stored visibility, treating as subscribers-only");
            ContentVisibility::Subscribers
        });

        let ppv_lock = match (unit.ppv_price_minor_units, unit.ppv_currency) {
            (Some(price), Some(currency)) => Some(PpvLock::new(price, currency)),
            _ => None,
        };

        let (is_owner, relationship, unlock) = match viewer {
            Some(viewer_id) => {
                let is_owner = viewer_id.0 == creator_id.0;
                let relationship = self.relationship(viewer_id, creator_id).await?;
                let unlock = self
                    .unlocks
                    .find(viewer_id.0, content_unit_id.0)
                    .await?
                    .map(|row| UnlockRecord {
                        viewer_id: ViewerId(row.viewer_id),
                        content_unit_id: ContentUnitId(row.content_unit_id),
                        purchased_at: row.purchased_at,
                    });
                (is_owner, relationship, unlock)
            }
            None => (false, ViewerRelationship::anonymous(), None),
        };

        let decision = resolve(
            content_unit_id,
            visibility,
            ppv_lock.as_ref(),
            &relationship,
            unlock.as_ref(),
            is_owner,
        );

        Ok(ResolvedEntitlement {
            decision,
            media: MediaDirective::for_decision(&decision),
            creator_id,
            ppv_lock,
        })
    }

    /// Load the viewer's relationship to a creator from authoritative state
    #[instrument(skip(self))]
    pub async fn relationship(
        &self,
        viewer: ViewerId,
        creator: CreatorId,
    ) -> Result<ViewerRelationship, EntitlementError> {
        let is_following = self.follows.is_following(viewer.0, creator.0).await?;

        let subscription = self
            .subscriptions
            .find_by_viewer_and_creator(viewer.0, creator.0)
            .await?;

        let (subscription_status, cancel_at_period_end) = match subscription {
            Some(row) => {
                let status = row.status.parse().unwrap_or_else(|_| {
                    warn!(status = %row.status, "unknown stored subscription status");
                    SubscriptionStatus::Canceled
                });
                (status, row.cancel_at_period_end)
            }
            None => (SubscriptionStatus::None, false),
        };

        Ok(ViewerRelationship {
            is_following,
            subscription_status,
            subscription_cancel_at_period_end: cancel_at_period_end,
        })
    }

    /// Whether the viewer holds a subscription that satisfies the
    /// subscribers gate for this creator
    pub async fn subscription_active(
        &self,
        viewer: ViewerId,
        creator: CreatorId,
    ) -> Result<bool, EntitlementError> {
        let relationship = self.relationship(viewer, creator).await?;
        Ok(relationship.subscription_status.satisfies_subscriber_gate())
    }
}

impl<C, F, S, U> std::fmt::Debug for EntitlementService<C, F, S, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementService").finish()
    }
}
