//! Entitlement resolver
//!
//! The single ordered-precedence decision function for content gating. Every
//! surface that shows gated content goes through [`resolve`]; duplicating
//! this precedence logic per page is how paywall bypasses happen.

use fanforge_types::{
    ContentUnitId, ContentVisibility, LockDecision, LockReason, PpvLock, UnlockRecord,
    ViewerRelationship,
};

/// Decide whether a viewer may see a content unit in full.
///
/// Pure and deterministic: no I/O, no clock, no caching. Re-evaluated on
/// every render and never memoized across a checkout attempt.
///
/// `unlock` must be the record for the exact content unit being resolved;
/// debug builds assert the IDs line up. Precedence, in order:
///
/// 1. Owners always see their own content.
/// 2. Public content with no PPV lock is open to everyone.
/// 3. A paid unlock grants access regardless of visibility tier.
/// 4. Subscribers-gated content requires an active or trialing subscription;
///    when locked and individually sold, the PPV purchase path is offered in
///    preference to a subscription upsell.
/// 5. Followers-gated content requires a follow.
/// 6. Public content with a PPV lock and no unlock requires purchase.
pub fn resolve(
    content_unit_id: ContentUnitId,
    visibility: ContentVisibility,
    ppv_lock: Option<&PpvLock>,
    relationship: &ViewerRelationship,
    unlock: Option<&UnlockRecord>,
    is_owner: bool,
) -> LockDecision {
    if let Some(record) = unlock {
        debug_assert_eq!(
            record.content_unit_id, content_unit_id,
            "unlock record does not belong to the unit being resolved"
        );
    }

    if is_owner {
        return LockDecision::unlocked();
    }

    if visibility == ContentVisibility::Public && ppv_lock.is_none() {
        return LockDecision::unlocked();
    }

    // The viewer already paid for this specific unit; tier gating no longer
    // applies. Subscriber-tier content sold piecemeal needs *either* an
    // active subscription *or* an unlock, not both.
    if ppv_lock.is_some() && unlock.is_some() {
        return LockDecision::unlocked();
    }

    match visibility {
        ContentVisibility::Subscribers => {
            if relationship.subscription_status.satisfies_subscriber_gate() {
                LockDecision::unlocked()
            } else if ppv_lock.is_some() {
                LockDecision::locked(LockReason::PpvRequired)
            } else {
                LockDecision::locked(LockReason::SubscribeRequired)
            }
        }
        ContentVisibility::Followers => {
            if relationship.is_following {
                LockDecision::unlocked()
            } else {
                LockDecision::locked(LockReason::FollowRequired)
            }
        }
        // Public is only reachable here with a PPV lock and no unlock
        ContentVisibility::Public => LockDecision::locked(LockReason::PpvRequired),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fanforge_types::{SubscriptionStatus, ViewerId};

    fn subscriber(status: SubscriptionStatus) -> ViewerRelationship {
        ViewerRelationship {
            is_following: false,
            subscription_status: status,
            subscription_cancel_at_period_end: false,
        }
    }

    fn follower() -> ViewerRelationship {
        ViewerRelationship {
            is_following: true,
            subscription_status: SubscriptionStatus::None,
            subscription_cancel_at_period_end: false,
        }
    }

    fn unlock_for(content_unit_id: ContentUnitId) -> UnlockRecord {
        UnlockRecord {
            viewer_id: ViewerId::new(),
            content_unit_id,
            purchased_at: Utc::now(),
        }
    }

    #[test]
    fn test_public_no_lock_open_to_anonymous() {
        let decision = resolve(
            ContentUnitId::new(),
            ContentVisibility::Public,
            None,
            &ViewerRelationship::anonymous(),
            None,
            false,
        );
        assert_eq!(decision, LockDecision::unlocked());
    }

    #[test]
    fn test_owner_sees_everything() {
        let lock = PpvLock::new(500, "usd");
        let decision = resolve(
            ContentUnitId::new(),
            ContentVisibility::Subscribers,
            Some(&lock),
            &ViewerRelationship::anonymous(),
            None,
            true,
        );
        assert_eq!(decision, LockDecision::unlocked());
    }

    #[test]
    fn test_subscribers_gate_requires_active_or_trialing() {
        let unit = ContentUnitId::new();
        for status in [SubscriptionStatus::Active, SubscriptionStatus::Trialing] {
            let decision = resolve(
                unit,
                ContentVisibility::Subscribers,
                None,
                &subscriber(status),
                None,
                false,
            );
            assert_eq!(decision, LockDecision::unlocked(), "status {status}");
        }
        for status in [
            SubscriptionStatus::None,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Canceled,
        ] {
            let decision = resolve(
                unit,
                ContentVisibility::Subscribers,
                None,
                &subscriber(status),
                None,
                false,
            );
            assert_eq!(
                decision,
                LockDecision::locked(LockReason::SubscribeRequired),
                "status {status}"
            );
        }
    }

    #[test]
    fn test_cancel_pending_subscription_still_satisfies_gate() {
        let relationship = ViewerRelationship {
            is_following: false,
            subscription_status: SubscriptionStatus::Active,
            subscription_cancel_at_period_end: true,
        };
        let decision = resolve(
            ContentUnitId::new(),
            ContentVisibility::Subscribers,
            None,
            &relationship,
            None,
            false,
        );
        assert_eq!(decision, LockDecision::unlocked());
    }

    #[test]
    fn test_paid_unlock_overrides_subscriber_gate() {
        let unit = ContentUnitId::new();
        let lock = PpvLock::new(500, "usd");
        let unlock = unlock_for(unit);
        let decision = resolve(
            unit,
            ContentVisibility::Subscribers,
            Some(&lock),
            &ViewerRelationship::anonymous(),
            Some(&unlock),
            false,
        );
        assert_eq!(decision, LockDecision::unlocked());
    }

    #[test]
    fn test_paid_unlock_overrides_follower_gate() {
        let unit = ContentUnitId::new();
        let lock = PpvLock::new(500, "usd");
        let unlock = unlock_for(unit);
        let decision = resolve(
            unit,
            ContentVisibility::Followers,
            Some(&lock),
            &ViewerRelationship::anonymous(),
            Some(&unlock),
            false,
        );
        assert_eq!(decision, LockDecision::unlocked());
    }

    #[test]
    fn test_subscribers_plus_ppv_offers_ppv_not_subscribe() {
        // Creator sets subscribers visibility plus a $5 lock; viewer has no
        // subscription and no unlock. The cheaper single-unit path wins.
        let lock = PpvLock::new(500, "usd");
        let decision = resolve(
            ContentUnitId::new(),
            ContentVisibility::Subscribers,
            Some(&lock),
            &ViewerRelationship::anonymous(),
            None,
            false,
        );
        assert_eq!(decision, LockDecision::locked(LockReason::PpvRequired));
    }

    #[test]
    fn test_followers_gate() {
        let unit = ContentUnitId::new();
        let decision = resolve(unit, ContentVisibility::Followers, None, &follower(), None, false);
        assert_eq!(decision, LockDecision::unlocked());

        let decision = resolve(
            unit,
            ContentVisibility::Followers,
            None,
            &ViewerRelationship::anonymous(),
            None,
            false,
        );
        assert_eq!(decision, LockDecision::locked(LockReason::FollowRequired));
    }

    #[test]
    fn test_public_with_lock_requires_purchase() {
        let lock = PpvLock::new(300, "usd");
        let decision = resolve(
            ContentUnitId::new(),
            ContentVisibility::Public,
            Some(&lock),
            &follower(),
            None,
            false,
        );
        assert_eq!(decision, LockDecision::locked(LockReason::PpvRequired));
    }

    #[test]
    fn test_active_subscriber_passes_without_unlock() {
        // The "either" semantics: subscription alone is enough even when the
        // unit is also individually sold.
        let lock = PpvLock::new(500, "usd");
        let decision = resolve(
            ContentUnitId::new(),
            ContentVisibility::Subscribers,
            Some(&lock),
            &subscriber(SubscriptionStatus::Active),
            None,
            false,
        );
        assert_eq!(decision, LockDecision::unlocked());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let unit = ContentUnitId::new();
        let lock = PpvLock::new(500, "usd");
        let unlock = unlock_for(unit);
        let first = resolve(
            unit,
            ContentVisibility::Subscribers,
            Some(&lock),
            &ViewerRelationship::anonymous(),
            Some(&unlock),
            false,
        );
        let second = resolve(
            unit,
            ContentVisibility::Subscribers,
            Some(&lock),
            &ViewerRelationship::anonymous(),
            Some(&unlock),
            false,
        );
        assert_eq!(first, second);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "unlock record does not belong")]
    fn test_unlock_for_other_unit_panics_in_debug() {
        let lock = PpvLock::new(500, "usd");
        let unlock = unlock_for(ContentUnitId::new());
        resolve(
            ContentUnitId::new(),
            ContentVisibility::Subscribers,
            Some(&lock),
            &ViewerRelationship::anonymous(),
            Some(&unlock),
            false,
        );
    }
}
