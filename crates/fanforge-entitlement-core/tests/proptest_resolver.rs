//! Property-based tests for the entitlement resolver
//!
//! These verify the access-control properties of the precedence function:
//! - Public unguarded content is open to every relationship state
//! - Owners always see their own content
//! - The subscribers gate admits exactly Active/Trialing
//! - A paid unlock always grants access
//! - Resolution is deterministic

use chrono::Utc;
use proptest::prelude::*;

use fanforge_entitlement_core::resolve;
use fanforge_types::{
    ContentUnitId, ContentVisibility, LockReason, PpvLock, SubscriptionStatus, UnlockRecord,
    ViewerId, ViewerRelationship,
};

// ============================================================================
// Strategies
// ============================================================================

fn arb_visibility() -> impl Strategy<Value = ContentVisibility> {
    prop_oneof![
        Just(ContentVisibility::Public),
        Just(ContentVisibility::Followers),
        Just(ContentVisibility::Subscribers),
    ]
}

fn arb_status() -> impl Strategy<Value = SubscriptionStatus> {
    prop_oneof![
        Just(SubscriptionStatus::None),
        Just(SubscriptionStatus::Active),
        Just(SubscriptionStatus::Trialing),
        Just(SubscriptionStatus::PastDue),
        Just(SubscriptionStatus::Canceled),
    ]
}

fn arb_relationship() -> impl Strategy<Value = ViewerRelationship> {
    (any::<bool>(), arb_status(), any::<bool>()).prop_map(
        |(is_following, subscription_status, cancel)| ViewerRelationship {
            is_following,
            subscription_status,
            subscription_cancel_at_period_end: cancel,
        },
    )
}

fn arb_ppv_lock() -> impl Strategy<Value = Option<PpvLock>> {
    prop_oneof![
        Just(None),
        (100i64..100_000).prop_map(|price| Some(PpvLock::new(price, "usd"))),
    ]
}

fn unlock_for(content_unit_id: ContentUnitId) -> UnlockRecord {
    UnlockRecord {
        viewer_id: ViewerId::new(),
        content_unit_id,
        purchased_at: Utc::now(),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Property: public content with no PPV lock is unlocked for every
    /// relationship state, including anonymous
    #[test]
    fn prop_public_unguarded_open_to_all(relationship in arb_relationship()) {
        let unit = ContentUnitId::new();
        let decision = resolve(unit, ContentVisibility::Public, None, &relationship, None, false);
        prop_assert!(!decision.locked);
        prop_assert_eq!(decision.reason, LockReason::None);
    }

    /// Property: owners see their own content regardless of gating
    #[test]
    fn prop_owner_always_unlocked(
        visibility in arb_visibility(),
        ppv_lock in arb_ppv_lock(),
        relationship in arb_relationship(),
    ) {
        let unit = ContentUnitId::new();
        let decision = resolve(unit, visibility, ppv_lock.as_ref(), &relationship, None, true);
        prop_assert!(!decision.locked);
    }

    /// Property: the subscribers gate (no PPV lock) admits exactly
    /// Active/Trialing; everyone else gets SubscribeRequired
    #[test]
    fn prop_subscriber_gate_exact(relationship in arb_relationship()) {
        let unit = ContentUnitId::new();
        let decision = resolve(unit, ContentVisibility::Subscribers, None, &relationship, None, false);
        if relationship.subscription_status.satisfies_subscriber_gate() {
            prop_assert!(!decision.locked);
        } else {
            prop_assert!(decision.locked);
            prop_assert_eq!(decision.reason, LockReason::SubscribeRequired);
        }
    }

    /// Property: a matching unlock record grants access to a PPV-locked unit
    /// regardless of visibility and relationship
    #[test]
    fn prop_paid_unlock_overrides_gating(
        visibility in arb_visibility(),
        relationship in arb_relationship(),
        price in 100i64..100_000,
    ) {
        let unit = ContentUnitId::new();
        let lock = PpvLock::new(price, "usd");
        let unlock = unlock_for(unit);
        let decision = resolve(unit, visibility, Some(&lock), &relationship, Some(&unlock), false);
        prop_assert!(!decision.locked);
    }

    /// Property: a locked PPV unit without subscription access always offers
    /// the single-unit purchase path, never a subscription upsell
    #[test]
    fn prop_locked_ppv_offers_ppv(
        relationship in arb_relationship(),
        price in 100i64..100_000,
    ) {
        let lock = PpvLock::new(price, "usd");
        let decision = resolve(
            ContentUnitId::new(),
            ContentVisibility::Subscribers,
            Some(&lock),
            &relationship,
            None,
            false,
        );
        if decision.locked {
            prop_assert_eq!(decision.reason, LockReason::PpvRequired);
        }
    }

    /// Property: resolution is deterministic for identical inputs
    #[test]
    fn prop_resolution_deterministic(
        visibility in arb_visibility(),
        ppv_lock in arb_ppv_lock(),
        relationship in arb_relationship(),
        is_owner in any::<bool>(),
    ) {
        let unit = ContentUnitId::new();
        let first = resolve(unit, visibility, ppv_lock.as_ref(), &relationship, None, is_owner);
        let second = resolve(unit, visibility, ppv_lock.as_ref(), &relationship, None, is_owner);
        prop_assert_eq!(first, second);
    }
}
