//! Mock repositories for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use fanforge_db::{
    ContentRepository, ContentUnitRow, CreateSubscription, CreateUnlock, DbResult,
    FollowRepository, SubscriptionRepository, SubscriptionRow, UnlockRepository, UnlockRow,
};

/// In-memory content repository for testing
#[derive(Default, Clone)]
pub struct MockContentRepository {
    units: Arc<DashMap<Uuid, ContentUnitRow>>,
}

impl MockContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test content unit directly
    pub fn insert_unit(&self, unit: ContentUnitRow) {
        self.units.insert(unit.id, unit);
    }

    /// Build a test content unit
    pub fn make_unit(
        creator_id: Uuid,
        visibility: &str,
        ppv_price_minor_units: Option<i64>,
    ) -> ContentUnitRow {
        ContentUnitRow {
            id: Uuid::new_v4(),
            creator_id,
            visibility: visibility.to_string(),
            ppv_price_minor_units,
            ppv_currency: ppv_price_minor_units.map(|_| "usd".to_string()),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl ContentRepository for MockContentRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ContentUnitRow>> {
        Ok(self.units.get(&id).map(|r| r.value().clone()))
    }
}

/// In-memory follow repository for testing
#[derive(Default, Clone)]
pub struct MockFollowRepository {
    follows: Arc<DashMap<(Uuid, Uuid), ()>>,
}

impl MockFollowRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a viewer follows a creator
    pub fn follow(&self, viewer_id: Uuid, creator_id: Uuid) {
        self.follows.insert((viewer_id, creator_id), ());
    }
}

#[async_trait]
impl FollowRepository for MockFollowRepository {
    async fn is_following(&self, viewer_id: Uuid, creator_id: Uuid) -> DbResult<bool> {
        Ok(self.follows.contains_key(&(viewer_id, creator_id)))
    }
}

/// In-memory subscription repository for testing
#[derive(Default, Clone)]
pub struct MockSubscriptionRepository {
    subs: Arc<DashMap<(Uuid, Uuid), SubscriptionRow>>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test subscription directly
    pub fn insert_subscription(&self, sub: SubscriptionRow) {
        self.subs.insert((sub.viewer_id, sub.creator_id), sub);
    }

    /// Build a test subscription with the given status
    pub fn make_subscription(
        viewer_id: Uuid,
        creator_id: Uuid,
        status: &str,
        cancel_at_period_end: bool,
    ) -> SubscriptionRow {
        SubscriptionRow {
            id: Uuid::new_v4(),
            viewer_id,
            creator_id,
            status: status.to_string(),
            provider_subscription_id: Some(format!("sub_{}", Uuid::new_v4())),
            current_period_start: Utc::now(),
            current_period_end: Utc::now() + chrono::Duration::days(30),
            cancel_at_period_end,
            canceled_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_viewer_and_creator(
        &self,
        viewer_id: Uuid,
        creator_id: Uuid,
    ) -> DbResult<Option<SubscriptionRow>> {
        Ok(self
            .subs
            .get(&(viewer_id, creator_id))
            .map(|r| r.value().clone()))
    }

    async fn find_by_provider_id(&self, provider_id: &str) -> DbResult<Option<SubscriptionRow>> {
        Ok(self.subs.iter().find_map(|entry| {
            (entry.value().provider_subscription_id.as_deref() == Some(provider_id))
                .then(|| entry.value().clone())
        }))
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let row = SubscriptionRow {
            id: sub.id,
            viewer_id: sub.viewer_id,
            creator_id: sub.creator_id,
            status: sub.status,
            provider_subscription_id: sub.provider_subscription_id,
            current_period_start: sub.current_period_start,
            current_period_end: sub.current_period_end,
            cancel_at_period_end: false,
            canceled_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.insert_subscription(row.clone());
        Ok(row)
    }

    async fn update_from_provider(
        &self,
        id: Uuid,
        status: &str,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        cancel_at_period_end: bool,
    ) -> DbResult<()> {
        for mut entry in self.subs.iter_mut() {
            if entry.value().id == id {
                let row = entry.value_mut();
                row.status = status.to_string();
                row.current_period_start = period_start;
                row.current_period_end = period_end;
                row.cancel_at_period_end = cancel_at_period_end;
                row.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn cancel(&self, id: Uuid) -> DbResult<()> {
        for mut entry in self.subs.iter_mut() {
            if entry.value().id == id {
                let row = entry.value_mut();
                row.status = "canceled".to_string();
                row.canceled_at = Some(Utc::now());
            }
        }
        Ok(())
    }
}

/// In-memory unlock repository for testing
#[derive(Default, Clone)]
pub struct MockUnlockRepository {
    unlocks: Arc<DashMap<(Uuid, Uuid), UnlockRow>>,
}

impl MockUnlockRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UnlockRepository for MockUnlockRepository {
    async fn find(&self, viewer_id: Uuid, content_unit_id: Uuid) -> DbResult<Option<UnlockRow>> {
        Ok(self
            .unlocks
            .get(&(viewer_id, content_unit_id))
            .map(|r| r.value().clone()))
    }

    async fn insert(&self, unlock: CreateUnlock) -> DbResult<()> {
        // Mirrors ON CONFLICT DO NOTHING
        self.unlocks
            .entry((unlock.viewer_id, unlock.content_unit_id))
            .or_insert(UnlockRow {
                viewer_id: unlock.viewer_id,
                content_unit_id: unlock.content_unit_id,
                transaction_id: unlock.transaction_id,
                purchased_at: unlock.purchased_at,
            });
        Ok(())
    }
}
