//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::SubscriptionRow;
use crate::repo::{CreateSubscription, SubscriptionRepository};

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_viewer_and_creator(
        &self,
        viewer_id: Uuid,
        creator_id: Uuid,
    ) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, viewer_id, creator_id, status, provider_subscription_id,
                   current_period_start, current_period_end, cancel_at_period_end,
                   canceled_at, created_at, updated_at
            FROM subscriptions
            WHERE viewer_id = $1 AND creator_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(viewer_id)
        .bind(creator_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_by_provider_id(&self, provider_id: &str) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, viewer_id, creator_id, status, provider_subscription_id,
                   current_period_start, current_period_end, cancel_at_period_end,
                   canceled_at, created_at, updated_at
            FROM subscriptions
            WHERE provider_subscription_id = $1
            "#,
        )
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (id, viewer_id, creator_id, status,
                                       provider_subscription_id, current_period_start,
                                       current_period_end)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, viewer_id, creator_id, status, provider_subscription_id,
                      current_period_start, current_period_end, cancel_at_period_end,
                      canceled_at, created_at, updated_at
            "#,
        )
        .bind(sub.id)
        .bind(sub.viewer_id)
        .bind(sub.creator_id)
        .bind(&sub.status)
        .bind(&sub.provider_subscription_id)
        .bind(sub.current_period_start)
        .bind(sub.current_period_end)
        .fetch_one(&self.pool)
        .await?;

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
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = $1, current_period_start = $2, current_period_end = $3,
                cancel_at_period_end = $4, updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(status)
        .bind(period_start)
        .bind(period_end)
        .bind(cancel_at_period_end)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cancel(&self, id: Uuid) -> DbResult<()> {
        sqlx::query(
            "UPDATE subscriptions SET status = 'canceled', canceled_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
