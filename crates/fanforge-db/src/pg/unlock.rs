//! PostgreSQL unlock record repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::UnlockRow;
use crate::repo::{CreateUnlock, UnlockRepository};

/// PostgreSQL unlock record repository
#[derive(Clone)]
pub struct PgUnlockRepository {
    pool: PgPool,
}

impl PgUnlockRepository {
    /// Create a new unlock repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnlockRepository for PgUnlockRepository {
    async fn find(&self, viewer_id: Uuid, content_unit_id: Uuid) -> DbResult<Option<UnlockRow>> {
        let unlock = sqlx::query_as::<_, UnlockRow>(
            r#"
            SELECT viewer_id, content_unit_id, transaction_id, purchased_at
            FROM unlocks
            WHERE viewer_id = $1 AND content_unit_id = $2
            "#,
        )
        .bind(viewer_id)
        .bind(content_unit_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unlock)
    }

    async fn insert(&self, unlock: CreateUnlock) -> DbResult<()> {
        // Duplicate webhook delivery must not create a second record
        sqlx::query(
            r#"
            INSERT INTO unlocks (viewer_id, content_unit_id, transaction_id, purchased_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (viewer_id, content_unit_id) DO NOTHING
            "#,
        )
        .bind(unlock.viewer_id)
        .bind(unlock.content_unit_id)
        .bind(unlock.transaction_id)
        .bind(unlock.purchased_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
