//! PostgreSQL follow repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repo::FollowRepository;

/// PostgreSQL follow repository
#[derive(Clone)]
pub struct PgFollowRepository {
    pool: PgPool,
}

impl PgFollowRepository {
    /// Create a new follow repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for PgFollowRepository {
    async fn is_following(&self, viewer_id: Uuid, creator_id: Uuid) -> DbResult<bool> {
        let exists: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM follows WHERE viewer_id = $1 AND creator_id = $2",
        )
        .bind(viewer_id)
        .bind(creator_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exists.is_some())
    }
}
