//! PostgreSQL creator repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::CreatorRow;
use crate::repo::CreatorRepository;

/// PostgreSQL creator repository
#[derive(Clone)]
pub struct PgCreatorRepository {
    pool: PgPool,
}

impl PgCreatorRepository {
    /// Create a new creator repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreatorRepository for PgCreatorRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<CreatorRow>> {
        let creator = sqlx::query_as::<_, CreatorRow>(
            r#"
            SELECT id, display_name, subscription_price_minor_units,
                   subscription_currency, created_at
            FROM creators
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(creator)
    }
}
