//! PostgreSQL content unit repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::ContentUnitRow;
use crate::repo::ContentRepository;

/// PostgreSQL content unit repository
#[derive(Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    /// Create a new content repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ContentUnitRow>> {
        let unit = sqlx::query_as::<_, ContentUnitRow>(
            r#"
            SELECT id, creator_id, visibility, ppv_price_minor_units, ppv_currency, created_at
            FROM content_units
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }
}
