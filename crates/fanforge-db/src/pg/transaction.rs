//! PostgreSQL transaction repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::TransactionRow;
use crate::repo::{CreateTransaction, TransactionRepository};

/// PostgreSQL transaction repository
#[derive(Clone)]
pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    /// Create a new transaction repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TransactionRow>> {
        let tx = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, viewer_id, kind, status, amount_minor_units, currency,
                   creator_id, content_unit_id, idempotency_key, provider_session_id,
                   checkout_url, created_at, updated_at
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tx)
    }

    async fn find_by_idempotency_key(
        &self,
        viewer_id: Uuid,
        key: Uuid,
    ) -> DbResult<Option<TransactionRow>> {
        let tx = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, viewer_id, kind, status, amount_minor_units, currency,
                   creator_id, content_unit_id, idempotency_key, provider_session_id,
                   checkout_url, created_at, updated_at
            FROM transactions
            WHERE viewer_id = $1 AND idempotency_key = $2
            "#,
        )
        .bind(viewer_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tx)
    }

    async fn find_by_provider_session(
        &self,
        session_id: &str,
    ) -> DbResult<Option<TransactionRow>> {
        let tx = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, viewer_id, kind, status, amount_minor_units, currency,
                   creator_id, content_unit_id, idempotency_key, provider_session_id,
                   checkout_url, created_at, updated_at
            FROM transactions
            WHERE provider_session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tx)
    }

    async fn create(&self, tx: CreateTransaction) -> DbResult<TransactionRow> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (id, viewer_id, kind, status, amount_minor_units,
                                      currency, creator_id, content_unit_id,
                                      idempotency_key, provider_session_id, checkout_url)
            VALUES ($1, $2, $3, 'requires_payment', $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, viewer_id, kind, status, amount_minor_units, currency,
                      creator_id, content_unit_id, idempotency_key, provider_session_id,
                      checkout_url, created_at, updated_at
            "#,
        )
        .bind(tx.id)
        .bind(tx.viewer_id)
        .bind(&tx.kind)
        .bind(tx.amount_minor_units)
        .bind(&tx.currency)
        .bind(tx.creator_id)
        .bind(tx.content_unit_id)
        .bind(tx.idempotency_key)
        .bind(&tx.provider_session_id)
        .bind(&tx.checkout_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()> {
        sqlx::query("UPDATE transactions SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
