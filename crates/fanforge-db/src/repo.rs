//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Creator repository trait
#[async_trait]
pub trait CreatorRepository: Send + Sync {
    /// Find a creator by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<CreatorRow>>;
}

/// Content unit repository trait
///
/// Read-only from this layer: gating rules are written by the
/// content-authoring collaborator, never mutated here.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Find a content unit by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ContentUnitRow>>;
}

/// Follow repository trait
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Whether the viewer follows the creator
    async fn is_following(&self, viewer_id: Uuid, creator_id: Uuid) -> DbResult<bool>;
}

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find the current subscription between a viewer and a creator
    async fn find_by_viewer_and_creator(
        &self,
        viewer_id: Uuid,
        creator_id: Uuid,
    ) -> DbResult<Option<SubscriptionRow>>;

    /// Find a subscription by provider subscription ID
    async fn find_by_provider_id(&self, provider_id: &str) -> DbResult<Option<SubscriptionRow>>;

    /// Create a new subscription
    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow>;

    /// Update status, period, and cancellation flag from a provider event
    async fn update_from_provider(
        &self,
        id: Uuid,
        status: &str,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        cancel_at_period_end: bool,
    ) -> DbResult<()>;

    /// Cancel subscription immediately
    async fn cancel(&self, id: Uuid) -> DbResult<()>;
}

/// Create subscription input
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub id: Uuid,
    pub viewer_id: Uuid,
    pub creator_id: Uuid,
    pub status: String,
    pub provider_subscription_id: Option<String>,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
}

/// Unlock record repository trait
///
/// Append-only: records are never updated or deleted.
#[async_trait]
pub trait UnlockRepository: Send + Sync {
    /// Find the unlock record for a (viewer, content unit) pair
    async fn find(&self, viewer_id: Uuid, content_unit_id: Uuid) -> DbResult<Option<UnlockRow>>;

    /// Append an unlock record; a duplicate insert is a no-op
    async fn insert(&self, unlock: CreateUnlock) -> DbResult<()>;
}

/// Create unlock record input
#[derive(Debug, Clone)]
pub struct CreateUnlock {
    pub viewer_id: Uuid,
    pub content_unit_id: Uuid,
    pub transaction_id: Uuid,
    pub purchased_at: DateTime<Utc>,
}

/// Transaction repository trait
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Find a transaction by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TransactionRow>>;

    /// Find a transaction by (viewer, idempotency key)
    async fn find_by_idempotency_key(
        &self,
        viewer_id: Uuid,
        key: Uuid,
    ) -> DbResult<Option<TransactionRow>>;

    /// Find a transaction by provider checkout session ID
    async fn find_by_provider_session(&self, session_id: &str)
        -> DbResult<Option<TransactionRow>>;

    /// Create a new transaction
    async fn create(&self, tx: CreateTransaction) -> DbResult<TransactionRow>;

    /// Update transaction status
    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()>;
}

/// Create transaction input
#[derive(Debug, Clone)]
pub struct CreateTransaction {
    pub id: Uuid,
    pub viewer_id: Uuid,
    pub kind: String,
    pub amount_minor_units: i64,
    pub currency: String,
    pub creator_id: Uuid,
    pub content_unit_id: Option<Uuid>,
    pub idempotency_key: Uuid,
    pub provider_session_id: Option<String>,
    pub checkout_url: Option<String>,
}
