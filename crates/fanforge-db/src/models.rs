//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Creator row from the database
#[derive(Debug, Clone, FromRow)]
pub struct CreatorRow {
    pub id: Uuid,
    pub display_name: String,
    pub subscription_price_minor_units: i64,
    pub subscription_currency: String,
    pub created_at: DateTime<Utc>,
}

/// Content unit row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ContentUnitRow {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub visibility: String,
    pub ppv_price_minor_units: Option<i64>,
    pub ppv_currency: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Subscription row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub viewer_id: Uuid,
    pub creator_id: Uuid,
    pub status: String,
    pub provider_subscription_id: Option<String>,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unlock record row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UnlockRow {
    pub viewer_id: Uuid,
    pub content_unit_id: Uuid,
    pub transaction_id: Uuid,
    pub purchased_at: DateTime<Utc>,
}

/// Transaction row from the database
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub viewer_id: Uuid,
    pub kind: String,
    pub status: String,
    pub amount_minor_units: i64,
    pub currency: String,
    pub creator_id: Uuid,
    pub content_unit_id: Option<Uuid>,
    pub idempotency_key: Uuid,
    pub provider_session_id: Option<String>,
    pub checkout_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
