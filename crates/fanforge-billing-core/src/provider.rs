//! Payment provider abstraction

use async_trait::async_trait;

use fanforge_types::{ContentUnitId, CreatorId, IdempotencyKey, TransactionKind, ViewerId};

use crate::BillingError;

/// Parameters for creating a hosted checkout session
#[derive(Debug, Clone)]
pub struct CheckoutSessionParams {
    /// What is being purchased
    pub kind: TransactionKind,
    /// Viewer paying
    pub viewer_id: ViewerId,
    /// Creator being paid
    pub creator_id: CreatorId,
    /// Content unit being unlocked, for PPV purchases
    pub content_unit_id: Option<ContentUnitId>,
    /// Amount in minor units
    pub amount_minor_units: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Human-readable line item description
    pub description: String,
    /// Redirect after a completed payment
    pub success_url: String,
    /// Redirect after an abandoned payment
    pub cancel_url: String,
    /// Idempotency key forwarded to the provider so a retried call returns
    /// the original session instead of creating a second charge
    pub idempotency_key: IdempotencyKey,
}

/// A created checkout session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    /// Provider session ID
    pub session_id: String,
    /// Hosted checkout URL
    pub url: String,
}

/// Payment provider trait
///
/// Abstracts payment processing to allow different providers (Stripe, etc.)
/// and fakes in tests.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted checkout session
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<ProviderSession, BillingError>;
}
