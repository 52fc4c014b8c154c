//! Billing errors

use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// Creator not found
    #[error("creator not found")]
    CreatorNotFound,

    /// Content unit not found
    #[error("content unit not found")]
    ContentNotFound,

    /// Target is not valid for the requested checkout kind
    #[error("invalid checkout target: {0}")]
    InvalidTarget(String),

    /// Kind requires a caller-supplied amount and none was given
    #[error("amount required")]
    MissingAmount,

    /// Amount outside the allowed bounds
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] fanforge_types::AmountError),

    /// Too many checkout attempts in the window
    #[error("rate limited")]
    RateLimited,

    /// Checkout session could not be created; nothing was persisted
    #[error("payment backend unavailable: {0}")]
    PaymentBackendUnavailable(String),

    /// Unexpected payment provider response
    #[error("provider error: {0}")]
    ProviderError(String),

    /// Webhook verification or processing error
    #[error("webhook error: {0}")]
    WebhookError(String),

    /// Entitlement lookup error
    #[error("entitlement error: {0}")]
    Entitlement(#[from] fanforge_entitlement_core::EntitlementError),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] fanforge_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}
