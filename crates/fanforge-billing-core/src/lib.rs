//! Fanforge Billing Core - Paywall checkout and payment reconciliation
//!
//! Initiates hosted checkout sessions for subscriptions, pay-per-view
//! unlocks, and tips, and applies payment provider webhooks to
//! transactions, unlock records, and subscriptions.
//!
//! # Example
//!
//! ```rust,ignore
//! use fanforge_billing_core::{BillingConfig, CheckoutService, StripeProvider};
//!
//! let config = BillingConfig::new("sk_test_...", "whsec_...");
//! let provider = Arc::new(StripeProvider::new(config.clone()));
//!
//! let checkout = CheckoutService::new(entitlements, creators, transactions, provider, config);
//!
//! match checkout.start_checkout(viewer_id, request).await? {
//!     CheckoutOutcome::Redirect { checkout_url, .. } => redirect(checkout_url),
//!     CheckoutOutcome::AlreadyUnlocked => refresh_content(),
//! }
//! ```

pub mod checkout;
pub mod config;
pub mod error;
pub mod provider;
pub mod rate_limit;
pub mod stripe;
pub mod webhook;

pub use checkout::{CheckoutService, EntitlementGate};
pub use config::BillingConfig;
pub use error::BillingError;
pub use provider::{CheckoutSessionParams, PaymentProvider, ProviderSession};
pub use rate_limit::CheckoutRateLimiter;
pub use stripe::StripeProvider;
pub use webhook::{
    WebhookEvent, WebhookEventData, WebhookEventType, WebhookHandler, WebhookProcessor,
};

// Re-export checkout types from fanforge-types for convenience
pub use fanforge_types::{CheckoutOutcome, CheckoutRequest, CheckoutTarget};
