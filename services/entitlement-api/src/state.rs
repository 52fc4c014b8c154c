//! Application state for the Entitlement API service.

use std::sync::Arc;

use fanforge_billing_core::{CheckoutService, WebhookHandler, WebhookProcessor};
use fanforge_db::pg::{
    PgContentRepository, PgFollowRepository, PgSubscriptionRepository, PgUnlockRepository,
};
use fanforge_db::DbPool;
use fanforge_entitlement_core::EntitlementService;

use crate::config::Config;
use crate::extractors::SessionVerifier;

/// Entitlement service over the Postgres repositories
pub type PgEntitlementService = EntitlementService<
    PgContentRepository,
    PgFollowRepository,
    PgSubscriptionRepository,
    PgUnlockRepository,
>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Entitlement read service
    pub entitlements: Arc<PgEntitlementService>,
    /// Checkout initiation service
    pub checkout: Arc<CheckoutService>,
    /// Webhook signature verification and parsing
    pub webhook_handler: WebhookHandler,
    /// Webhook event application
    pub webhooks: Arc<WebhookProcessor>,
    /// Session token verification
    pub sessions: Arc<dyn SessionVerifier>,
    /// Database pool (for readiness checks)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
