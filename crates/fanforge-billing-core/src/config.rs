//! Billing configuration

/// Billing service configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook secret
    pub stripe_webhook_secret: String,
    /// Success URL for checkout; the post-redirect return target is appended
    /// as query parameters so the success page knows what to reconcile
    pub success_url: String,
    /// Cancel URL for checkout
    pub cancel_url: String,
    /// Checkout attempts allowed per viewer per minute
    pub checkout_attempts_per_minute: u32,
}

impl BillingConfig {
    /// Create a new billing config
    pub fn new(
        stripe_secret_key: impl Into<String>,
        stripe_webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            stripe_secret_key: stripe_secret_key.into(),
            stripe_webhook_secret: stripe_webhook_secret.into(),
            success_url: "https://app.fanforge.example/purchase/success".to_string(),
            cancel_url: "https://app.fanforge.example/purchase/cancel".to_string(),
            checkout_attempts_per_minute: 10,
        }
    }

    /// Set redirect URLs
    #[must_use]
    pub fn with_urls(mut self, success_url: impl Into<String>, cancel_url: impl Into<String>) -> Self {
        self.success_url = success_url.into();
        self.cancel_url = cancel_url.into();
        self
    }

    /// Set the per-viewer checkout rate limit
    #[must_use]
    pub fn with_checkout_rate(mut self, attempts_per_minute: u32) -> Self {
        self.checkout_attempts_per_minute = attempts_per_minute;
        self
    }
}
