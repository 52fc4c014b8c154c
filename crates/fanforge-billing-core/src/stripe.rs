//! Stripe payment provider implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use fanforge_types::TransactionKind;

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::{CheckoutSessionParams, PaymentProvider, ProviderSession};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Stripe payment provider
#[derive(Clone)]
pub struct StripeProvider {
    client: Client,
    config: BillingConfig,
}

impl StripeProvider {
    /// Create a new Stripe provider
    pub fn new(config: BillingConfig) -> Self {
        let client = Client::new();
        Self { client, config }
    }

    /// Make authenticated request to Stripe
    async fn stripe_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        idempotency_key: Option<&str>,
        form: Option<&[(&str, &str)]>,
    ) -> Result<T, BillingError> {
        let url = format!("{STRIPE_API_BASE}{endpoint}");

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.config.stripe_secret_key, Option::<&str>::None);

        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        if let Some(form_data) = form {
            request = request.form(form_data);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Stripe API request failed");
            BillingError::PaymentBackendUnavailable(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Stripe API error");
            if status.is_server_error() {
                return Err(BillingError::PaymentBackendUnavailable(format!(
                    "Stripe API error: {status}"
                )));
            }
            return Err(BillingError::ProviderError(format!(
                "Stripe API error: {status}"
            )));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Stripe response");
            BillingError::Internal(e.to_string())
        })
    }

}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self, params), fields(kind = %params.kind, viewer_id = %params.viewer_id))]
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<ProviderSession, BillingError> {
        debug!(creator_id = %params.creator_id, amount = params.amount_minor_units, "Creating checkout session");

        let amount = params.amount_minor_units.to_string();
        let viewer_id = params.viewer_id.to_string();
        let creator_id = params.creator_id.to_string();
        let idempotency_key = params.idempotency_key.to_string();
        let kind = params.kind.as_str();

        let mode = match params.kind {
            TransactionKind::Subscription => "subscription",
            TransactionKind::PpvPost | TransactionKind::PpvMessage | TransactionKind::Tip => {
                "payment"
            }
        };

        // Prices are per-creator and set at checkout time, so line items use
        // inline price_data rather than pre-registered price IDs.
        let mut form: Vec<(&str, &str)> = vec![
            ("mode", mode),
            ("success_url", &params.success_url),
            ("cancel_url", &params.cancel_url),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", &params.currency),
            ("line_items[0][price_data][unit_amount]", &amount),
            (
                "line_items[0][price_data][product_data][name]",
                &params.description,
            ),
            ("metadata[viewer_id]", &viewer_id),
            ("metadata[creator_id]", &creator_id),
            ("metadata[kind]", kind),
        ];

        if params.kind == TransactionKind::Subscription {
            form.push(("line_items[0][price_data][recurring][interval]", "month"));
            form.push(("subscription_data[metadata][viewer_id]", &viewer_id));
            form.push(("subscription_data[metadata][creator_id]", &creator_id));
        }

        let content_unit_id = params.content_unit_id.map(|id| id.to_string());
        if let Some(ref unit) = content_unit_id {
            form.push(("metadata[content_unit_id]", unit));
        }

        let session: StripeCheckoutSession = self
            .stripe_request(
                reqwest::Method::POST,
                "/checkout/sessions",
                Some(&idempotency_key),
                Some(&form),
            )
            .await?;

        let url = session
            .url
            .ok_or_else(|| BillingError::ProviderError("checkout session missing url".into()))?;

        Ok(ProviderSession {
            session_id: session.id,
            url,
        })
    }
}

// Stripe API response types

/// Stripe subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeSubscription {
    /// Subscription ID
    pub id: String,
    /// Customer ID
    pub customer: String,
    /// Subscription status
    pub status: String,
    /// Current period start (Unix timestamp)
    pub current_period_start: i64,
    /// Current period end (Unix timestamp)
    pub current_period_end: i64,
    /// Whether subscription cancels at period end
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// Stripe checkout session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCheckoutSession {
    /// Session ID
    pub id: String,
    /// Checkout URL
    pub url: Option<String>,
    /// Subscription ID (after completion)
    pub subscription: Option<String>,
}
