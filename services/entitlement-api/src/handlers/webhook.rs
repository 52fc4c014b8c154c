//! Stripe webhook handler

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use std::time::Instant;

use fanforge_billing_core::BillingError;

use crate::state::AppState;

/// POST /webhooks/stripe
///
/// Handle Stripe webhook events with signature verification.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let start = Instant::now();

    // Extract Stripe signature header
    let Some(sig_header) = headers.get("stripe-signature") else {
        tracing::warn!("Missing Stripe-Signature header");
        return StatusCode::BAD_REQUEST;
    };

    let Ok(signature) = sig_header.to_str() else {
        tracing::warn!("Invalid Stripe-Signature header encoding");
        return StatusCode::BAD_REQUEST;
    };

    // Verify, parse, and apply
    let event = match state.webhook_handler.verify_and_parse(&body, signature) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = ?e, "Webhook verification failed");
            metrics::counter!("webhooks_processed_total", "status" => "rejected").increment(1);
            return StatusCode::BAD_REQUEST;
        }
    };

    match state.webhooks.process(event).await {
        Ok(()) => {
            metrics::counter!("webhooks_processed_total", "status" => "success").increment(1);
            metrics::histogram!("webhook_processing_duration_seconds")
                .record(start.elapsed().as_secs_f64());

            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(error = ?e, "Webhook processing failed");
            metrics::counter!("webhooks_processed_total", "status" => "error").increment(1);

            match e {
                BillingError::WebhookError(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }
}
