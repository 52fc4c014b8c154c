//! Checkout initiation handler

use std::time::Instant;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use fanforge_types::{
    CheckoutOutcome, CheckoutRequest, CheckoutTarget, ContentUnitId, CreatorId, IdempotencyKey,
    TransactionId, TransactionKind,
};

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthViewer;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub kind: TransactionKind,
    pub creator_id: String,
    pub content_unit_id: Option<String>,
    pub amount_minor_units: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Hosted checkout URL; the client performs a full-page redirect
    pub checkout_url: String,
    pub transaction_id: TransactionId,
}

/// POST /api/v1/checkout
///
/// Initiate a checkout session. Requires an authenticated viewer and an
/// `Idempotency-Key` header holding the UUID minted for this logical
/// attempt. Responds 409 ALREADY_UNLOCKED when the server finds the viewer
/// already has access; the client treats that as success and refreshes the
/// content.
pub async fn create_checkout(
    State(state): State<AppState>,
    AuthViewer(viewer_id): AuthViewer,
    headers: HeaderMap,
    Json(body): Json<CheckoutBody>,
) -> ApiResult<Json<CheckoutResponse>> {
    let start = Instant::now();
    let kind = body.kind.as_str();

    let idempotency_key = extract_idempotency_key(&headers)?;

    let creator_id = CreatorId::parse(&body.creator_id)
        .map_err(|_| ApiError::BadRequest("invalid creator_id".to_string()))?;

    let content_unit_id = body
        .content_unit_id
        .as_deref()
        .map(ContentUnitId::parse)
        .transpose()
        .map_err(|_| ApiError::BadRequest("invalid content_unit_id".to_string()))?;

    let request = CheckoutRequest {
        kind: body.kind,
        target: CheckoutTarget {
            creator_id,
            content_unit_id,
        },
        amount_minor_units: body.amount_minor_units,
        idempotency_key,
    };

    let outcome = state.checkout.start_checkout(viewer_id, request).await?;

    metrics::histogram!(
        "checkout_initiation_duration_seconds",
        "kind" => kind
    )
    .record(start.elapsed().as_secs_f64());

    match outcome {
        CheckoutOutcome::Redirect {
            checkout_url,
            transaction_id,
        } => {
            metrics::counter!("checkout_sessions_created_total", "kind" => kind).increment(1);
            Ok(Json(CheckoutResponse {
                checkout_url,
                transaction_id,
            }))
        }
        CheckoutOutcome::AlreadyUnlocked => {
            metrics::counter!("checkout_already_unlocked_total", "kind" => kind).increment(1);
            Err(ApiError::AlreadyUnlocked)
        }
    }
}

fn extract_idempotency_key(headers: &HeaderMap) -> Result<IdempotencyKey, ApiError> {
    let header = headers
        .get("idempotency-key")
        .ok_or_else(|| ApiError::BadRequest("Idempotency-Key header is required".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| ApiError::BadRequest("invalid Idempotency-Key encoding".to_string()))?;

    IdempotencyKey::parse(value)
        .map_err(|_| ApiError::BadRequest("Idempotency-Key must be a UUID".to_string()))
}
