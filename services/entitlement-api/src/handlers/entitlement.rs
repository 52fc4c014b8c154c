//! Entitlement resolution handler

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use fanforge_types::{ContentUnitId, CreatorId, LockReason, MediaDirective};

use crate::error::{ApiError, ApiResult};
use crate::extractors::OptionalViewer;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EntitlementQuery {
    pub creator_id: Option<String>,
    pub content_unit_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntitlementResponse {
    pub locked: bool,
    pub reason: LockReason,
    pub media: MediaDirective,
    pub creator_id: CreatorId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppv_price_minor_units: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppv_currency: Option<String>,
}

/// GET /api/v1/entitlement
///
/// Resolve whether the requesting viewer may see a content unit in full, or,
/// with only a `creator_id`, whether the viewer holds a gate-satisfying
/// subscription to that creator (the post-payment poller uses this form).
/// Anonymous requests resolve against the anonymous relationship; the lock
/// reason tells the client which purchase path to offer. PPV pricing is
/// included only while the unit is locked behind its lock.
pub async fn get_entitlement(
    State(state): State<AppState>,
    OptionalViewer(viewer): OptionalViewer,
    Query(query): Query<EntitlementQuery>,
) -> ApiResult<Json<EntitlementResponse>> {
    match (&query.content_unit_id, &query.creator_id) {
        (Some(unit), _) => resolve_unit(&state, viewer, unit).await,
        (None, Some(creator)) => resolve_subscription(&state, viewer, creator).await,
        (None, None) => Err(ApiError::BadRequest(
            "creator_id or content_unit_id is required".to_string(),
        )),
    }
}

async fn resolve_unit(
    state: &AppState,
    viewer: Option<fanforge_types::ViewerId>,
    content_unit_id: &str,
) -> ApiResult<Json<EntitlementResponse>> {
    let content_unit_id = ContentUnitId::parse(content_unit_id)
        .map_err(|_| ApiError::BadRequest("invalid content_unit_id".to_string()))?;

    let resolved = state
        .entitlements
        .resolve_for(viewer, content_unit_id)
        .await?;

    metrics::counter!(
        "entitlement_checks_total",
        "locked" => if resolved.decision.locked { "true" } else { "false" }
    )
    .increment(1);

    let (ppv_price_minor_units, ppv_currency) =
        if resolved.decision.reason == LockReason::PpvRequired {
            match resolved.ppv_lock {
                Some(lock) => (Some(lock.price_minor_units), Some(lock.currency)),
                None => (None, None),
            }
        } else {
            (None, None)
        };

    Ok(Json(EntitlementResponse {
        locked: resolved.decision.locked,
        reason: resolved.decision.reason,
        media: resolved.media,
        creator_id: resolved.creator_id,
        ppv_price_minor_units,
        ppv_currency,
    }))
}

async fn resolve_subscription(
    state: &AppState,
    viewer: Option<fanforge_types::ViewerId>,
    creator_id: &str,
) -> ApiResult<Json<EntitlementResponse>> {
    let creator_id = CreatorId::parse(creator_id)
        .map_err(|_| ApiError::BadRequest("invalid creator_id".to_string()))?;

    let active = match viewer {
        Some(viewer_id) => {
            state
                .entitlements
                .subscription_active(viewer_id, creator_id)
                .await?
        }
        None => false,
    };

    metrics::counter!(
        "entitlement_checks_total",
        "locked" => if active { "false" } else { "true" }
    )
    .increment(1);

    let (locked, reason) = if active {
        (false, LockReason::None)
    } else {
        (true, LockReason::SubscribeRequired)
    };

    Ok(Json(EntitlementResponse {
        locked,
        reason,
        media: if locked {
            MediaDirective::Preview
        } else {
            MediaDirective::Full
        },
        creator_id,
        ppv_price_minor_units: None,
        ppv_currency: None,
    }))
}
