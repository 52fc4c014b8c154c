//! Error types for the Entitlement API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use fanforge_billing_core::BillingError;
use fanforge_entitlement_core::EntitlementError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Content unit not found")]
    ContentNotFound,

    #[error("Creator not found")]
    CreatorNotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Already unlocked")]
    AlreadyUnlocked,

    #[error("Too many checkout attempts, try again shortly")]
    RateLimited,

    #[error("Payment backend unavailable, nothing was charged")]
    PaymentBackendUnavailable,

    #[error("Webhook error: {0}")]
    WebhookError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error")]
    Database(#[from] fanforge_db::DbError),
}

impl From<EntitlementError> for ApiError {
    fn from(e: EntitlementError) -> Self {
        match e {
            EntitlementError::ContentNotFound => Self::ContentNotFound,
            EntitlementError::Database(db) => Self::Database(db),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(e: BillingError) -> Self {
        match e {
            BillingError::ContentNotFound => Self::ContentNotFound,
            BillingError::CreatorNotFound => Self::CreatorNotFound,
            BillingError::InvalidTarget(msg) => Self::BadRequest(msg),
            BillingError::MissingAmount => Self::BadRequest("amount is required".to_string()),
            BillingError::InvalidAmount(e) => Self::BadRequest(e.to_string()),
            BillingError::RateLimited => Self::RateLimited,
            BillingError::PaymentBackendUnavailable(_) => Self::PaymentBackendUnavailable,
            BillingError::WebhookError(msg) => Self::WebhookError(msg),
            BillingError::Entitlement(e) => e.into(),
            BillingError::Database(db) => Self::Database(db),
            BillingError::ProviderError(msg) | BillingError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ContentNotFound | Self::CreatorNotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::WebhookError(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyUnlocked => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::PaymentBackendUnavailable => StatusCode::BAD_GATEWAY,
            Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ContentNotFound => "CONTENT_NOT_FOUND",
            Self::CreatorNotFound => "CREATOR_NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::AlreadyUnlocked => "ALREADY_UNLOCKED",
            Self::RateLimited => "RATE_LIMITED",
            Self::PaymentBackendUnavailable => "PAYMENT_BACKEND_UNAVAILABLE",
            Self::WebhookError(_) => "WEBHOOK_ERROR",
            Self::Internal(_) | Self::Database(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log internal errors
        if matches!(self, Self::Internal(_) | Self::Database(_)) {
            tracing::error!(error = ?self, "Internal API error");
        }

        // Retryable backend failures carry a hint the client surfaces as-is
        let details = match self {
            Self::PaymentBackendUnavailable => {
                Some(serde_json::json!({ "retryable": true }))
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
