//! Axum extractors for viewer identity
//!
//! Identity is issued by a separate service; this one only verifies the
//! signed token it forwards. The paywall treats anonymous and invalid
//! identically for reads, but purchase initiation requires a viewer.

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use fanforge_types::ViewerId;

use crate::state::AppState;

/// Verifies a bearer token and yields the viewer it names.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Verify a token; `None` for anything invalid or expired
    async fn verify(&self, token: &str) -> Option<ViewerId>;
}

/// HMAC-signed session token verifier.
///
/// Token format: `<viewer uuid>.<hex hmac-sha256 of the uuid>`, signed with
/// a secret shared with the identity service.
pub struct SignedTokenVerifier {
    secret: String,
}

impl SignedTokenVerifier {
    /// Create a verifier with the shared session secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl SessionVerifier for SignedTokenVerifier {
    async fn verify(&self, token: &str) -> Option<ViewerId> {
        let (id_part, sig_part) = token.split_once('.')?;
        let viewer_id = ViewerId::parse(id_part).ok()?;

        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(id_part.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if constant_time_eq(sig_part.as_bytes(), expected.as_bytes()) {
            Some(viewer_id)
        } else {
            None
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Authenticated viewer extracted from the request
#[derive(Debug, Clone, Copy)]
pub struct AuthViewer(pub ViewerId);

/// Error response for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: AuthErrorDetail,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetail {
    code: &'static str,
    message: &'static str,
    details: AuthErrorHint,
}

#[derive(Debug, Serialize)]
struct AuthErrorHint {
    redirect: &'static str,
}

/// Auth rejection type
///
/// Always 401 with a login redirect hint: the client routes the viewer to
/// sign-in and retries after.
pub struct AuthRejection {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = AuthErrorResponse {
            error: AuthErrorDetail {
                code: self.code,
                message: self.message,
                details: AuthErrorHint { redirect: "/login" },
            },
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthViewer
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let app_state = AppState::from_ref(state);

            let token = extract_token(parts).ok_or(AuthRejection {
                code: "MISSING_TOKEN",
                message: "No authentication token provided",
            })?;

            let viewer_id = app_state
                .sessions
                .verify(&token)
                .await
                .ok_or(AuthRejection {
                    code: "INVALID_TOKEN",
                    message: "Invalid or expired token",
                })?;

            Ok(AuthViewer(viewer_id))
        })
    }
}

/// Optional viewer extractor - anonymous when no valid token is present
///
/// Entitlement reads accept anonymous viewers; they resolve against the
/// anonymous relationship rather than failing.
#[derive(Debug, Clone, Copy)]
pub struct OptionalViewer(pub Option<ViewerId>);

impl<S> FromRequestParts<S> for OptionalViewer
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            match AuthViewer::from_request_parts(parts, state).await {
                Ok(AuthViewer(viewer)) => Ok(OptionalViewer(Some(viewer))),
                Err(_) => Ok(OptionalViewer(None)),
            }
        })
    }
}

/// Extract a bearer token from the Authorization header
fn extract_token(parts: &Parts) -> Option<String> {
    let auth_header = parts.headers.get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}
