//! Bearer-token middleware for axum
//!
//! [`bearer_auth`] reads `Authorization: Bearer <token>`, validates it as an
//! access token and inserts an [`AuthContext`] into the request extensions.
//! Handlers behind it take `Extension<AuthContext>`; nothing else carries the
//! caller's identity.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::jwt::{JwtError, TokenIssuer};

/// Identity of the authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub account_id: Uuid,
}

/// Error type for the bearer middleware
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingCredentials,

    #[error("Expected a Bearer token")]
    InvalidFormat,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            _ => AuthError::InvalidToken,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = json!({
            "status": "error",
            "code": "unauthorized",
            "message": self.to_string(),
        });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Extracts the raw token from an `Authorization: Bearer` header
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidFormat)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }

    Ok(token)
}

/// Middleware requiring a valid access token
///
/// Wire it with `axum::middleware::from_fn_with_state(issuer, bearer_auth)`.
pub async fn bearer_auth(
    State(issuer): State<Arc<TokenIssuer>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers())?;

    let claims = issuer.validate_access(token).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        AuthError::from(e)
    })?;

    req.extensions_mut().insert(AuthContext {
        account_id: claims.sub,
    });

    Ok(next.run(req).await)
}
