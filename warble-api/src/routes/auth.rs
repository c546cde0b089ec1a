//! Authentication endpoints
//!
//! - `POST /v1/auth/signup` - Create an account and get tokens
//! - `POST /v1/auth/login` - Exchange email and password for tokens
//! - `POST /v1/auth/refresh` - Exchange a refresh token for a new access token
//!
//! All three respond with a token payload:
//!
//! ```json
//! { "token_type": "bearer", "access_token": "eyJ...", "refresh_token": "eyJ..." }
//! ```

use axum::extract::State;
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;
use warble_shared::{
    auth::{
        password::{hash_password_async, verify_password_async},
        TokenPair,
    },
    models::CreateAccount,
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{check_username, validate_request, JsonBody},
    response::ApiResponse,
};

/// Returned for both unknown emails and wrong passwords
pub const INVALID_CREDENTIALS: &str = "Invalid email and/or password";

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Creates an account
///
/// # Errors
///
/// - `422`: malformed fields
/// - `409`: username or email already taken
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> ApiResult<ApiResponse<TokenPair>> {
    let req = SignupRequest {
        name: req.name.trim().to_string(),
        username: req.username.trim().to_string(),
        email: req.email.trim().to_string(),
        password: req.password,
    };
    validate_request(&req, check_username(&req.username))?;

    let password_hash = hash_password_async(req.password).await?;

    let account = state
        .store
        .create_account(CreateAccount {
            name: req.name,
            username: req.username,
            email: req.email,
            password_hash,
        })
        .await?;

    info!(account_id = %account.id, username = %account.username, "Account signed up");

    let tokens = state.tokens.issue_pair(account.id)?;
    Ok(ApiResponse::created(tokens))
}

/// Authenticates by email and password
///
/// Unknown email and wrong password produce the same `401`.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<ApiResponse<TokenPair>> {
    let account = state
        .store
        .find_account_by_email(req.email.trim())
        .await?
        .ok_or_else(|| {
            debug!("Login for unknown email");
            ApiError::Unauthorized(INVALID_CREDENTIALS.to_string())
        })?;

    if !verify_password_async(req.password, account.password_hash.clone()).await? {
        debug!(account_id = %account.id, "Login with wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    state.store.record_login(account.id).await?;
    info!(account_id = %account.id, "Account logged in");

    let tokens = state.tokens.issue_pair(account.id)?;
    Ok(ApiResponse::ok(tokens))
}

/// Issues a new access token from a refresh token
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> ApiResult<ApiResponse<TokenPair>> {
    let tokens = state.tokens.refresh(&req.refresh_token)?;
    Ok(ApiResponse::ok(tokens))
}
