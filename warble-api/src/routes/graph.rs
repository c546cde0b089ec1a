//! Social graph endpoints
//!
//! - `GET /v1/suggestions` - Accounts the caller might follow
//! - `POST /v1/follows` - Follow `{user_id}`
//! - `DELETE /v1/follows/:id` - Unfollow
//!
//! Follow and unfollow are idempotent and respond with `data: null`.

use axum::{extract::State, Extension};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use warble_shared::{auth::AuthContext, feed, models::Account};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{JsonBody, PathParam},
    response::ApiResponse,
};

#[derive(Debug, Deserialize)]
pub struct FollowRequest {
    pub user_id: Uuid,
}

pub async fn suggestions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<ApiResponse<Vec<Account>>> {
    let accounts = feed::suggestions(state.store.as_ref(), auth.account_id, &state.config.feed).await?;
    Ok(ApiResponse::ok(accounts))
}

/// # Errors
///
/// - `400`: following yourself
/// - `404`: unknown account
pub async fn follow(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<FollowRequest>,
) -> ApiResult<ApiResponse<()>> {
    if req.user_id == auth.account_id {
        return Err(ApiError::BadRequest("You cannot follow yourself".to_string()));
    }

    let created = state.store.follow(auth.account_id, req.user_id).await?;
    if created {
        info!(follower_id = %auth.account_id, followee_id = %req.user_id, "Followed");
    }

    Ok(ApiResponse::ok(()))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(followee_id): PathParam<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    if state.store.unfollow(auth.account_id, followee_id).await? {
        info!(follower_id = %auth.account_id, %followee_id, "Unfollowed");
    }

    Ok(ApiResponse::ok(()))
}
