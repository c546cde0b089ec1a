//! Post endpoints
//!
//! - `POST /v1/posts` - Publish `{body, reply_to?}`
//! - `GET /v1/posts/:id` - One post with author, favorites and replies
//! - `POST /v1/posts/:id/favorite` - Favorite (idempotent)
//! - `DELETE /v1/posts/:id/favorite` - Remove favorite (idempotent)

use axum::{extract::State, Extension};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;
use warble_shared::{
    auth::AuthContext,
    feed::{self, PostView},
    models::CreatePost,
};

use crate::{
    app::AppState,
    error::{ApiResult, ValidationErrorDetail},
    extract::{validate_request, JsonBody, PathParam},
    response::ApiResponse,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(max = 280, message = "Post must be at most 280 characters"))]
    pub body: String,

    pub reply_to: Option<Uuid>,
}

/// Publishes a post; surrounding whitespace is trimmed before checks and storage
///
/// # Errors
///
/// - `422`: blank or over-long body
/// - `404`: `reply_to` names a missing post
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(mut req): JsonBody<CreatePostRequest>,
) -> ApiResult<ApiResponse<PostView>> {
    req.body = req.body.trim().to_string();

    let blank = req
        .body
        .is_empty()
        .then(|| ValidationErrorDetail::new("body", "Post cannot be blank"));
    validate_request(&req, blank)?;

    let post = state
        .store
        .create_post(CreatePost {
            author_id: auth.account_id,
            body: req.body,
            reply_to_id: req.reply_to,
        })
        .await?;

    info!(post_id = %post.id, author_id = %post.author_id, "Post published");

    let view = feed::post_view(state.store.as_ref(), post.id).await?;
    Ok(ApiResponse::created(view))
}

pub async fn show_post(
    State(state): State<AppState>,
    PathParam(post_id): PathParam<Uuid>,
) -> ApiResult<ApiResponse<PostView>> {
    let view = feed::post_view(state.store.as_ref(), post_id).await?;
    Ok(ApiResponse::ok(view))
}

pub async fn favorite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(post_id): PathParam<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state.store.favorite(auth.account_id, post_id).await?;
    Ok(ApiResponse::ok(()))
}

pub async fn unfavorite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(post_id): PathParam<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state.store.unfavorite(auth.account_id, post_id).await?;
    Ok(ApiResponse::ok(()))
}
