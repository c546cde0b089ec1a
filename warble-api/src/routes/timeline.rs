//! Home timeline
//!
//! ```text
//! GET /v1/timeline?limit=20&before=2025-01-10T12:00:00Z&before_id=<uuid>
//! ```
//!
//! Posts by the caller and everyone they follow, newest first. `limit`
//! defaults to the configured page size and is clamped to the configured
//! maximum. To get the next page pass the `created_at` and `id` of the last
//! post as `before` and `before_id`. `before` alone excludes every post at
//! that instant.

use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use warble_shared::{
    auth::AuthContext,
    feed::{self, PostView},
    store::PostCursor,
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::QueryParams,
    response::ApiResponse,
};

#[derive(Debug, Default, Deserialize)]
pub struct TimelineQuery {
    pub limit: Option<usize>,
    pub before: Option<DateTime<Utc>>,
    pub before_id: Option<Uuid>,
}

impl TimelineQuery {
    fn cursor(&self) -> ApiResult<Option<PostCursor>> {
        match (self.before, self.before_id) {
            (Some(created_at), id) => Ok(Some(PostCursor { created_at, id })),
            (None, Some(_)) => Err(ApiError::BadRequest("before_id requires before".to_string())),
            (None, None) => Ok(None),
        }
    }
}

pub async fn timeline(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    QueryParams(query): QueryParams<TimelineQuery>,
) -> ApiResult<ApiResponse<Vec<PostView>>> {
    let window = state.config.feed.window(query.limit, query.cursor()?);
    let posts = feed::timeline(state.store.as_ref(), auth.account_id, window).await?;
    Ok(ApiResponse::ok(posts))
}
