//! Account endpoints
//!
//! - `GET /v1/account/me` - Profile bundle of the caller
//! - `PUT /v1/account/me` - Replace the caller's profile fields
//! - `PUT /v1/account/password` - Change the caller's password
//! - `GET /v1/users/:username` - Public profile bundle

use axum::{extract::State, Extension};
use serde::Deserialize;
use tracing::info;
use validator::Validate;
use warble_shared::{
    auth::{
        password::{hash_password_async, verify_password_async},
        AuthContext,
    },
    feed::{self, ProfileBundle},
    models::{Account, UpdateProfile},
    store::StoreError,
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{check_username, validate_request, JsonBody, PathParam},
    response::ApiResponse,
};

/// Profile update body
///
/// `location`, `bio` and `website_url` are cleared when omitted, null or blank.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    #[validate(length(max = 100, message = "Location must be at most 100 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,

    #[validate(
        url(message = "Website must be a valid URL"),
        length(max = 255, message = "Website must be at most 255 characters")
    )]
    pub website_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// Current password
    pub password: String,

    #[serde(alias = "newPassword")]
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub new_password: String,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<ApiResponse<ProfileBundle>> {
    let bundle = feed::profile_bundle(state.store.as_ref(), auth.account_id).await?;
    Ok(ApiResponse::ok(bundle))
}

pub async fn show_profile(
    State(state): State<AppState>,
    PathParam(username): PathParam<String>,
) -> ApiResult<ApiResponse<ProfileBundle>> {
    let bundle = feed::profile_bundle_by_username(state.store.as_ref(), &username).await?;
    Ok(ApiResponse::ok(bundle))
}

/// Replaces the caller's profile
///
/// # Errors
///
/// - `422`: malformed fields
/// - `409`: new username or email belongs to another account
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> ApiResult<ApiResponse<Account>> {
    let req = UpdateProfileRequest {
        name: req.name.trim().to_string(),
        username: req.username.trim().to_string(),
        email: req.email.trim().to_string(),
        location: blank_to_none(req.location),
        bio: blank_to_none(req.bio),
        website_url: blank_to_none(req.website_url),
    };
    validate_request(&req, check_username(&req.username))?;

    let account = state
        .store
        .update_profile(
            auth.account_id,
            UpdateProfile {
                name: req.name,
                username: req.username,
                email: req.email,
                bio: req.bio,
                location: req.location,
                website_url: req.website_url,
            },
        )
        .await?;

    info!(account_id = %account.id, "Profile updated");
    Ok(ApiResponse::ok(account).message("Profile updated!"))
}

/// Changes the caller's password after re-checking the current one
///
/// A wrong current password leaves the stored hash untouched.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> ApiResult<ApiResponse<()>> {
    req.validate()?;

    let account = state
        .store
        .find_account(auth.account_id)
        .await?
        .ok_or(StoreError::NotFound("Account"))?;

    if !verify_password_async(req.password, account.password_hash).await? {
        return Err(ApiError::Unauthorized(
            "Current password could not be verified.".to_string(),
        ));
    }

    let password_hash = hash_password_async(req.new_password).await?;
    state
        .store
        .update_password_hash(auth.account_id, &password_hash)
        .await?;

    info!(account_id = %auth.account_id, "Password changed");
    Ok(ApiResponse::ok(()).message("Password changed!"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none(None), None);
        assert_eq!(blank_to_none(Some("   ".to_string())), None);
        assert_eq!(blank_to_none(Some(" Lisbon ".to_string())), Some("Lisbon".to_string()));
    }

    #[test]
    fn test_change_password_accepts_camel_case_alias() {
        let req: ChangePasswordRequest =
            serde_json::from_str(r#"{"password":"old-password","newPassword":"new-password"}"#).unwrap();
        assert_eq!(req.new_password, "new-password");
    }
}
