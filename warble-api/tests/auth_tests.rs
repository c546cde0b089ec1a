//! Signup, login and token refresh through the router

mod common;

use axum::http::StatusCode;
use common::{TestContext, SEED_PASSWORD};
use serde_json::json;

fn signup_body(username: &str) -> serde_json::Value {
    json!({
        "name": "Ada Lovelace",
        "username": username,
        "email": format!("{}@example.com", username),
        "password": "analytical-engine",
    })
}

#[tokio::test]
async fn test_signup_token_authenticates_new_account() {
    let ctx = TestContext::new();

    let (status, json) = ctx.post("/v1/auth/signup", None, signup_body("ada")).await;
    assert_eq!(status, StatusCode::CREATED, "{}", json);
    assert_eq!(json["status"], "success");
    assert_eq!(json["data"]["token_type"], "bearer");
    assert!(json["data"]["refresh_token"].is_string());

    let token = json["data"]["access_token"].as_str().unwrap().to_string();
    let (status, me) = ctx.get("/v1/account/me", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["username"], "ada");
    assert_eq!(me["data"]["email"], "ada@example.com");
    assert!(me["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_signup_rejects_malformed_fields() {
    let ctx = TestContext::new();

    let (status, json) = ctx
        .post(
            "/v1/auth/signup",
            None,
            json!({
                "name": "",
                "username": "a b",
                "email": "not-an-email",
                "password": "short",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], "validation_error");

    let fields: Vec<&str> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "name", "password", "username"]);
}

#[tokio::test]
async fn test_signup_conflicts_on_taken_username_or_email() {
    let ctx = TestContext::new();
    ctx.seed_account("ada").await;

    let (status, json) = ctx.post("/v1/auth/signup", None, signup_body("ADA")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "conflict");
    assert_eq!(json["message"], "Username is already taken");

    let (status, json) = ctx
        .post(
            "/v1/auth/signup",
            None,
            json!({
                "name": "Other",
                "username": "other",
                "email": "Ada@Example.com",
                "password": "analytical-engine",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "Email is already registered");
}

#[tokio::test]
async fn test_signup_with_missing_field_is_bad_request() {
    let ctx = TestContext::new();

    let (status, json) = ctx
        .post("/v1/auth/signup", None, json!({ "username": "ada" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "bad_request");
}

#[tokio::test]
async fn test_login_succeeds_with_correct_credentials() {
    let ctx = TestContext::new();
    let ada = ctx.seed_account("ada").await;

    let (status, json) = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "ADA@example.com", "password": SEED_PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    let token = json["data"]["access_token"].as_str().unwrap();

    let (_, me) = ctx.get("/v1/account/me", Some(token)).await;
    assert_eq!(me["data"]["id"], ada.id.to_string());
    assert!(me["data"]["last_login_at"].is_string());
}

#[tokio::test]
async fn test_login_failures_share_one_message() {
    let ctx = TestContext::new();
    let ada = ctx.seed_account("ada").await;

    let (wrong_status, wrong_password) = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": ada.email, "password": "not-the-password" }),
        )
        .await;
    let (unknown_status, unknown_email) = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": SEED_PASSWORD }),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password["message"], "Invalid email and/or password");
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn test_refresh_issues_working_access_token() {
    let ctx = TestContext::new();
    let (_, signup) = ctx.post("/v1/auth/signup", None, signup_body("ada")).await;
    let refresh_token = signup["data"]["refresh_token"].as_str().unwrap();

    let (status, json) = ctx
        .post("/v1/auth/refresh", None, json!({ "refresh_token": refresh_token }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert!(json["data"].get("refresh_token").is_none());

    let access = json["data"]["access_token"].as_str().unwrap();
    let (status, _) = ctx.get("/v1/account/me", Some(access)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let ctx = TestContext::new();
    let ada = ctx.seed_account("ada").await;

    let (status, json) = ctx
        .post("/v1/auth/refresh", None, json!({ "refresh_token": ada.token }))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "unauthorized");
}

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let ctx = TestContext::new();

    let (status, json) = ctx.get("/v1/timeline", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], "unauthorized");

    let (status, _) = ctx.get("/v1/account/me", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_reports_memory_backend() {
    let ctx = TestContext::new();

    let (status, json) = ctx.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["backend"], "memory");
}

#[tokio::test]
async fn test_health_degraded_when_store_unreachable() {
    let ctx = TestContext::new();
    ctx.store.set_reachable(false);

    let (status, json) = ctx.get("/health", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["store"], "disconnected");
    assert_eq!(json["backend"], "memory");

    ctx.store.set_reachable(true);
    let (status, _) = ctx.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
}
