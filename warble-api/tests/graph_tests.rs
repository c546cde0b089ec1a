//! Follow, unfollow and suggestion endpoints

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use uuid::Uuid;

fn usernames(data: &serde_json::Value) -> Vec<String> {
    data.as_array()
        .unwrap()
        .iter()
        .map(|a| a["username"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_follow_is_idempotent() {
    let ctx = TestContext::new();
    let ada = ctx.seed_account("ada").await;
    let bob = ctx.seed_account("bob").await;

    ctx.follow(&ada, &bob).await;
    let (status, json) = ctx
        .post("/v1/follows", Some(&ada.token), json!({ "user_id": bob.id }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert!(json["data"].is_null());

    let (_, me) = ctx.get("/v1/account/me", Some(&ada.token)).await;
    assert_eq!(me["data"]["following"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_self_follow_is_rejected() {
    let ctx = TestContext::new();
    let ada = ctx.seed_account("ada").await;

    let (status, json) = ctx
        .post("/v1/follows", Some(&ada.token), json!({ "user_id": ada.id }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "bad_request");
}

#[tokio::test]
async fn test_follow_unknown_account_is_not_found() {
    let ctx = TestContext::new();
    let ada = ctx.seed_account("ada").await;

    let (status, json) = ctx
        .post("/v1/follows", Some(&ada.token), json!({ "user_id": Uuid::new_v4() }))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "User not found");
}

#[tokio::test]
async fn test_unfollow_is_idempotent() {
    let ctx = TestContext::new();
    let ada = ctx.seed_account("ada").await;
    let bob = ctx.seed_account("bob").await;
    ctx.follow(&ada, &bob).await;

    for _ in 0..2 {
        let (status, json) = ctx
            .delete(&format!("/v1/follows/{}", bob.id), Some(&ada.token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["data"].is_null());
    }

    let (_, me) = ctx.get("/v1/account/me", Some(&ada.token)).await;
    assert!(me["data"]["following"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unfollow_with_malformed_id_is_bad_request() {
    let ctx = TestContext::new();
    let ada = ctx.seed_account("ada").await;

    let (status, json) = ctx.delete("/v1/follows/not-a-uuid", Some(&ada.token)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "bad_request");
}

#[tokio::test]
async fn test_suggestions_exclude_self_and_followees() {
    let ctx = TestContext::new();
    let ada = ctx.seed_account("ada").await;
    let bob = ctx.seed_account("bob").await;
    ctx.seed_account("cy").await;
    ctx.seed_account("dee").await;
    ctx.seed_account("eve").await;
    ctx.seed_account("fay").await;

    ctx.follow(&ada, &bob).await;

    let (status, json) = ctx.get("/v1/suggestions", Some(&ada.token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(usernames(&json["data"]), vec!["cy", "dee", "eve"]);
}

#[tokio::test]
async fn test_suggestions_with_few_candidates() {
    let ctx = TestContext::new();
    let ada = ctx.seed_account("ada").await;
    let bob = ctx.seed_account("bob").await;

    let (_, json) = ctx.get("/v1/suggestions", Some(&ada.token)).await;
    assert_eq!(usernames(&json["data"]), vec!["bob"]);

    ctx.follow(&ada, &bob).await;
    let (_, json) = ctx.get("/v1/suggestions", Some(&ada.token)).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}
