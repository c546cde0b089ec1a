//! Shared harness for router-level tests
//!
//! Each [`TestContext`] owns a fresh in-memory store and a router built the
//! same way as in `main`. Requests go through `tower::Service::call`, so no
//! socket or database is involved.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::Service as _;
use uuid::Uuid;
use warble_api::{
    app::{build_router, AppState},
    config::Config,
};
use warble_shared::{
    auth::password::hash_password,
    models::CreateAccount,
    store::{MemoryStore, SocialStore},
};

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Password of every account created by [`TestContext::seed_account`]
pub const SEED_PASSWORD: &str = "correct-horse-battery";

fn seed_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(SEED_PASSWORD).expect("hash seed password"))
}

/// An account plus a valid access token for it
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub token: String,
}

pub struct TestContext {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Builds a context with extra environment overrides
    pub fn with_env(overrides: &[(&str, &str)]) -> Self {
        let mut vars: Vec<(String, String)> = vec![
            ("STORE_BACKEND".to_string(), "memory".to_string()),
            ("JWT_SECRET".to_string(), JWT_SECRET.to_string()),
        ];
        vars.extend(overrides.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let config = Config::from_lookup(|key| {
            vars.iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .expect("test config");

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config).expect("app state");
        let app = build_router(state.clone());

        Self { app, state, store }
    }

    /// Sends a request and returns the status and parsed JSON body
    ///
    /// An empty body comes back as `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Creates an account directly in the store, skipping the signup endpoint
    pub async fn seed_account(&self, username: &str) -> TestUser {
        let email = format!("{}@example.com", username);
        let account = self
            .store
            .create_account(CreateAccount {
                name: format!("{} Example", username),
                username: username.to_string(),
                email: email.clone(),
                password_hash: seed_hash().to_string(),
            })
            .await
            .expect("seed account");

        let tokens = self.state.tokens.issue_pair(account.id).expect("issue tokens");

        TestUser {
            id: account.id,
            username: account.username,
            email,
            token: tokens.access_token,
        }
    }

    /// Publishes a post through the API and returns its ID
    pub async fn publish(&self, user: &TestUser, body: &str) -> Uuid {
        let (status, json) = self
            .post("/v1/posts", Some(&user.token), serde_json::json!({ "body": body }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", json);
        json["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn follow(&self, follower: &TestUser, followee: &TestUser) {
        let (status, json) = self
            .post(
                "/v1/follows",
                Some(&follower.token),
                serde_json::json!({ "user_id": followee.id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", json);
    }

    pub async fn stored_hash(&self, id: Uuid) -> String {
        self.store
            .find_account(id)
            .await
            .unwrap()
            .expect("account exists")
            .password_hash
    }
}

/// Bodies of the posts in a `data` array, in order
pub fn bodies(data: &Value) -> Vec<String> {
    data.as_array()
        .expect("data array")
        .iter()
        .map(|post| post["body"].as_str().unwrap().to_string())
        .collect()
}
