//! Application state and router builder

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Duration;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use warble_shared::{
    auth::{bearer_auth, JwtError, TokenIssuer},
    store::SocialStore,
};

use crate::config::Config;

/// Shared application state
///
/// Cloned into every handler; all fields are behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SocialStore>,
    pub tokens: Arc<TokenIssuer>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates state, building the token issuer from the JWT settings
    pub fn new(store: Arc<dyn SocialStore>, config: Config) -> Result<Self, JwtError> {
        let tokens = TokenIssuer::new(
            &config.jwt.secret,
            Duration::hours(config.jwt.access_ttl_hours),
            Duration::days(config.jwt.refresh_ttl_days),
        )?;

        Ok(Self {
            store,
            tokens: Arc::new(tokens),
            config: Arc::new(config),
        })
    }
}

/// Builds the complete router
///
/// ```text
/// /health                          GET     public
/// /v1/auth/signup                  POST    public
/// /v1/auth/login                   POST    public
/// /v1/auth/refresh                 POST    public
/// /v1/users/:username              GET     public
/// /v1/posts/:id                    GET     public
/// /v1/account/me                   GET PUT bearer
/// /v1/account/password             PUT     bearer
/// /v1/suggestions                  GET     bearer
/// /v1/follows                      POST    bearer
/// /v1/follows/:id                  DELETE  bearer
/// /v1/timeline                     GET     bearer
/// /v1/posts                        POST    bearer
/// /v1/posts/:id/favorite           POST DELETE bearer
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let public_routes = Router::new()
        .route("/users/:username", get(routes::account::show_profile))
        .route("/posts/:id", get(routes::posts::show_post));

    let protected_routes = Router::new()
        .route(
            "/account/me",
            get(routes::account::profile).put(routes::account::update_profile),
        )
        .route("/account/password", put(routes::account::change_password))
        .route("/suggestions", get(routes::graph::suggestions))
        .route("/follows", post(routes::graph::follow))
        .route("/follows/:id", delete(routes::graph::unfollow))
        .route("/timeline", get(routes::timeline::timeline))
        .route("/posts", post(routes::posts::create_post))
        .route(
            "/posts/:id/favorite",
            post(routes::posts::favorite).delete(routes::posts::unfavorite),
        )
        .route_layer(from_fn_with_state(state.tokens.clone(), bearer_auth));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(public_routes)
        .merge(protected_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config.api.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
