//! Configuration management for the API server
//!
//! Everything is read from environment variables; a `.env` file is loaded
//! first when present.
//!
//! # Environment Variables
//!
//! - `API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `API_PORT`: Port to bind to (default: 8080)
//! - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
//! - `STORE_BACKEND`: `postgres` or `memory` (default: postgres)
//! - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
//! - `JWT_SECRET`: HMAC secret, at least 32 characters (required)
//! - `JWT_ACCESS_TTL_HOURS`: Access token lifetime (default: 24)
//! - `JWT_REFRESH_TTL_DAYS`: Refresh token lifetime (default: 30)
//! - `TIMELINE_PAGE_SIZE`: Default timeline page (default: 50)
//! - `TIMELINE_MAX_PAGE_SIZE`: Largest timeline page (default: 100)
//! - `LOG_FORMAT`: `json` for JSON logs, anything else for text
//! - `RUST_LOG`: Log filter

use std::{env, fmt, str::FromStr};

use anyhow::Context;
use warble_shared::{auth::jwt::MIN_SECRET_LEN, db::pool::DatabaseConfig, feed::FeedConfig};

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub store: StoreBackend,
    /// Only read when `store` is [`StoreBackend::Postgres`]
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub feed: FeedConfig,
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// Which [`SocialStore`](warble_shared::store::SocialStore) backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC secret; generate with `openssl rand -hex 32`
    pub secret: String,
    pub access_ttl_hours: i64,
    pub refresh_ttl_days: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl_hours", &self.access_ttl_hours)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from any key lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not
    /// parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let store: StoreBackend = parse_or(&lookup, "STORE_BACKEND", StoreBackend::Postgres)?;

        let database_url = lookup("DATABASE_URL").unwrap_or_default();
        if store == StoreBackend::Postgres && database_url.is_empty() {
            anyhow::bail!("DATABASE_URL environment variable is required");
        }

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_SECRET_LEN);
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let feed_defaults = FeedConfig::default();
        let feed = FeedConfig {
            page_size: parse_or(&lookup, "TIMELINE_PAGE_SIZE", feed_defaults.page_size)?,
            max_page_size: parse_or(&lookup, "TIMELINE_MAX_PAGE_SIZE", feed_defaults.max_page_size)?,
            suggestion_limit: feed_defaults.suggestion_limit,
        };
        if feed.page_size == 0 || feed.page_size > feed.max_page_size {
            anyhow::bail!("TIMELINE_PAGE_SIZE must be between 1 and TIMELINE_MAX_PAGE_SIZE");
        }

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            api: ApiConfig {
                host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "API_PORT", 8080)?,
                cors_origins,
            },
            store,
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
                ..DatabaseConfig::default()
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                access_ttl_hours: parse_or(&lookup, "JWT_ACCESS_TTL_HOURS", 24)?,
                refresh_ttl_days: parse_or(&lookup, "JWT_REFRESH_TTL_DAYS", 30)?,
            },
            feed,
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid value for {}", key)),
        _ => Ok(default),
    }
}
