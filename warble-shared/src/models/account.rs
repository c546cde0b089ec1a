//! Account model and database operations
//!
//! Accounts are the registered identities of Warble. Usernames and emails are
//! unique regardless of case; uniqueness is enforced by expression indexes on
//! `LOWER(username)` and `LOWER(email)`.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE accounts (
//!     id UUID PRIMARY KEY,
//!     name VARCHAR(100) NOT NULL,
//!     username VARCHAR(50) NOT NULL,
//!     email VARCHAR(255) NOT NULL,
//!     password_hash VARCHAR(255) NOT NULL,
//!     bio TEXT,
//!     location VARCHAR(100),
//!     website_url VARCHAR(255),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     last_login_at TIMESTAMPTZ
//! );
//! CREATE UNIQUE INDEX accounts_username_lower_key ON accounts (LOWER(username));
//! CREATE UNIQUE INDEX accounts_email_lower_key ON accounts (LOWER(email));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A registered account
///
/// The password hash is never serialized into responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    /// Unique account ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Handle, unique case-insensitively
    pub username: String,

    /// Email address, unique case-insensitively
    pub email: String,

    /// Argon2id password hash (PHC string)
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Optional free-form biography
    pub bio: Option<String>,

    /// Optional location
    pub location: Option<String>,

    /// Optional personal website
    pub website_url: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the profile or password last changed
    pub updated_at: DateTime<Utc>,

    /// When the account last logged in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub name: String,
    pub username: String,
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,
}

/// Full replacement of the mutable profile fields
///
/// Every field is written. `None` for an optional field clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub name: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website_url: Option<String>,
}

impl Account {
    /// Inserts a new account
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `accounts_username_lower_key` or
    /// `accounts_email_lower_key` when the handle or email is taken.
    pub async fn create(pool: &PgPool, data: CreateAccount) -> Result<Self, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, name, username, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, username, email, password_hash, bio, location,
                      website_url, created_at, updated_at, last_login_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.name)
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(account)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, username, email, password_hash, bio, location,
                   website_url, created_at, updated_at, last_login_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }

    /// Finds an account by email, ignoring case
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, username, email, password_hash, bio, location,
                   website_url, created_at, updated_at, last_login_at
            FROM accounts
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }

    /// Finds an account by username, ignoring case
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, username, email, password_hash, bio, location,
                   website_url, created_at, updated_at, last_login_at
            FROM accounts
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }

    /// Loads a batch of accounts, oldest first
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, username, email, password_hash, bio, location,
                   website_url, created_at, updated_at, last_login_at
            FROM accounts
            WHERE id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(pool)
        .await?;

        Ok(accounts)
    }

    /// Overwrites every mutable profile field
    ///
    /// Returns None if the account doesn't exist.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET name = $2, username = $3, email = $4, bio = $5, location = $6,
                website_url = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, username, email, password_hash, bio, location,
                      website_url, created_at, updated_at, last_login_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.username)
        .bind(data.email)
        .bind(data.bio)
        .bind(data.location)
        .bind(data.website_url)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }

    /// Replaces the stored password hash
    ///
    /// Returns false if the account doesn't exist.
    pub async fn update_password_hash(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE accounts SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Accounts that `account_id` neither is nor follows, oldest first
    pub async fn suggestions(
        pool: &PgPool,
        account_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, username, email, password_hash, bio, location,
                   website_url, created_at, updated_at, last_login_at
            FROM accounts a
            WHERE a.id <> $1
              AND NOT EXISTS (
                  SELECT 1 FROM follows f
                  WHERE f.follower_id = $1 AND f.followee_id = a.id
              )
            ORDER BY a.created_at ASC, a.id ASC
            LIMIT $2
            "#,
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(accounts)
    }
}
