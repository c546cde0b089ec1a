//! Favorites: an account's endorsement of a post
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE favorites (
//!     id UUID PRIMARY KEY,
//!     account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
//!     post_id UUID NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
//!     CONSTRAINT favorites_account_post_key UNIQUE (account_id, post_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Favorite {
    pub id: Uuid,
    pub account_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    /// Marks `post_id` as favorited by `account_id`
    ///
    /// Returns true when a new favorite was written, false if it already existed.
    pub async fn create(pool: &PgPool, account_id: Uuid, post_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (id, account_id, post_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (account_id, post_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(post_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, account_id: Uuid, post_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM favorites WHERE account_id = $1 AND post_id = $2")
            .bind(account_id)
            .bind(post_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Favorites on any of `post_ids`, oldest first
    pub async fn list_for_posts(pool: &PgPool, post_ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Favorite>(
            r#"
            SELECT id, account_id, post_id, created_at
            FROM favorites
            WHERE post_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(post_ids.to_vec())
        .fetch_all(pool)
        .await
    }

    /// Favorites made by `account_id`, newest first
    pub async fn list_by_account(pool: &PgPool, account_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Favorite>(
            r#"
            SELECT id, account_id, post_id, created_at
            FROM favorites
            WHERE account_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(pool)
        .await
    }
}
