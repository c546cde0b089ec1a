//! Follow edges of the social graph
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE follows (
//!     follower_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
//!     followee_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
//!     PRIMARY KEY (follower_id, followee_id),
//!     CONSTRAINT follows_no_self_follow CHECK (follower_id <> followee_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A directed follower → followee edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub follower_id: Uuid,
    pub followee_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Follow {
    /// Inserts an edge, doing nothing if it already exists
    ///
    /// Returns true when a new edge was written.
    pub async fn create(
        pool: &PgPool,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, followee_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes an edge; returns false if there was none
    pub async fn delete(
        pool: &PgPool,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// IDs of the accounts `follower_id` follows
    pub async fn followee_ids(pool: &PgPool, follower_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT followee_id FROM follows WHERE follower_id = $1 ORDER BY created_at ASC",
        )
        .bind(follower_id)
        .fetch_all(pool)
        .await
    }

    /// IDs of the accounts following `followee_id`
    pub async fn follower_ids(pool: &PgPool, followee_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT follower_id FROM follows WHERE followee_id = $1 ORDER BY created_at ASC",
        )
        .bind(followee_id)
        .fetch_all(pool)
        .await
    }
}
