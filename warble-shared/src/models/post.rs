//! Post model and database operations
//!
//! Posts are short, immutable text items. A post may reply to another post.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE posts (
//!     id UUID PRIMARY KEY,
//!     author_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
//!     body VARCHAR(280) NOT NULL,
//!     reply_to_id UUID REFERENCES posts(id) ON DELETE SET NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
//! );
//! CREATE INDEX posts_author_created_idx ON posts (author_id, created_at DESC);
//! CREATE INDEX posts_reply_to_idx ON posts (reply_to_id);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Maximum length of a post body, in characters
pub const MAX_BODY_CHARS: usize = 280;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,

    /// Account that wrote the post
    pub author_id: Uuid,

    pub body: String,

    /// Parent post when this is a reply
    pub reply_to_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePost {
    pub author_id: Uuid,
    pub body: String,
    pub reply_to_id: Option<Uuid>,
}

impl Post {
    /// Inserts a new post
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation when the author or the parent post
    /// doesn't exist.
    pub async fn create(pool: &PgPool, data: CreatePost) -> Result<Self, sqlx::Error> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, author_id, body, reply_to_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author_id, body, reply_to_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.author_id)
        .bind(data.body)
        .bind(data.reply_to_id)
        .fetch_one(pool)
        .await?;

        Ok(post)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            "SELECT id, author_id, body, reply_to_id, created_at FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Loads a batch of posts, newest first
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, body, reply_to_id, created_at
            FROM posts
            WHERE id = ANY($1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(pool)
        .await
    }

    /// Posts written by any of `author_ids`, newest first
    ///
    /// `before` keeps only posts strictly older than the cursor instant, plus
    /// posts at that instant with an ID below `before_id` when one is given.
    /// `limit` caps the number of rows (None = unbounded).
    pub async fn list_by_authors(
        pool: &PgPool,
        author_ids: &[Uuid],
        before: Option<DateTime<Utc>>,
        before_id: Option<Uuid>,
        limit: Option<i64>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, body, reply_to_id, created_at
            FROM posts
            WHERE author_id = ANY($1)
              AND (
                  $2::timestamptz IS NULL
                  OR created_at < $2
                  OR (created_at = $2 AND id < $4::uuid)
              )
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(author_ids.to_vec())
        .bind(before)
        .bind(limit)
        .bind(before_id)
        .fetch_all(pool)
        .await
    }

    /// Direct replies to any of `parent_ids`, oldest first
    pub async fn list_replies(pool: &PgPool, parent_ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, body, reply_to_id, created_at
            FROM posts
            WHERE reply_to_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(parent_ids.to_vec())
        .fetch_all(pool)
        .await
    }
}
