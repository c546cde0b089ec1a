//! Storage backends for Warble
//!
//! Handlers and the feed assembler are written against the [`SocialStore`]
//! trait, which covers the account store, the social graph, and the post
//! store. Two implementations exist:
//!
//! - [`PgStore`]: PostgreSQL via sqlx, delegating to the queries in `models`
//! - [`MemoryStore`]: an in-process backend with the same semantics, used by
//!   tests and by `STORE_BACKEND=memory`
//!
//! # Contract
//!
//! Every backend must:
//! 1. Treat usernames and emails as unique regardless of case
//! 2. Make `follow` / `favorite` idempotent (returning whether a row was added)
//! 3. Make `unfollow` / `unfavorite` idempotent (returning whether a row was removed)
//! 4. Reject self-follows with [`StoreError::Invalid`]
//! 5. Report references to missing accounts or posts as [`StoreError::NotFound`]
//! 6. Return posts newest first, ties broken by descending ID

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Account, CreateAccount, CreatePost, Favorite, Post, UpdateProfile};

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule was violated (duplicate username or email)
    #[error("{0}")]
    Conflict(String),

    /// A referenced entity doesn't exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The operation is not allowed on this data (e.g. self-follow)
    #[error("{0}")]
    Invalid(String),

    /// The backend cannot be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Backend failure
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.constraint() {
                Some("accounts_username_lower_key") => {
                    return StoreError::Conflict("Username is already taken".to_string());
                }
                Some("accounts_email_lower_key") => {
                    return StoreError::Conflict("Email is already registered".to_string());
                }
                Some("follows_no_self_follow") => {
                    return StoreError::Invalid("You cannot follow yourself".to_string());
                }
                Some(constraint) if constraint.ends_with("_fkey") => {
                    if constraint.contains("post_id") || constraint.contains("reply_to_id") {
                        return StoreError::NotFound("Post");
                    }
                    return StoreError::NotFound("Account");
                }
                _ => {}
            }
        }

        StoreError::Database(err)
    }
}

/// Position in a newest-first post listing
///
/// Without an `id`, every post at `created_at` lies past the cursor's end.
/// With one, posts sharing the timestamp are ordered by descending ID, so a
/// page boundary inside a run of equal timestamps loses nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostCursor {
    pub created_at: DateTime<Utc>,
    pub id: Option<Uuid>,
}

impl PostCursor {
    /// Cursor at an instant
    pub fn at(created_at: DateTime<Utc>) -> Self {
        Self { created_at, id: None }
    }

    /// Cursor just past `post`
    pub fn after(post: &Post) -> Self {
        Self {
            created_at: post.created_at,
            id: Some(post.id),
        }
    }
}

/// A window over a newest-first post listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostWindow {
    /// Only posts that sort strictly after this cursor
    pub before: Option<PostCursor>,

    /// Maximum number of posts (None = unbounded)
    pub limit: Option<usize>,
}

impl PostWindow {
    /// A window covering every post
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// True if the post `(created_at, id)` sorts after the cursor
    pub fn admits(&self, created_at: DateTime<Utc>, id: Uuid) -> bool {
        match self.before {
            None => true,
            Some(cursor) => {
                created_at < cursor.created_at
                    || (created_at == cursor.created_at && cursor.id.map_or(false, |cursor_id| id < cursor_id))
            }
        }
    }
}

/// Storage contract shared by every backend
#[async_trait]
pub trait SocialStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    // Accounts

    async fn create_account(&self, data: CreateAccount) -> StoreResult<Account>;

    async fn find_account(&self, id: Uuid) -> StoreResult<Option<Account>>;

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>>;

    /// Loads a batch of accounts ordered by creation time, oldest first
    async fn find_accounts(&self, ids: &[Uuid]) -> StoreResult<Vec<Account>>;

    /// Overwrites every mutable profile field
    async fn update_profile(&self, id: Uuid, data: UpdateProfile) -> StoreResult<Account>;

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;

    async fn record_login(&self, id: Uuid) -> StoreResult<()>;

    // Social graph

    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> StoreResult<bool>;

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> StoreResult<bool>;

    async fn followee_ids(&self, follower_id: Uuid) -> StoreResult<Vec<Uuid>>;

    async fn follower_ids(&self, followee_id: Uuid) -> StoreResult<Vec<Uuid>>;

    /// Up to `limit` accounts that are neither `account_id` nor followed by it,
    /// oldest accounts first
    async fn suggestions(&self, account_id: Uuid, limit: usize) -> StoreResult<Vec<Account>>;

    // Posts

    async fn create_post(&self, data: CreatePost) -> StoreResult<Post>;

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>>;

    async fn find_posts(&self, ids: &[Uuid]) -> StoreResult<Vec<Post>>;

    async fn posts_by_authors(&self, author_ids: &[Uuid], window: PostWindow) -> StoreResult<Vec<Post>>;

    /// Direct replies to any of `parent_ids`, oldest first
    async fn replies_to(&self, parent_ids: &[Uuid]) -> StoreResult<Vec<Post>>;

    // Favorites

    async fn favorite(&self, account_id: Uuid, post_id: Uuid) -> StoreResult<bool>;

    async fn unfavorite(&self, account_id: Uuid, post_id: Uuid) -> StoreResult<bool>;

    async fn favorites_for_posts(&self, post_ids: &[Uuid]) -> StoreResult<Vec<Favorite>>;

    async fn favorites_by_account(&self, account_id: Uuid) -> StoreResult<Vec<Favorite>>;
}
