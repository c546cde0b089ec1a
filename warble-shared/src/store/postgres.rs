//! PostgreSQL store
//!
//! Thin adapter from [`SocialStore`] onto the sqlx queries in `models`.
//! Uniqueness, idempotency and referential checks are left to the schema
//! (unique indexes, `ON CONFLICT DO NOTHING`, foreign keys) and translated by
//! `From<sqlx::Error> for StoreError`.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{PostWindow, SocialStore, StoreError, StoreResult};
use crate::db::pool::health_check;
use crate::models::{
    Account, CreateAccount, CreatePost, Favorite, Follow, Post, UpdateProfile,
};

/// [`SocialStore`] backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SocialStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn create_account(&self, data: CreateAccount) -> StoreResult<Account> {
        let account = Account::create(&self.pool, data).await?;
        debug!(account_id = %account.id, username = %account.username, "Account created");
        Ok(account)
    }

    async fn find_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(Account::find_by_id(&self.pool, id).await?)
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(Account::find_by_email(&self.pool, email).await?)
    }

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        Ok(Account::find_by_username(&self.pool, username).await?)
    }

    async fn find_accounts(&self, ids: &[Uuid]) -> StoreResult<Vec<Account>> {
        Ok(Account::find_by_ids(&self.pool, ids).await?)
    }

    async fn update_profile(&self, id: Uuid, data: UpdateProfile) -> StoreResult<Account> {
        Account::update_profile(&self.pool, id, data)
            .await?
            .ok_or(StoreError::NotFound("Account"))
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        if Account::update_password_hash(&self.pool, id, password_hash).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound("Account"))
        }
    }

    async fn record_login(&self, id: Uuid) -> StoreResult<()> {
        Account::update_last_login(&self.pool, id).await?;
        Ok(())
    }

    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> StoreResult<bool> {
        if follower_id == followee_id {
            return Err(StoreError::Invalid("You cannot follow yourself".to_string()));
        }

        let created = Follow::create(&self.pool, follower_id, followee_id).await?;
        debug!(%follower_id, %followee_id, created, "Follow edge written");
        Ok(created)
    }

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> StoreResult<bool> {
        Ok(Follow::delete(&self.pool, follower_id, followee_id).await?)
    }

    async fn followee_ids(&self, follower_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(Follow::followee_ids(&self.pool, follower_id).await?)
    }

    async fn follower_ids(&self, followee_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(Follow::follower_ids(&self.pool, followee_id).await?)
    }

    async fn suggestions(&self, account_id: Uuid, limit: usize) -> StoreResult<Vec<Account>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(Account::suggestions(&self.pool, account_id, limit).await?)
    }

    async fn create_post(&self, data: CreatePost) -> StoreResult<Post> {
        let post = Post::create(&self.pool, data).await?;
        debug!(post_id = %post.id, author_id = %post.author_id, "Post created");
        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        Ok(Post::find_by_id(&self.pool, id).await?)
    }

    async fn find_posts(&self, ids: &[Uuid]) -> StoreResult<Vec<Post>> {
        Ok(Post::find_by_ids(&self.pool, ids).await?)
    }

    async fn posts_by_authors(&self, author_ids: &[Uuid], window: PostWindow) -> StoreResult<Vec<Post>> {
        let limit = window
            .limit
            .map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));
        let before = window.before.map(|cursor| cursor.created_at);
        let before_id = window.before.and_then(|cursor| cursor.id);
        Ok(Post::list_by_authors(&self.pool, author_ids, before, before_id, limit).await?)
    }

    async fn replies_to(&self, parent_ids: &[Uuid]) -> StoreResult<Vec<Post>> {
        Ok(Post::list_replies(&self.pool, parent_ids).await?)
    }

    async fn favorite(&self, account_id: Uuid, post_id: Uuid) -> StoreResult<bool> {
        Ok(Favorite::create(&self.pool, account_id, post_id).await?)
    }

    async fn unfavorite(&self, account_id: Uuid, post_id: Uuid) -> StoreResult<bool> {
        Ok(Favorite::delete(&self.pool, account_id, post_id).await?)
    }

    async fn favorites_for_posts(&self, post_ids: &[Uuid]) -> StoreResult<Vec<Favorite>> {
        Ok(Favorite::list_for_posts(&self.pool, post_ids).await?)
    }

    async fn favorites_by_account(&self, account_id: Uuid) -> StoreResult<Vec<Favorite>> {
        Ok(Favorite::list_by_account(&self.pool, account_id).await?)
    }
}
