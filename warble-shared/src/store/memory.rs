//! In-memory store
//!
//! A [`SocialStore`] that keeps everything in process memory behind a
//! `tokio::sync::RwLock`. It follows the same contract as the PostgreSQL
//! backend, which makes it suitable for:
//! - Router-level tests without a database
//! - Local demos (`STORE_BACKEND=memory`)
//!
//! Timestamps handed out by one store are strictly increasing, so creation
//! order is always recoverable from `created_at`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PostWindow, SocialStore, StoreError, StoreResult};
use crate::models::{
    Account, CreateAccount, CreatePost, Favorite, Follow, Post, UpdateProfile,
};

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<Uuid, Account>,

    /// Keyed by (follower_id, followee_id)
    follows: BTreeMap<(Uuid, Uuid), Follow>,

    posts: HashMap<Uuid, Post>,

    /// Keyed by (account_id, post_id)
    favorites: BTreeMap<(Uuid, Uuid), Favorite>,

    last_timestamp: Option<DateTime<Utc>>,
}

impl State {
    /// Current time, nudged forward so that it never repeats
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn ensure_unique(&self, username: &str, email: &str, except: Option<Uuid>) -> StoreResult<()> {
        let username = username.to_lowercase();
        let email = email.to_lowercase();

        for account in self.accounts.values() {
            if Some(account.id) == except {
                continue;
            }
            if account.username.to_lowercase() == username {
                return Err(StoreError::Conflict("Username is already taken".to_string()));
            }
            if account.email.to_lowercase() == email {
                return Err(StoreError::Conflict("Email is already registered".to_string()));
            }
        }

        Ok(())
    }

    fn require_account(&self, id: Uuid) -> StoreResult<()> {
        if self.accounts.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::NotFound("Account"))
        }
    }

    fn require_post(&self, id: Uuid) -> StoreResult<()> {
        if self.posts.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::NotFound("Post"))
        }
    }
}

fn sort_accounts(accounts: &mut [Account]) {
    accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

fn sort_posts_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

/// [`SocialStore`] held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,

    /// Simulated outage; only `ping` observes it
    unreachable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `ping` fail until called again with `true`
    pub fn set_reachable(&self, reachable: bool) {
        self.unreachable.store(!reachable, Ordering::Relaxed);
    }
}

#[async_trait]
impl SocialStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.unreachable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }

    async fn create_account(&self, data: CreateAccount) -> StoreResult<Account> {
        let mut state = self.state.write().await;
        state.ensure_unique(&data.username, &data.email, None)?;

        let now = state.tick();
        let account = Account {
            id: Uuid::new_v4(),
            name: data.name,
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            bio: None,
            location: None,
            website_url: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let email = email.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|account| account.email.to_lowercase() == email)
            .cloned())
    }

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let username = username.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|account| account.username.to_lowercase() == username)
            .cloned())
    }

    async fn find_accounts(&self, ids: &[Uuid]) -> StoreResult<Vec<Account>> {
        let state = self.state.read().await;
        let mut accounts: Vec<Account> = ids
            .iter()
            .filter_map(|id| state.accounts.get(id).cloned())
            .collect();
        sort_accounts(&mut accounts);
        accounts.dedup_by_key(|account| account.id);
        Ok(accounts)
    }

    async fn update_profile(&self, id: Uuid, data: UpdateProfile) -> StoreResult<Account> {
        let mut state = self.state.write().await;
        state.require_account(id)?;
        state.ensure_unique(&data.username, &data.email, Some(id))?;

        let now = state.tick();
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Account"))?;

        account.name = data.name;
        account.username = data.username;
        account.email = data.email;
        account.bio = data.bio;
        account.location = data.location;
        account.website_url = data.website_url;
        account.updated_at = now;

        Ok(account.clone())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let now = state.tick();
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Account"))?;

        account.password_hash = password_hash.to_string();
        account.updated_at = now;
        Ok(())
    }

    async fn record_login(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let now = state.tick();
        if let Some(account) = state.accounts.get_mut(&id) {
            account.last_login_at = Some(now);
        }
        Ok(())
    }

    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> StoreResult<bool> {
        if follower_id == followee_id {
            return Err(StoreError::Invalid("You cannot follow yourself".to_string()));
        }

        let mut state = self.state.write().await;
        state.require_account(follower_id)?;
        state.require_account(followee_id)?;

        if state.follows.contains_key(&(follower_id, followee_id)) {
            return Ok(false);
        }

        let created_at = state.tick();
        state.follows.insert(
            (follower_id, followee_id),
            Follow {
                follower_id,
                followee_id,
                created_at,
            },
        );
        Ok(true)
    }

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.follows.remove(&(follower_id, followee_id)).is_some())
    }

    async fn followee_ids(&self, follower_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let state = self.state.read().await;
        let mut edges: Vec<&Follow> = state
            .follows
            .values()
            .filter(|edge| edge.follower_id == follower_id)
            .collect();
        edges.sort_by_key(|edge| edge.created_at);
        Ok(edges.into_iter().map(|edge| edge.followee_id).collect())
    }

    async fn follower_ids(&self, followee_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let state = self.state.read().await;
        let mut edges: Vec<&Follow> = state
            .follows
            .values()
            .filter(|edge| edge.followee_id == followee_id)
            .collect();
        edges.sort_by_key(|edge| edge.created_at);
        Ok(edges.into_iter().map(|edge| edge.follower_id).collect())
    }

    async fn suggestions(&self, account_id: Uuid, limit: usize) -> StoreResult<Vec<Account>> {
        let state = self.state.read().await;
        let mut candidates: Vec<Account> = state
            .accounts
            .values()
            .filter(|account| account.id != account_id)
            .filter(|account| !state.follows.contains_key(&(account_id, account.id)))
            .cloned()
            .collect();
        sort_accounts(&mut candidates);
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn create_post(&self, data: CreatePost) -> StoreResult<Post> {
        let mut state = self.state.write().await;
        state.require_account(data.author_id)?;
        if let Some(parent_id) = data.reply_to_id {
            state.require_post(parent_id)?;
        }

        let post = Post {
            id: Uuid::new_v4(),
            author_id: data.author_id,
            body: data.body,
            reply_to_id: data.reply_to_id,
            created_at: state.tick(),
        };

        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn find_posts(&self, ids: &[Uuid]) -> StoreResult<Vec<Post>> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = ids
            .iter()
            .filter_map(|id| state.posts.get(id).cloned())
            .collect();
        sort_posts_newest_first(&mut posts);
        posts.dedup_by_key(|post| post.id);
        Ok(posts)
    }

    async fn posts_by_authors(&self, author_ids: &[Uuid], window: PostWindow) -> StoreResult<Vec<Post>> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|post| author_ids.contains(&post.author_id))
            .filter(|post| window.admits(post.created_at, post.id))
            .cloned()
            .collect();
        sort_posts_newest_first(&mut posts);
        if let Some(limit) = window.limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    async fn replies_to(&self, parent_ids: &[Uuid]) -> StoreResult<Vec<Post>> {
        let state = self.state.read().await;
        let mut replies: Vec<Post> = state
            .posts
            .values()
            .filter(|post| {
                post.reply_to_id
                    .map_or(false, |parent_id| parent_ids.contains(&parent_id))
            })
            .cloned()
            .collect();
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(replies)
    }

    async fn favorite(&self, account_id: Uuid, post_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        state.require_account(account_id)?;
        state.require_post(post_id)?;

        if state.favorites.contains_key(&(account_id, post_id)) {
            return Ok(false);
        }

        let created_at = state.tick();
        state.favorites.insert(
            (account_id, post_id),
            Favorite {
                id: Uuid::new_v4(),
                account_id,
                post_id,
                created_at,
            },
        );
        Ok(true)
    }

    async fn unfavorite(&self, account_id: Uuid, post_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.favorites.remove(&(account_id, post_id)).is_some())
    }

    async fn favorites_for_posts(&self, post_ids: &[Uuid]) -> StoreResult<Vec<Favorite>> {
        let state = self.state.read().await;
        let mut favorites: Vec<Favorite> = state
            .favorites
            .values()
            .filter(|favorite| post_ids.contains(&favorite.post_id))
            .cloned()
            .collect();
        favorites.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(favorites)
    }

    async fn favorites_by_account(&self, account_id: Uuid) -> StoreResult<Vec<Favorite>> {
        let state = self.state.read().await;
        let mut favorites: Vec<Favorite> = state
            .favorites
            .values()
            .filter(|favorite| favorite.account_id == account_id)
            .cloned()
            .collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(favorites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PostCursor;

    async fn account(store: &MemoryStore, username: &str) -> Account {
        store
            .create_account(CreateAccount {
                name: username.to_uppercase(),
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    async fn post(store: &MemoryStore, author: &Account, body: &str) -> Post {
        store
            .create_post(CreatePost {
                author_id: author.id,
                body: body.to_string(),
                reply_to_id: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_username_and_email_unique_ignoring_case() {
        let store = MemoryStore::new();
        account(&store, "ada").await;

        let dup_username = store
            .create_account(CreateAccount {
                name: "Other".to_string(),
                username: "ADA".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await;
        assert!(matches!(dup_username, Err(StoreError::Conflict(_))));

        let dup_email = store
            .create_account(CreateAccount {
                name: "Other".to_string(),
                username: "other".to_string(),
                email: "Ada@Example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await;
        assert!(matches!(dup_email, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_lookup_by_email_and_username_ignores_case() {
        let store = MemoryStore::new();
        let ada = account(&store, "ada").await;

        let by_email = store.find_account_by_email("ADA@example.com").await.unwrap();
        assert_eq!(by_email.map(|a| a.id), Some(ada.id));

        let by_username = store.find_account_by_username("Ada").await.unwrap();
        assert_eq!(by_username.map(|a| a.id), Some(ada.id));
    }

    #[tokio::test]
    async fn test_update_profile_allows_keeping_own_username() {
        let store = MemoryStore::new();
        let ada = account(&store, "ada").await;
        account(&store, "bob").await;

        let updated = store
            .update_profile(
                ada.id,
                UpdateProfile {
                    name: "Ada L.".to_string(),
                    username: "ada".to_string(),
                    email: "ada@example.com".to_string(),
                    bio: Some("Engines".to_string()),
                    location: None,
                    website_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Ada L.");
        assert_eq!(updated.bio.as_deref(), Some("Engines"));

        let taken = store
            .update_profile(
                ada.id,
                UpdateProfile {
                    name: "Ada".to_string(),
                    username: "BOB".to_string(),
                    email: "ada@example.com".to_string(),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(taken, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_profile_unknown_account() {
        let store = MemoryStore::new();
        let result = store
            .update_profile(Uuid::new_v4(), UpdateProfile::default())
            .await;
        assert!(matches!(result, Err(StoreError::NotFound("Account"))));
    }

    #[tokio::test]
    async fn test_follow_is_idempotent() {
        let store = MemoryStore::new();
        let ada = account(&store, "ada").await;
        let bob = account(&store, "bob").await;

        assert!(store.follow(ada.id, bob.id).await.unwrap());
        assert!(!store.follow(ada.id, bob.id).await.unwrap());
        assert_eq!(store.followee_ids(ada.id).await.unwrap(), vec![bob.id]);
        assert_eq!(store.follower_ids(bob.id).await.unwrap(), vec![ada.id]);

        assert!(store.unfollow(ada.id, bob.id).await.unwrap());
        assert!(!store.unfollow(ada.id, bob.id).await.unwrap());
        assert!(store.followee_ids(ada.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follow_rejects_self_and_unknown_accounts() {
        let store = MemoryStore::new();
        let ada = account(&store, "ada").await;

        let result = store.follow(ada.id, ada.id).await;
        assert!(matches!(result, Err(StoreError::Invalid(_))));

        let result = store.follow(ada.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::NotFound("Account"))));
    }

    #[tokio::test]
    async fn test_suggestions_exclude_self_and_followees() {
        let store = MemoryStore::new();
        let ada = account(&store, "ada").await;
        let bob = account(&store, "bob").await;
        let cy = account(&store, "cy").await;
        let dee = account(&store, "dee").await;
        let eve = account(&store, "eve").await;
        let fay = account(&store, "fay").await;

        store.follow(ada.id, cy.id).await.unwrap();

        let suggested: Vec<Uuid> = store
            .suggestions(ada.id, 3)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();

        assert_eq!(suggested, vec![bob.id, dee.id, eve.id]);
        assert!(!suggested.contains(&fay.id));
    }

    #[tokio::test]
    async fn test_posts_by_authors_newest_first_with_window() {
        let store = MemoryStore::new();
        let ada = account(&store, "ada").await;
        let first = post(&store, &ada, "one").await;
        let second = post(&store, &ada, "two").await;
        let third = post(&store, &ada, "three").await;

        let all = store
            .posts_by_authors(&[ada.id], PostWindow::unbounded())
            .await
            .unwrap();
        let ids: Vec<Uuid> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        let older = store
            .posts_by_authors(
                &[ada.id],
                PostWindow {
                    before: Some(PostCursor::at(third.created_at)),
                    limit: Some(1),
                },
            )
            .await
            .unwrap();
        assert_eq!(older.len(), 1);
        assert_eq!(older[0].id, second.id);
    }

    #[tokio::test]
    async fn test_simulated_outage_fails_ping() {
        let store = MemoryStore::new();
        assert!(store.ping().await.is_ok());

        store.set_reachable(false);
        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));

        store.set_reachable(true);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_paging_through_equal_timestamps_loses_nothing() {
        let store = MemoryStore::new();
        let ada = account(&store, "ada").await;
        let mut ids = Vec::new();
        for body in ["one", "two", "three", "four"] {
            ids.push(post(&store, &ada, body).await.id);
        }

        let shared = Utc::now();
        {
            let mut state = store.state.write().await;
            for post in state.posts.values_mut() {
                post.created_at = shared;
            }
        }

        let mut seen = Vec::new();
        let mut window = PostWindow {
            before: None,
            limit: Some(3),
        };
        loop {
            let page = store.posts_by_authors(&[ada.id], window).await.unwrap();
            let Some(last) = page.last() else { break };
            window.before = Some(PostCursor::after(last));
            seen.extend(page.iter().map(|p| p.id));
        }

        ids.sort_by(|a, b| b.cmp(a));
        assert_eq!(seen, ids);
    }

    #[tokio::test]
    async fn test_reply_to_unknown_post_is_rejected() {
        let store = MemoryStore::new();
        let ada = account(&store, "ada").await;

        let result = store
            .create_post(CreatePost {
                author_id: ada.id,
                body: "reply".to_string(),
                reply_to_id: Some(Uuid::new_v4()),
            })
            .await;
        assert!(matches!(result, Err(StoreError::NotFound("Post"))));
    }

    #[tokio::test]
    async fn test_favorites_are_idempotent() {
        let store = MemoryStore::new();
        let ada = account(&store, "ada").await;
        let bob = account(&store, "bob").await;
        let hello = post(&store, &bob, "hello").await;

        assert!(store.favorite(ada.id, hello.id).await.unwrap());
        assert!(!store.favorite(ada.id, hello.id).await.unwrap());

        let on_post = store.favorites_for_posts(&[hello.id]).await.unwrap();
        assert_eq!(on_post.len(), 1);
        assert_eq!(on_post[0].account_id, ada.id);

        assert!(store.unfavorite(ada.id, hello.id).await.unwrap());
        assert!(store.favorites_by_account(ada.id).await.unwrap().is_empty());
    }
}
