//! Read-side projections over a [`SocialStore`]
//!
//! The assembler builds the two composite views served by the API:
//!
//! - a **profile bundle**: an account with its posts, the accounts it follows,
//!   its followers, and its favorites
//! - a **timeline**: posts by the account and everyone it follows, newest first
//!
//! Every post is expanded exactly one level (author, favorites, direct
//! replies). Related rows are fetched per relation in a single batch call, so
//! the number of store calls does not grow with the number of posts.
//! Nothing here writes to the store.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Account, Favorite, Post};
use crate::store::{PostCursor, PostWindow, SocialStore, StoreError, StoreResult};

/// A post with its author, favorites and direct replies
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: Account,
    pub favorites: Vec<Favorite>,
    pub replies: Vec<Post>,
}

/// A favorite with the favorited post expanded
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteView {
    #[serde(flatten)]
    pub favorite: Favorite,
    pub post: PostView,
}

/// An account with everything shown on its profile page
#[derive(Debug, Clone, Serialize)]
pub struct ProfileBundle {
    #[serde(flatten)]
    pub account: Account,
    pub posts: Vec<PostView>,
    pub following: Vec<Account>,
    pub followers: Vec<Account>,
    pub favorites: Vec<FavoriteView>,
}

/// Paging and suggestion limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    /// Timeline page size when the caller gives no limit
    pub page_size: usize,

    /// Upper bound applied to any requested limit
    pub max_page_size: usize,

    /// Number of follow suggestions returned
    pub suggestion_limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_page_size: 100,
            suggestion_limit: 3,
        }
    }
}

impl FeedConfig {
    /// Builds a timeline window, defaulting and clamping the limit to `1..=max_page_size`
    pub fn window(&self, limit: Option<usize>, before: Option<PostCursor>) -> PostWindow {
        let limit = limit
            .unwrap_or(self.page_size)
            .clamp(1, self.max_page_size.max(1));

        PostWindow {
            before,
            limit: Some(limit),
        }
    }
}

/// Expands posts with author, favorites and replies, preserving input order
///
/// Posts whose author row is missing are dropped with a warning.
pub async fn expand_posts(store: &dyn SocialStore, posts: Vec<Post>) -> StoreResult<Vec<PostView>> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let author_ids: Vec<Uuid> = posts
        .iter()
        .map(|p| p.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let (authors, favorites, replies) = futures::try_join!(
        store.find_accounts(&author_ids),
        store.favorites_for_posts(&post_ids),
        store.replies_to(&post_ids),
    )?;

    let authors: HashMap<Uuid, Account> = authors.into_iter().map(|a| (a.id, a)).collect();

    let mut favorites_by_post: HashMap<Uuid, Vec<Favorite>> = HashMap::new();
    for favorite in favorites {
        favorites_by_post.entry(favorite.post_id).or_default().push(favorite);
    }

    let mut replies_by_parent: HashMap<Uuid, Vec<Post>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.reply_to_id {
            replies_by_parent.entry(parent_id).or_default().push(reply);
        }
    }

    let views = posts
        .into_iter()
        .filter_map(|post| {
            let Some(author) = authors.get(&post.author_id).cloned() else {
                warn!(post_id = %post.id, author_id = %post.author_id, "Post author missing, skipping");
                return None;
            };

            Some(PostView {
                favorites: favorites_by_post.remove(&post.id).unwrap_or_default(),
                replies: replies_by_parent.remove(&post.id).unwrap_or_default(),
                author,
                post,
            })
        })
        .collect();

    Ok(views)
}

/// Loads and expands a single post
pub async fn post_view(store: &dyn SocialStore, post_id: Uuid) -> StoreResult<PostView> {
    let post = store
        .find_post(post_id)
        .await?
        .ok_or(StoreError::NotFound("Post"))?;

    expand_posts(store, vec![post])
        .await?
        .pop()
        .ok_or(StoreError::NotFound("Post"))
}

/// Profile bundle for an account ID
pub async fn profile_bundle(store: &dyn SocialStore, account_id: Uuid) -> StoreResult<ProfileBundle> {
    let account = store
        .find_account(account_id)
        .await?
        .ok_or(StoreError::NotFound("Account"))?;

    bundle_for(store, account).await
}

/// Profile bundle for a username, matched case-insensitively
pub async fn profile_bundle_by_username(store: &dyn SocialStore, username: &str) -> StoreResult<ProfileBundle> {
    let account = store
        .find_account_by_username(username)
        .await?
        .ok_or(StoreError::NotFound("Account"))?;

    bundle_for(store, account).await
}

async fn bundle_for(store: &dyn SocialStore, account: Account) -> StoreResult<ProfileBundle> {
    let own_ids = [account.id];
    let (posts, followee_ids, follower_ids, favorites) = futures::try_join!(
        store.posts_by_authors(&own_ids, PostWindow::unbounded()),
        store.followee_ids(account.id),
        store.follower_ids(account.id),
        store.favorites_by_account(account.id),
    )?;

    let favorited_ids: Vec<Uuid> = favorites.iter().map(|f| f.post_id).collect();

    let (posts, following, followers, favorited_posts) = futures::try_join!(
        expand_posts(store, posts),
        store.find_accounts(&followee_ids),
        store.find_accounts(&follower_ids),
        store.find_posts(&favorited_ids),
    )?;

    let mut favorited: HashMap<Uuid, PostView> = expand_posts(store, favorited_posts)
        .await?
        .into_iter()
        .map(|view| (view.post.id, view))
        .collect();

    // Several favorites never point at the same post, so each view is taken once
    let favorites = favorites
        .into_iter()
        .filter_map(|favorite| {
            let post = favorited.remove(&favorite.post_id)?;
            Some(FavoriteView { favorite, post })
        })
        .collect();

    debug!(
        account_id = %account.id,
        posts = posts.len(),
        following = following.len(),
        followers = followers.len(),
        "Assembled profile bundle"
    );

    Ok(ProfileBundle {
        account,
        posts,
        following,
        followers,
        favorites,
    })
}

/// Posts by `account_id` and every account it follows, newest first
pub async fn timeline(store: &dyn SocialStore, account_id: Uuid, window: PostWindow) -> StoreResult<Vec<PostView>> {
    let mut author_ids = store.followee_ids(account_id).await?;
    author_ids.push(account_id);

    let posts = store.posts_by_authors(&author_ids, window).await?;
    debug!(%account_id, authors = author_ids.len(), posts = posts.len(), "Assembled timeline");

    expand_posts(store, posts).await
}

/// Accounts `account_id` might want to follow
pub async fn suggestions(store: &dyn SocialStore, account_id: Uuid, config: &FeedConfig) -> StoreResult<Vec<Account>> {
    store.suggestions(account_id, config.suggestion_limit).await
}
