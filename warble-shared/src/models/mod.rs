//! Database models for Warble
//!
//! Each model carries its row type, its input types, and the sqlx queries
//! that the PostgreSQL store delegates to.
//!
//! # Models
//!
//! - `account`: Registered identities and their profile fields
//! - `follow`: Directed follower → followee edges
//! - `post`: Short text posts, optionally replying to another post
//! - `favorite`: An account's endorsement of a post

pub mod account;
pub mod favorite;
pub mod follow;
pub mod post;

pub use account::{Account, CreateAccount, UpdateProfile};
pub use favorite::Favorite;
pub use follow::Follow;
pub use post::{CreatePost, Post};
