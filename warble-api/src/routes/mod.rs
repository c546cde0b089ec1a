//! API route handlers, grouped by resource
//!
//! - `health`: store connectivity probe
//! - `auth`: signup, login, token refresh
//! - `account`: own profile, profile edits, password change, public profiles
//! - `graph`: follow, unfollow, suggestions
//! - `timeline`: the caller's home feed
//! - `posts`: posting, single-post view, favorites

pub mod account;
pub mod auth;
pub mod graph;
pub mod health;
pub mod posts;
pub mod timeline;
