//! # Warble Shared Library
//!
//! This crate contains the domain types, storage backends, and feed assembly
//! used by the Warble API server.
//!
//! ## Module Organization
//!
//! - `models`: Accounts, posts, favorites and follow edges
//! - `auth`: Password hashing, JWT issuance and bearer extraction
//! - `db`: PostgreSQL pool and embedded migrations
//! - `store`: The `SocialStore` trait with PostgreSQL and in-memory backends
//! - `feed`: Profile bundle and timeline projections

pub mod auth;
pub mod db;
pub mod feed;
pub mod models;
pub mod store;

/// Current version of the Warble shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
