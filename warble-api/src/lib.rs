//! # Warble API Server Library
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error envelope and HTTP status mapping
//! - `extract`: Request extractors and validation helpers
//! - `response`: Success envelope
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod routes;
