//! Database layer for Warble
//!
//! - `pool`: PostgreSQL connection pool with a startup health check
//! - `migrations`: Embedded schema migrations (see `warble-shared/migrations/`)
//!
//! Queries live next to their row types in `models`; the `store::PgStore`
//! backend ties them together.

pub mod migrations;
pub mod pool;
