//! Embedded schema migrations
//!
//! The SQL files in `warble-shared/migrations/` are compiled into the binary
//! with `sqlx::migrate!` and applied in version order. Applied versions are
//! tracked by sqlx in `_sqlx_migrations`, so running them twice is a no-op.

use sqlx::{migrate::Migrator, PgPool};
use tracing::{info, warn};

/// Migrations compiled from `warble-shared/migrations/`
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies every pending migration
///
/// # Errors
///
/// Returns an error if a migration fails to execute or if a previously
/// applied migration has been modified on disk.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!(
        available = MIGRATOR.iter().count(),
        "Applying database migrations"
    );

    match MIGRATOR.run(pool).await {
        Ok(()) => {
            info!("Database schema is up to date");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}
