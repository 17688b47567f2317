//! Embedded schema migrations, applied at startup.

use diesel::Connection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// ## Summary
/// Applies any pending migrations over a short-lived synchronous connection.
///
/// ## Errors
/// Returns an error if connecting or applying a migration fails.
pub fn run_migrations(database_url: &str) -> anyhow::Result<()> {
    let mut conn = diesel::PgConnection::establish(database_url)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| anyhow::anyhow!("failed to run migrations: {err}"))?;
    for version in applied {
        tracing::info!(migration = %version, "Applied migration");
    }
    Ok(())
}
