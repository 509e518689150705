//! # Migrations
//!
//! Migrations live in `migrations/` as `YYYYMMDDHHMMSS_description.sql` and
//! are embedded at compile time. `sqlx::test` uses the same [`MIGRATOR`] to
//! prepare each isolated test database.

use sqlx::migrate::Migrator;
use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply pending migrations; sqlx serializes concurrent runners with an
/// advisory lock
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    info!(migrations = MIGRATOR.iter().count(), "Database migrations applied");
    Ok(())
}
