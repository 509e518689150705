use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::config::{ConfigurationError, DatabaseConfig};
use crate::error::{CatalogError, Result};

pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let database_url = config.database_url().ok_or_else(|| {
            CatalogError::from(ConfigurationError::missing_required_field(
                "database.url",
                "database configuration (or DATABASE_URL)",
            ))
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(&database_url)
            .await?;

        info!(
            max_connections = config.max_connections,
            acquire_timeout_seconds = config.acquire_timeout_seconds,
            "Database pool ready"
        );

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<bool> {
        let row = sqlx::query("SELECT 1 as health")
            .fetch_one(&self.pool)
            .await?;

        let health: i32 = row.get("health");
        Ok(health == 1)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
