//! # Shigu Configuration
//!
//! Layered configuration: built-in defaults, then `config/shigu.toml`, then
//! `config/shigu.{environment}.toml`, then `SHIGU__*` environment variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use shigu_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let window = manager.config().sequencing.rebalance_window;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::constants::{pagination, sequencing};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ShiguConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub sequencing: SequencingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub request_timeout_ms: u64,
    /// Upper bound for `per_page` on list endpoints
    pub max_per_page: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_ms: 30_000,
            max_per_page: pagination::MAX_PER_PAGE,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Which store backs the catalogue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Connection URL; `${DATABASE_URL}` or an empty value defers to the
    /// `DATABASE_URL` environment variable
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            url: None,
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 5,
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    pub fn database_url(&self) -> Option<String> {
        match self.url.as_deref() {
            Some(url) if !url.is_empty() && url != "${DATABASE_URL}" => Some(url.to_string()),
            _ => std::env::var("DATABASE_URL").ok(),
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

/// Transaction isolation used for move transactions on PostgreSQL.
///
/// `read_committed` relies on the mover's row locks and re-reads;
/// `serializable` additionally lets PostgreSQL abort overlapping moves.
/// `repeatable_read` is parsed but rejected by validation: its snapshot
/// hides rows that concurrent moves committed into a locked gap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadCommitted,
    RepeatableRead,
    #[default]
    Serializable,
}

impl IsolationLevel {
    pub fn set_transaction_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
            IsolationLevel::RepeatableRead => "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ",
            IsolationLevel::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SequencingConfig {
    /// Spacing between freshly assigned keys
    pub step: i64,
    /// Items re-keyed on each side of the anchor during a rebalance
    pub rebalance_window: usize,
    pub max_move_attempts: u32,
    pub retry_backoff_ms: u64,
    pub lock_timeout_ms: u64,
    pub isolation: IsolationLevel,
}

impl Default for SequencingConfig {
    fn default() -> Self {
        Self {
            step: sequencing::ORDER_STEP,
            rebalance_window: sequencing::DEFAULT_REBALANCE_WINDOW,
            max_move_attempts: sequencing::DEFAULT_MAX_MOVE_ATTEMPTS,
            retry_backoff_ms: sequencing::DEFAULT_RETRY_BACKOFF_MS,
            lock_timeout_ms: sequencing::DEFAULT_LOCK_TIMEOUT_MS,
            isolation: IsolationLevel::default(),
        }
    }
}

impl SequencingConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Backoff before retry number `attempt` (1-based), doubling each time
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; `RUST_LOG` still wins when set
    pub level: Option<String>,
    pub json: bool,
}

impl ShiguConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.bind_address.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "server.bind_address",
                "server configuration",
            ));
        }

        if self.server.max_per_page == 0 {
            return Err(ConfigurationError::invalid_value(
                "server.max_per_page",
                "0",
                "page size limit must be greater than 0",
            ));
        }

        if self.database.backend == StorageBackend::Postgres {
            if self.database.max_connections == 0 {
                return Err(ConfigurationError::invalid_value(
                    "database.max_connections",
                    "0",
                    "pool size must be greater than 0",
                ));
            }

            if self.database.min_connections > self.database.max_connections {
                return Err(ConfigurationError::invalid_value(
                    "database.min_connections",
                    self.database.min_connections.to_string(),
                    "must not exceed database.max_connections",
                ));
            }
        }

        if self.sequencing.step < 2 {
            return Err(ConfigurationError::invalid_value(
                "sequencing.step",
                self.sequencing.step.to_string(),
                "step must leave room for a midpoint (>= 2)",
            ));
        }

        if self.sequencing.rebalance_window == 0 {
            return Err(ConfigurationError::invalid_value(
                "sequencing.rebalance_window",
                "0",
                "window must include at least one neighbour",
            ));
        }

        if self.sequencing.isolation == IsolationLevel::RepeatableRead {
            return Err(ConfigurationError::invalid_value(
                "sequencing.isolation",
                "repeatable_read",
                "snapshot reads miss rows moved by concurrent commits; use read_committed or serializable",
            ));
        }

        if self.sequencing.max_move_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "sequencing.max_move_attempts",
                "0",
                "at least one attempt is required",
            ));
        }

        Ok(())
    }

    pub fn is_memory_backend(&self) -> bool {
        self.database.backend == StorageBackend::Memory
    }
}
