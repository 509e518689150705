use thiserror::Error;

use crate::config::ConfigurationError;
use crate::sequencing::SequenceError;
use crate::store::StoreError;

/// Crate-level error for bootstrapping and service composition
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Sequence error: {0}")]
    SequenceError(#[from] SequenceError),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] ConfigurationError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::DatabaseError(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for CatalogError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        CatalogError::DatabaseError(format!("migration failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
