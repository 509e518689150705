//! # Database
//!
//! Pool construction and the embedded migration set.
//!
//! - [`connection`] - `PgPool` creation from [`DatabaseConfig`](crate::config::DatabaseConfig)
//! - [`migrations`] - the embedded [`MIGRATOR`] and a startup runner

pub mod connection;
pub mod migrations;

pub use connection::DatabaseConnection;
pub use migrations::{run_migrations, MIGRATOR};
