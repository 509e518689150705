//! # Structured Logging Module
//!
//! Environment-aware structured logging. The filter comes from `RUST_LOG`
//! when set, then from `[logging] level`, then from the environment
//! (`debug` everywhere except `production`, which logs at `info`).

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment defaults
pub fn init_structured_logging() {
    init_with_config(&LoggingConfig::default());
}

/// Initialize structured logging once; later calls are ignored
pub fn init_with_config(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let directive = resolve_filter(config.level.as_deref(), &environment);

        let console = if config.json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .json()
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        };

        // Use try_init to avoid panic if global subscriber already set
        if tracing_subscriber::registry().with(console).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            filter = %directive,
            json = config.json,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("SHIGU_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "test" => "debug".to_string(),
        "development" => "debug".to_string(),
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

fn resolve_filter(configured: Option<&str>, environment: &str) -> String {
    std::env::var("RUST_LOG")
        .ok()
        .filter(|value| !value.is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| get_log_level(environment))
}

/// Log structured data for catalogue writes
pub fn log_catalog_operation(
    operation: &str,
    entity: &str,
    record_id: Option<uuid::Uuid>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        entity = %entity,
        record_id = record_id.map(|id| id.to_string()),
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📋 CATALOG_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
