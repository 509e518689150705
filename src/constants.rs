//! # System Constants
//!
//! Operational boundaries of the catalogue and its sequence engine.

/// Sequence key defaults
pub mod sequencing {
    /// Nominal distance between neighbouring order keys
    pub const ORDER_STEP: i64 = 1000;

    /// Items re-keyed on each side of the anchor when a gap runs out
    pub const DEFAULT_REBALANCE_WINDOW: usize = 100;

    /// Attempts a move gets before a concurrency conflict reaches the caller
    pub const DEFAULT_MAX_MOVE_ATTEMPTS: u32 = 3;

    /// Base delay between retried moves
    pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 25;

    /// How long a move waits on row locks before giving up
    pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;
}

/// HTTP listing defaults
pub mod pagination {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_PER_PAGE: u32 = 25;
    pub const MAX_PER_PAGE: u32 = 200;
}

pub mod system {
    /// Crate version reported by the health endpoint
    pub const SHIGU_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Prefix for environment variable configuration overrides
    pub const ENV_PREFIX: &str = "SHIGU";
}

pub use sequencing::ORDER_STEP;
