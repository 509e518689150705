//! # Web API Application State
//!
//! Shared handles for the handlers: the catalogue store, the ordering
//! service and the loaded configuration.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::config::ShiguConfig;
use crate::services::OrderingService;
use crate::store::{CatalogStore, MemoryStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub ordering: Arc<OrderingService>,
    pub config: Arc<ShiguConfig>,
    pub started_at: Instant,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.catalog.backend_name())
            .field("ordering", &self.ordering)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// State backed by PostgreSQL
    pub fn with_postgres(store: PgStore, config: ShiguConfig) -> Self {
        let store = Arc::new(store);
        let ordering = OrderingService::new(store.clone(), config.sequencing.clone());
        Self::assemble(store, ordering, config)
    }

    /// State backed by the in-process store
    pub fn with_memory(store: MemoryStore, config: ShiguConfig) -> Self {
        let store = Arc::new(store);
        let ordering = OrderingService::new(store.clone(), config.sequencing.clone());
        Self::assemble(store, ordering, config)
    }

    fn assemble(
        catalog: Arc<dyn CatalogStore>,
        ordering: OrderingService,
        config: ShiguConfig,
    ) -> Self {
        info!(
            backend = catalog.backend_name(),
            step = config.sequencing.step,
            rebalance_window = config.sequencing.rebalance_window,
            "Web API state ready"
        );

        Self {
            catalog,
            ordering: Arc::new(ordering),
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Key spacing for new front-of-list rows
    pub fn step(&self) -> i64 {
        self.config.sequencing.step
    }
}
