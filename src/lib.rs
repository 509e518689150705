#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Shigu Core
//!
//! Backend for a collectibles ("goods") catalogue whose lists can be
//! reordered by hand: the global goods list and one list per showcase.
//!
//! ## Overview
//!
//! Every orderable row carries a sparse `i64` key. Moving an item picks a
//! key between its new neighbours; when two neighbours sit on adjacent
//! integers a bounded window around the anchor is re-keyed instead of the
//! whole list. Moves run in one transaction with row locks taken in a
//! fixed order, so concurrent edits never interleave or deadlock.
//!
//! ## Module Organization
//!
//! - [`sequencing`] - the ordering engine (key space, neighbours, allocator,
//!   rebalancer, move transaction)
//! - [`store`] - storage traits with PostgreSQL and in-memory backends
//! - [`services`] - move retries and statistics
//! - [`models`] - catalogue rows and their SQL
//! - [`web`] - axum HTTP API
//! - [`config`] - layered configuration
//! - [`database`] - pool and migrations
//! - [`error`] - crate-level error type
//! - [`logging`] - structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shigu_core::config::SequencingConfig;
//! use shigu_core::sequencing::Position;
//! use shigu_core::services::OrderingService;
//! use shigu_core::store::{CatalogStore, MemoryStore};
//! use shigu_core::models::NewGoods;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::default());
//! let a = store.create_goods(NewGoods::named("acrylic stand"), 1000).await?;
//! let b = store.create_goods(NewGoods::named("can badge"), 1000).await?;
//!
//! let ordering = OrderingService::new(store.clone(), SequencingConfig::default());
//! ordering.move_goods(b.id, a.id, Position::After).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test                           # unit and in-memory integration tests
//! cargo test --features postgres-tests # adds PostgreSQL tests (needs DATABASE_URL)
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod sequencing;
pub mod services;
pub mod store;
pub mod web;

pub use config::{ConfigManager, ShiguConfig};
pub use constants::ORDER_STEP;
pub use error::{CatalogError, Result};
pub use models::{Goods, OrderedItem, Showcase};
pub use sequencing::{MoveOutcome, Position, SequenceError, SequenceMover, SequenceScope};
pub use services::OrderingService;
pub use store::{CatalogStore, MemoryStore, PgStore, SequenceStore};
