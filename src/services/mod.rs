pub mod ordering_service;

pub use ordering_service::{MoveStatistics, OrderingService};
