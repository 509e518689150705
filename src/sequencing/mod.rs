//! # Sparse Sequence Engine
//!
//! Manual ordering for unbounded, concurrently edited lists. Items carry
//! sparse `i64` keys; a move picks a key between the new neighbours and only
//! re-keys a bounded window when the gap has run out.
//!
//! ## Components
//!
//! - [`key_space`] - total order over `(sort_order, created_at, id)`
//! - [`neighbors`] - closest predecessor / successor inside a scope
//! - [`allocator`] - midpoint and edge key arithmetic
//! - [`rebalancer`] - local window re-keying
//! - [`mover`] - the locked move transaction tying them together
//!
//! Both the goods list and every showcase list run through the same
//! [`SequenceMover`]; the [`SequenceScope`] decides which rows a transaction
//! sees.

pub mod allocator;
pub mod errors;
pub mod key_space;
pub mod mover;
pub mod neighbors;
pub mod rebalancer;
pub mod scope;

#[cfg(test)]
mod test_support;

pub use allocator::KeyAllocator;
pub use errors::{SequenceError, SequenceResult};
pub use key_space::{compare, is_strictly_ordered, sort_items, Position};
pub use mover::{MoveOutcome, SequenceMover};
pub use neighbors::Direction;
pub use rebalancer::{RebalanceReport, WindowRebalancer};
pub use scope::SequenceScope;
