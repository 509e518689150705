//! # Data Models
//!
//! Catalogue rows and their PostgreSQL queries. Each model owns the SQL for
//! its table; the sequence engine only sees [`OrderedItem`].

pub mod goods;
pub mod ordered_item;
pub mod pagination;
pub mod showcase;

pub use goods::{Goods, NewGoods};
pub use ordered_item::OrderedItem;
pub use pagination::{Page, PaginationInfo};
pub use showcase::{NewShowcase, Showcase, ShowcaseGoods, ShowcaseGoodsEntry};
