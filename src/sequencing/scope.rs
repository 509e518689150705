//! # Sequence Scopes
//!
//! A scope is the partition an ordering applies within. Items in different
//! scopes never compare and never share locks.

use std::fmt;

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceScope {
    /// The flat list of all goods
    Goods,
    /// The membership list of one showcase
    Showcase(Uuid),
}

impl SequenceScope {
    /// Table holding the ordered rows
    pub fn table(&self) -> &'static str {
        match self {
            SequenceScope::Goods => "goods",
            SequenceScope::Showcase(_) => "showcase_goods",
        }
    }

    /// Column identifying an item within the scope
    pub fn key_column(&self) -> &'static str {
        match self {
            SequenceScope::Goods => "id",
            SequenceScope::Showcase(_) => "goods_id",
        }
    }

    /// Partition filter, if the table holds more than one scope
    pub fn partition(&self) -> Option<(&'static str, Uuid)> {
        match self {
            SequenceScope::Goods => None,
            SequenceScope::Showcase(showcase_id) => Some(("showcase_id", *showcase_id)),
        }
    }
}

impl fmt::Display for SequenceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceScope::Goods => write!(f, "goods"),
            SequenceScope::Showcase(id) => write!(f, "showcase:{id}"),
        }
    }
}
