//! `SeaORM` entities for the fixed tables.
//!
//! Document tables are created from schemas at runtime and have no entity;
//! the store reaches them through `SeaQuery` directly.

pub mod ledger_entries;
pub mod number_series;
