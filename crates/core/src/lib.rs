//! Core business logic for Folio.
//!
//! This crate contains pure business logic with ZERO database dependencies.
//! Schemas, documents, posting rules and report aggregation live here; the
//! `folio-db` crate drives them against storage.
//!
//! # Modules
//!
//! - `schema` - Declared entity shapes and load-time integrity checks
//! - `document` - Typed values, documents, filters and input validation
//! - `ledger` - Double-entry posting, round-off and reversal
//! - `reports` - Report columns, cells and profit/loss aggregation
//! - `currency` - Fixed-point rounding and minor-unit conversion

pub mod currency;
pub mod document;
pub mod ledger;
pub mod reports;
pub mod schema;
