//! Shared types, errors, and configuration for Folio.
//!
//! This crate provides common types used across all other crates:
//! - Money types with per-currency decimal precision
//! - Pagination requests for explicit paging of queries
//! - The flat application error taxonomy
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AccountingConfig, AppConfig, DatabaseConfig, SchemaConfig};
pub use error::{AppError, AppResult};
