//! Voucher submission and cancellation.
//!
//! Ties the pure posting engine in `folio-core` to the document store: each
//! operation reads the voucher, writes the ledger entries and flips the
//! status inside one transaction.

pub mod error;
pub mod service;

pub use error::PostingError;
pub use service::PostingService;
