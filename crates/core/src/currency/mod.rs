//! Fixed-point currency arithmetic.
//!
//! Every balance-affecting value is a `Decimal`; conversions use banker's
//! rounding at the currency's precision.

pub mod conversion;
pub mod units;

pub use conversion::{convert_amount, round_amount};
pub use units::{from_minor_units, to_minor_units};
