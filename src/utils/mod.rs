//! Utility module for the wallet actions.
//!
//! Re-exports amount conversion and formatting helpers used by the invoice workflow.
/// Amount conversion between display units and satoshis
pub mod units;

pub use units::{AmountConverter, BtcUnit, ConversionError, UnitConverter, format_sats};
