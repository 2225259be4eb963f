//! Conversion between user facing amounts and satoshis.

use crate::store::Settings;
use std::fmt;
use std::str::FromStr;

/// Satoshis in one bitcoin.
pub const SATS_PER_BTC: u64 = 100_000_000;

/// Bitcoin denomination an amount is displayed and entered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BtcUnit {
	Btc,
	MilliBtc,
	Bits,
	#[default]
	Sat,
}

impl BtcUnit {
	/// Number of fractional digits the unit carries down to one satoshi.
	pub fn decimals(self) -> u32 {
		match self {
			BtcUnit::Btc => 8,
			BtcUnit::MilliBtc => 5,
			BtcUnit::Bits => 2,
			BtcUnit::Sat => 0,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			BtcUnit::Btc => "BTC",
			BtcUnit::MilliBtc => "mBTC",
			BtcUnit::Bits => "bits",
			BtcUnit::Sat => "sats",
		}
	}
}

impl FromStr for BtcUnit {
	type Err = ConversionError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"btc" => Ok(BtcUnit::Btc),
			"mbtc" => Ok(BtcUnit::MilliBtc),
			"bit" | "bits" => Ok(BtcUnit::Bits),
			"sat" | "sats" => Ok(BtcUnit::Sat),
			other => Err(ConversionError::UnknownUnit(other.to_string())),
		}
	}
}

impl fmt::Display for BtcUnit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Errors converting a user entered amount
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
	#[error("No amount entered")]
	Empty,

	#[error("Amount is not a number: {0}")]
	NotANumber(String),

	#[error("Amount must not be negative")]
	Negative,

	#[error("{unit} amounts allow at most {decimals} decimal places")]
	TooPrecise { unit: BtcUnit, decimals: u32 },

	#[error("Amount is too large")]
	Overflow,

	#[error("No exchange rate available for {0}")]
	MissingExchangeRate(String),

	#[error("Unknown unit: {0}")]
	UnknownUnit(String),
}

/// Converts a decimal amount in the user's display currency into satoshis.
pub trait AmountConverter: Send + Sync {
	fn to_base_units(&self, amount: &str, settings: &Settings) -> Result<u64, ConversionError>;
}

/// Converter for bitcoin denominations and fiat amounts priced by an exchange rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitConverter;

impl AmountConverter for UnitConverter {
	fn to_base_units(&self, amount: &str, settings: &Settings) -> Result<u64, ConversionError> {
		if settings.display_fiat {
			fiat_to_sats(amount, &settings.fiat, settings.exchange_rate)
		} else {
			parse_amount(amount, settings.unit)
		}
	}
}

/// Parse a decimal string in `unit` into satoshis without going through floating point.
pub fn parse_amount(amount: &str, unit: BtcUnit) -> Result<u64, ConversionError> {
	let amount = amount.trim();
	if amount.is_empty() {
		return Err(ConversionError::Empty);
	}
	if amount.starts_with('-') {
		return Err(ConversionError::Negative);
	}

	let (whole, fraction) = match amount.split_once('.') {
		Some((whole, fraction)) => (whole, fraction),
		None => (amount, ""),
	};
	let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
	if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
		return Err(ConversionError::NotANumber(amount.to_string()));
	}

	let decimals = unit.decimals();
	if fraction.len() > decimals as usize {
		return Err(ConversionError::TooPrecise { unit, decimals });
	}

	let scale = 10u64.pow(decimals);
	let whole_value = if whole.is_empty() {
		0
	} else {
		whole.parse::<u64>().map_err(|_| ConversionError::Overflow)?
	};
	let fraction_value = if fraction.is_empty() {
		0
	} else {
		let padding = 10u64.pow(decimals - fraction.len() as u32);
		fraction.parse::<u64>().map_err(|_| ConversionError::Overflow)? * padding
	};

	whole_value
		.checked_mul(scale)
		.and_then(|sats| sats.checked_add(fraction_value))
		.ok_or(ConversionError::Overflow)
}

/// Convert a fiat amount using `rate`, the fiat price of one bitcoin.
fn fiat_to_sats(amount: &str, fiat: &str, rate: Option<f64>) -> Result<u64, ConversionError> {
	let amount = amount.trim();
	if amount.is_empty() {
		return Err(ConversionError::Empty);
	}
	let value: f64 = amount
		.parse()
		.map_err(|_| ConversionError::NotANumber(amount.to_string()))?;
	if !value.is_finite() {
		return Err(ConversionError::NotANumber(amount.to_string()));
	}
	if value < 0.0 {
		return Err(ConversionError::Negative);
	}

	let rate = rate
		.filter(|rate| rate.is_finite() && *rate > 0.0)
		.ok_or_else(|| ConversionError::MissingExchangeRate(fiat.to_string()))?;

	let sats = (value / rate * SATS_PER_BTC as f64).round();
	if sats > u64::MAX as f64 {
		return Err(ConversionError::Overflow);
	}
	Ok(sats as u64)
}

/// Render satoshis in `unit`, trimming trailing zeros.
pub fn format_sats(sats: u64, unit: BtcUnit) -> String {
	let decimals = unit.decimals();
	if decimals == 0 {
		return sats.to_string();
	}
	let scale = 10u64.pow(decimals);
	let fraction = format!("{:0width$}", sats % scale, width = decimals as usize);
	let fraction = fraction.trim_end_matches('0');
	if fraction.is_empty() {
		(sats / scale).to_string()
	} else {
		format!("{}.{}", sats / scale, fraction)
	}
}
