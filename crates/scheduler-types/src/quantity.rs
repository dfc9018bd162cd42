//! User-typed numeric quantities.
//!
//! Wei values, gas limits and gas prices are typed by users in a loose
//! grammar: hex literals (`0x5208`), shorthand magnitudes (`21k`, `3g`),
//! unit-suffixed amounts (`3 gwei`, `1.5 ether`) and plain decimals.
//! Parsing never fails; text that does not match the grammar degrades to
//! zero and is flagged as invalid.

use crate::utils::to_hex_quantity;
use alloy_primitives::U256;
use std::fmt;
use std::str::FromStr;

/// Named ether denominations accepted after a magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherUnit {
	Wei,
	Kwei,
	Mwei,
	Gwei,
	Szabo,
	Finney,
	Ether,
	Kether,
	Mether,
	Gether,
	Tether,
}

impl EtherUnit {
	/// Power of ten converting one unit into wei.
	pub fn decimals(self) -> u8 {
		match self {
			EtherUnit::Wei => 0,
			EtherUnit::Kwei => 3,
			EtherUnit::Mwei => 6,
			EtherUnit::Gwei => 9,
			EtherUnit::Szabo => 12,
			EtherUnit::Finney => 15,
			EtherUnit::Ether => 18,
			EtherUnit::Kether => 21,
			EtherUnit::Mether => 24,
			EtherUnit::Gether => 27,
			EtherUnit::Tether => 30,
		}
	}

	/// Multiplier converting one unit into wei.
	pub fn multiplier(self) -> U256 {
		U256::from(10u64).pow(U256::from(self.decimals()))
	}

	/// Converts a decimal magnitude such as `3` or `1.5` into wei.
	///
	/// Returns `None` when the magnitude is not a plain decimal, when it has
	/// more fractional digits than the unit can represent, or on overflow.
	pub fn to_wei(self, magnitude: &str) -> Option<U256> {
		let (whole, fraction) = match magnitude.split_once('.') {
			Some((whole, fraction)) => (whole, fraction),
			None => (magnitude, ""),
		};

		if whole.is_empty() && fraction.is_empty() {
			return None;
		}
		if !is_decimal_digits(whole) && !whole.is_empty() {
			return None;
		}
		if !is_decimal_digits(fraction) && !fraction.is_empty() {
			return None;
		}

		let decimals = self.decimals() as usize;
		if fraction.len() > decimals {
			return None;
		}

		let whole_value = if whole.is_empty() {
			U256::ZERO
		} else {
			U256::from_str_radix(whole, 10).ok()?
		};
		let padded_fraction = format!("{:0<width$}", fraction, width = decimals);
		let fraction_value = if padded_fraction.is_empty() {
			U256::ZERO
		} else {
			U256::from_str_radix(&padded_fraction, 10).ok()?
		};

		whole_value
			.checked_mul(self.multiplier())?
			.checked_add(fraction_value)
	}
}

impl FromStr for EtherUnit {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let unit = match s.to_lowercase().as_str() {
			"wei" => EtherUnit::Wei,
			"kwei" | "babbage" | "femtoether" => EtherUnit::Kwei,
			"mwei" | "lovelace" | "picoether" => EtherUnit::Mwei,
			"gwei" | "shannon" | "nanoether" | "nano" => EtherUnit::Gwei,
			"szabo" | "microether" | "micro" => EtherUnit::Szabo,
			"finney" | "milliether" | "milli" => EtherUnit::Finney,
			"ether" => EtherUnit::Ether,
			"kether" | "grand" => EtherUnit::Kether,
			"mether" => EtherUnit::Mether,
			"gether" => EtherUnit::Gether,
			"tether" => EtherUnit::Tether,
			other => return Err(format!("Unknown unit: {}", other)),
		};
		Ok(unit)
	}
}

/// An exact unsigned integer parsed from user text.
///
/// Keeps the original text for display next to the parsed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
	text: String,
	value: U256,
	valid: bool,
}

impl Quantity {
	/// Parses user text into a quantity.
	///
	/// The grammar is applied in order:
	/// 1. `0x` prefix: the rest is base-16.
	/// 2. `k`, `m`, `g` in the numeral expand to 3, 6 and 9 zeros.
	/// 3. Two or more whitespace-separated tokens: `<magnitude> <unit>`,
	///    falling through to step 4 if the conversion fails.
	/// 4. The expanded text as base-10.
	///
	/// Anything else yields zero with `is_valid() == false`.
	pub fn parse(text: &str) -> Self {
		match parse_value(text) {
			Some(value) => Self {
				text: text.to_string(),
				value,
				valid: true,
			},
			None => Self {
				text: text.to_string(),
				value: U256::ZERO,
				valid: false,
			},
		}
	}

	/// Builds a quantity from a known value, using its decimal form as text.
	pub fn from_value(value: U256) -> Self {
		Self {
			text: value.to_string(),
			value,
			valid: true,
		}
	}

	/// The parsed value; zero when the text did not parse.
	pub fn value(&self) -> U256 {
		self.value
	}

	/// The text as typed by the user.
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Whether the text matched the grammar completely.
	pub fn is_valid(&self) -> bool {
		self.valid
	}

	pub fn is_zero(&self) -> bool {
		self.value.is_zero()
	}

	/// Canonical `0x` hex form of the value.
	pub fn to_hex(&self) -> String {
		to_hex_quantity(self.value)
	}
}

impl Default for Quantity {
	fn default() -> Self {
		Self::parse("")
	}
}

impl fmt::Display for Quantity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.value)
	}
}

fn parse_value(text: &str) -> Option<U256> {
	let lowered = text.to_lowercase();

	if let Some(digits) = lowered.strip_prefix("0x") {
		if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
			return None;
		}
		return U256::from_str_radix(digits, 16).ok();
	}

	let trimmed = lowered.trim();
	let parts: Vec<&str> = trimmed.split_whitespace().collect();
	if parts.len() > 1 {
		let converted = parts[1]
			.parse::<EtherUnit>()
			.ok()
			.and_then(|unit| unit.to_wei(&expand_shorthand(parts[0])));
		if converted.is_some() {
			return converted;
		}
	}

	let expanded = expand_shorthand(trimmed);
	if !is_decimal_digits(&expanded) {
		return None;
	}
	U256::from_str_radix(&expanded, 10).ok()
}

/// Expands `k`, `m` and `g` shorthand into zeros.
fn expand_shorthand(numeral: &str) -> String {
	numeral
		.replace('k', "000")
		.replace('m', "000000")
		.replace('g', "000000000")
}

fn is_decimal_digits(s: &str) -> bool {
	!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
