//! String formatting utilities.
//!
//! Provides functions for formatting strings for display, including
//! hex string prefix management and thousands separators.

use alloy_primitives::U256;

/// Removes "0x" prefix from a hex string if present.
///
/// This function removes the "0x" or "0X" prefix from a hex string if present,
/// returning the hex string without prefix.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Renders an integer as a canonical JSON-RPC quantity.
///
/// The result is `0x` followed by lower-case hex digits without leading
/// zeros; zero renders as `0x0`.
pub fn to_hex_quantity(value: U256) -> String {
	format!("0x{:x}", value)
}

/// Formats a decimal number string with comma thousands separators.
///
/// Non-digit input is returned unchanged.
pub fn format_with_commas(digits: &str) -> String {
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return digits.to_string();
	}

	let mut out = String::with_capacity(digits.len() + digits.len() / 3);
	for (i, c) in digits.chars().enumerate() {
		if i > 0 && (digits.len() - i) % 3 == 0 {
			out.push(',');
		}
		out.push(c);
	}
	out
}
