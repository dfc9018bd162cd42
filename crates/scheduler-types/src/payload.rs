//! Raw transaction and data payload validation.
//!
//! Raw transactions are opaque to the scheduler beyond being hex; they are
//! signed elsewhere and only relayed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when validating hex payloads.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
	/// The raw transaction is empty or contains non-hex characters.
	#[error("This does not look like a valid raw transaction: {0}")]
	InvalidRawTransaction(String),
	/// The attached data is not `0x`-prefixed, even-length hex.
	#[error("This does not look like valid data: {0}")]
	InvalidData(String),
}

/// Checks a raw transaction hex string.
///
/// Empty text is invalid. A `0x` prefix is stripped and the remainder
/// validated again, so a bare `0x` is invalid too.
pub fn is_valid_raw_tx(text: &str) -> bool {
	if text.is_empty() {
		return false;
	}

	match text.strip_prefix("0x") {
		Some(rest) => is_valid_raw_tx(rest),
		None => text.bytes().all(|b| b.is_ascii_hexdigit()),
	}
}

/// Checks the data payload attached to a composed transaction.
///
/// Empty data is valid (nothing attached).
pub fn is_valid_data(text: &str) -> bool {
	if text.is_empty() {
		return true;
	}

	text.starts_with("0x")
		&& text.len() % 2 == 0
		&& text[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// A validated, externally signed raw transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RawTransaction(String);

impl RawTransaction {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl FromStr for RawTransaction {
	type Err = PayloadError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		if is_valid_raw_tx(trimmed) {
			Ok(Self(trimmed.to_string()))
		} else {
			Err(PayloadError::InvalidRawTransaction(truncate(trimmed)))
		}
	}
}

impl TryFrom<String> for RawTransaction {
	type Error = PayloadError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<RawTransaction> for String {
	fn from(raw: RawTransaction) -> Self {
		raw.0
	}
}

impl fmt::Display for RawTransaction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

fn truncate(text: &str) -> String {
	match text.char_indices().nth(18) {
		Some((idx, _)) => format!("{}..", &text[..idx]),
		None => text.to_string(),
	}
}
