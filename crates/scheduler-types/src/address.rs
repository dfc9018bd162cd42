//! Address validation and checksum derivation.
//!
//! Addresses are typed or pasted by users, so they are classified rather
//! than rejected: the caller decides which warnings block submission.

use crate::utils::without_0x_prefix;
use alloy_primitives::keccak256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a `0x`-prefixed address string.
const ADDRESS_LENGTH: usize = 42;

/// Non-fatal classification of a typed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressWarning {
	/// No address given; as a recipient this creates a contract.
	ContractCreation,
	/// Wrong prefix, length or characters.
	Malformed,
	/// Mixed case that does not match the derived checksum.
	BadChecksum,
}

impl AddressWarning {
	/// Whether the warning should prevent the address from being used.
	pub fn is_blocking(self) -> bool {
		matches!(self, AddressWarning::Malformed)
	}
}

impl fmt::Display for AddressWarning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let message = match self {
			AddressWarning::ContractCreation => {
				"You didn't specify recipient - this will create a contract"
			},
			AddressWarning::Malformed => "This does not look like Ethereum address.",
			AddressWarning::BadChecksum => "The address does not contain a valid checksum.",
		};
		f.write_str(message)
	}
}

/// Result of classifying an address: the text as given plus an optional warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressCheck {
	pub value: String,
	pub warning: Option<AddressWarning>,
}

impl AddressCheck {
	pub fn is_empty(&self) -> bool {
		self.value.is_empty()
	}

	pub fn is_ok(&self) -> bool {
		self.warning.is_none()
	}
}

/// Classifies a typed address.
///
/// Rules, first match wins: empty text is a contract creation; text that
/// is not `0x` plus 40 hex characters is malformed; text that is not all
/// lower-case and differs from its checksum form has a bad checksum.
pub fn classify_address(text: &str) -> AddressCheck {
	let warning = if text.is_empty() {
		Some(AddressWarning::ContractCreation)
	} else if !text.starts_with("0x")
		|| text.len() != ADDRESS_LENGTH
		|| !text[2..].bytes().all(|b| b.is_ascii_hexdigit())
	{
		Some(AddressWarning::Malformed)
	} else if text.to_lowercase() != text && text != to_checksum_address(text) {
		Some(AddressWarning::BadChecksum)
	} else {
		None
	};

	AddressCheck {
		value: text.to_string(),
		warning,
	}
}

/// Derives the mixed-case checksum form of an address.
///
/// The 40 characters after the prefix are lower-cased and hashed with
/// keccak-256; character `i` is upper-cased when hash nibble `i` is above 7.
pub fn to_checksum_address(address: &str) -> String {
	let lowered = without_0x_prefix(address).to_lowercase();
	let hash = hex::encode(keccak256(lowered.as_bytes()));

	let checksummed: String = lowered
		.chars()
		.take(40)
		.zip(hash.chars())
		.map(|(c, nibble)| match nibble.to_digit(16) {
			Some(n) if n > 7 => c.to_ascii_uppercase(),
			_ => c,
		})
		.collect();

	format!("0x{}", checksummed)
}

/// Abbreviated address for option lists, e.g. `0x5aAeb6053F...E7Ef1BeAed`.
pub fn account_label(address: &str) -> String {
	match (address.get(..12), address.get(32..)) {
		(Some(head), Some(tail)) if address.len() > 32 => format!("{}...{}", head, tail),
		_ => address.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const EIP55_VECTORS: [&str; 4] = [
		"0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
		"0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
		"0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
		"0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
	];

	#[test]
	fn test_checksum_reference_vectors() {
		for expected in EIP55_VECTORS {
			assert_eq!(to_checksum_address(&expected.to_lowercase()), expected);
			assert_eq!(to_checksum_address(&expected.to_uppercase()[2..]), expected);
		}
	}

	#[test]
	fn test_checksum_matches_alloy() {
		let address = alloy_primitives::Address::repeat_byte(0xab);
		let lowered = hex::encode(address);
		assert_eq!(to_checksum_address(&lowered), address.to_checksum(None));
	}

	#[test]
	fn test_checksum_is_idempotent() {
		for text in [
			"0x0000000000000000000000000000000000000000",
			"0xffffffffffffffffffffffffffffffffffffffff",
			"0x5fbdb2315678afecb367f032d93f642f64180aa3",
			"0xe7f1725e7734ce288f8367e1bb143e90bb3f0512",
		] {
			let checksummed = to_checksum_address(text);
			assert_eq!(classify_address(&checksummed).warning, None);
			assert_eq!(to_checksum_address(&checksummed), checksummed);
		}
	}

	#[test]
	fn test_empty_is_contract_creation() {
		let check = classify_address("");
		assert_eq!(check.warning, Some(AddressWarning::ContractCreation));
		assert_eq!(check.value, "");
		assert!(!AddressWarning::ContractCreation.is_blocking());
	}

	#[test]
	fn test_malformed() {
		assert_eq!(
			classify_address("0xAB").warning,
			Some(AddressWarning::Malformed)
		);
		assert_eq!(
			classify_address("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed00").warning,
			Some(AddressWarning::Malformed)
		);
		assert_eq!(
			classify_address("0xzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").warning,
			Some(AddressWarning::Malformed)
		);
		assert!(AddressWarning::Malformed.is_blocking());
	}

	#[test]
	fn test_lower_case_is_accepted() {
		let check = classify_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
		assert!(check.is_ok());
	}

	#[test]
	fn test_bad_checksum() {
		let check = classify_address("0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
		assert_eq!(check.warning, Some(AddressWarning::BadChecksum));
		assert!(!AddressWarning::BadChecksum.is_blocking());
	}

	#[test]
	fn test_warning_messages() {
		assert_eq!(
			AddressWarning::Malformed.to_string(),
			"This does not look like Ethereum address."
		);
		assert_eq!(
			AddressWarning::BadChecksum.to_string(),
			"The address does not contain a valid checksum."
		);
	}

	#[test]
	fn test_account_label() {
		assert_eq!(
			account_label("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
			"0x5aAeb6053F...E7Ef1BeAed"
		);
		assert_eq!(account_label("0xAB"), "0xAB");
	}
}
