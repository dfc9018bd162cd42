//! Canonical transaction and signer response types.

use crate::api::hex_u256;
use crate::payload::RawTransaction;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// The transaction handed to an external signer.
///
/// Numeric fields are hex quantities; `to` is `null` for contract creation
/// and `data` is `null` when nothing is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalTransaction {
	pub from: String,
	pub to: Option<String>,
	#[serde(with = "hex_u256")]
	pub value: U256,
	#[serde(with = "hex_u256")]
	pub gas_price: U256,
	#[serde(with = "hex_u256")]
	pub gas: U256,
	pub data: Option<String>,
}

/// Response of `eth_signTransaction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
	/// The signed RLP bytes, ready to be scheduled.
	pub raw: RawTransaction,
	/// Decoded transaction echoed back by the node, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tx: Option<serde_json::Value>,
}
