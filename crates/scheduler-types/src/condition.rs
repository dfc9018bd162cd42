//! Release condition types.
//!
//! A pre-signed transaction is released to the network either once a wall
//! clock time has passed or once a block height is reached. On the wire the
//! remote scheduler expects `{"time": <unix seconds>}` or
//! `{"block": "0x<hex>"}`.

use crate::utils::{format_with_commas, without_0x_prefix};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Release at a wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeCondition {
	pub unix_seconds: u64,
}

/// Release at a block height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockCondition {
	pub block_number: u64,
}

/// A release condition: exactly one of time or block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
	Time(TimeCondition),
	Block(BlockCondition),
}

impl Condition {
	pub fn time(unix_seconds: u64) -> Self {
		Condition::Time(TimeCondition { unix_seconds })
	}

	pub fn block(block_number: u64) -> Self {
		Condition::Block(BlockCondition { block_number })
	}
}

impl fmt::Display for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Condition::Time(time) => write!(f, "at unix time {}", time.unix_seconds),
			Condition::Block(block) => write!(
				f,
				"at block #{}",
				format_with_commas(&block.block_number.to_string())
			),
		}
	}
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum BlockNumberRepr {
	Hex(String),
	Number(u64),
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireCondition {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	time: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	block: Option<BlockNumberRepr>,
}

impl Serialize for Condition {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let wire = match self {
			Condition::Time(time) => WireCondition {
				time: Some(time.unix_seconds),
				block: None,
			},
			Condition::Block(block) => WireCondition {
				time: None,
				block: Some(BlockNumberRepr::Hex(format!("0x{:x}", block.block_number))),
			},
		};
		wire.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for Condition {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let wire = WireCondition::deserialize(deserializer)?;
		match (wire.time, wire.block) {
			(Some(unix_seconds), None) => Ok(Condition::time(unix_seconds)),
			(None, Some(BlockNumberRepr::Number(block_number))) => {
				Ok(Condition::block(block_number))
			},
			(None, Some(BlockNumberRepr::Hex(hex))) => {
				let digits = without_0x_prefix(&hex);
				let block_number = u64::from_str_radix(digits, 16)
					.map_err(|e| D::Error::custom(format!("Invalid block number {}: {}", hex, e)))?;
				Ok(Condition::block(block_number))
			},
			(Some(_), Some(_)) => Err(D::Error::custom(
				"Condition must specify either time or block, not both",
			)),
			(None, None) => Err(D::Error::custom("Condition must specify time or block")),
		}
	}
}
