//! JSON-RPC envelope types and scheduling outcomes.
//!
//! Both the remote scheduler and the signing node speak JSON-RPC 2.0 over
//! HTTP. The envelope is generic over its params so the same types carry
//! `scheduleTransaction` and `eth_signTransaction` calls.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version sent with every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method name of the remote scheduling procedure.
pub const SCHEDULE_METHOD: &str = "scheduleTransaction";

/// Node method that signs a transaction without broadcasting it.
pub const SIGN_METHOD: &str = "eth_signTransaction";

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest<P> {
	pub jsonrpc: String,
	pub id: u64,
	pub method: String,
	pub params: P,
}

impl<P> JsonRpcRequest<P> {
	pub fn new(id: u64, method: impl Into<String>, params: P) -> Self {
		Self {
			jsonrpc: JSONRPC_VERSION.to_string(),
			id,
			method: method.into(),
			params,
		}
	}
}

/// Error object of a failed JSON-RPC call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<i64>,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<serde_json::Value>,
}

impl fmt::Display for JsonRpcError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.code {
			Some(code) => write!(f, "{} (code {})", self.message, code),
			None => f.write_str(&self.message),
		}
	}
}

/// A JSON-RPC 2.0 response carrying either a result or an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse<R = serde_json::Value> {
	#[serde(default)]
	pub jsonrpc: Option<String>,
	#[serde(default)]
	pub id: Option<serde_json::Value>,
	#[serde(default)]
	pub result: Option<R>,
	#[serde(default)]
	pub error: Option<JsonRpcError>,
}

impl<R> JsonRpcResponse<R> {
	/// Splits the response into its result, preferring the error when both
	/// are present. `None` means neither field was set.
	pub fn into_result(self) -> Option<Result<R, JsonRpcError>> {
		match (self.error, self.result) {
			(Some(error), _) => Some(Err(error)),
			(None, Some(result)) => Some(Ok(result)),
			(None, None) => None,
		}
	}
}

/// Displayable result of a scheduling attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScheduleOutcome {
	/// The scheduler accepted the transaction under this identifier.
	Scheduled { id: String },
	/// The call failed; the message is shown to the user.
	Failed { message: String },
}

impl ScheduleOutcome {
	pub fn is_scheduled(&self) -> bool {
		matches!(self, ScheduleOutcome::Scheduled { .. })
	}
}

impl fmt::Display for ScheduleOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ScheduleOutcome::Scheduled { id } => write!(f, "Transaction Scheduled. Id: {}", id),
			ScheduleOutcome::Failed { message } => write!(f, "Scheduling failed: {}", message),
		}
	}
}

/// Serde module for U256 values encoded as JSON-RPC hex quantities.
pub mod hex_u256 {
	use crate::utils::{to_hex_quantity, without_0x_prefix};
	use alloy_primitives::U256;
	use serde::{de::Error, Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&to_hex_quantity(*value))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		U256::from_str_radix(without_0x_prefix(&s), 16).map_err(D::Error::custom)
	}
}
