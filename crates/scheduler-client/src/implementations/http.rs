//! JSON-RPC over HTTP scheduling transport.

use crate::{ClientError, SchedulingInterface};
use async_trait::async_trait;
use scheduler_types::{
	http_url_validator, Condition, ConfigSchema, Field, FieldType, JsonRpcRequest,
	JsonRpcResponse, RawTransaction, Schema, ValidationError, SCHEDULE_METHOD,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Posts `scheduleTransaction` calls to `<endpoint>/rpc`.
pub struct HttpScheduler {
	client: reqwest::Client,
	rpc_url: String,
	next_id: AtomicU64,
}

impl HttpScheduler {
	pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ClientError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| ClientError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			rpc_url: format!("{}/rpc", endpoint.trim_end_matches('/')),
			next_id: AtomicU64::new(1),
		})
	}

	pub fn rpc_url(&self) -> &str {
		&self.rpc_url
	}
}

/// Configuration schema for the HTTP scheduler.
pub struct HttpSchedulerSchema;

impl HttpSchedulerSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		Self.validate(config)
	}
}

impl ConfigSchema for HttpSchedulerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("endpoint", FieldType::String).with_validator(http_url_validator)],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl SchedulingInterface for HttpScheduler {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpSchedulerSchema)
	}

	async fn schedule_transaction(
		&self,
		condition: &Condition,
		raw: &RawTransaction,
	) -> Result<String, ClientError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let request = JsonRpcRequest::new(id, SCHEDULE_METHOD, (condition, raw));

		tracing::debug!(url = %self.rpc_url, id, "Sending scheduleTransaction");

		let response = self
			.client
			.post(&self.rpc_url)
			.json(&request)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Failed to reach scheduler: {}", e)))?;

		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| ClientError::Network(format!("Failed to read response: {}", e)))?;

		let parsed: JsonRpcResponse = serde_json::from_str(&body).map_err(|e| {
			ClientError::InvalidResponse(format!("HTTP {} with non JSON-RPC body: {}", status, e))
		})?;

		match parsed.into_result() {
			Some(Ok(serde_json::Value::String(id))) => Ok(id),
			Some(Ok(serde_json::Value::Null)) | None => Err(ClientError::InvalidResponse(
				"Response has neither result nor error".to_string(),
			)),
			Some(Ok(other)) => Ok(other.to_string()),
			Some(Err(error)) => Err(ClientError::Rpc(error.to_string())),
		}
	}
}

/// Factory function to create an HTTP scheduler from configuration.
///
/// Configuration parameters:
/// - `endpoint`: base URL of the scheduler; requests go to `<endpoint>/rpc`
/// - `timeout_seconds`: request timeout (optional, default 30)
pub fn create_scheduler(config: &toml::Value) -> Result<Box<dyn SchedulingInterface>, ClientError> {
	HttpSchedulerSchema::validate_config(config)
		.map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

	let endpoint = config
		.get("endpoint")
		.and_then(|v| v.as_str())
		.ok_or_else(|| ClientError::InvalidConfig("endpoint is required".to_string()))?;

	let timeout_seconds = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|v| v as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

	Ok(Box::new(HttpScheduler::new(
		endpoint,
		Duration::from_secs(timeout_seconds),
	)?))
}

/// Registry for the HTTP scheduling implementation.
pub struct Registry;

impl scheduler_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = crate::SchedulingFactory;

	fn factory() -> Self::Factory {
		create_scheduler
	}
}

impl crate::SchedulingRegistry for Registry {}
