//! Client for the remote transaction scheduler.
//!
//! The scheduler exposes a single JSON-RPC procedure, `scheduleTransaction`,
//! taking a release condition and a signed raw transaction and returning a
//! scheduling identifier.

use async_trait::async_trait;
use scheduler_types::{
	Condition, ConfigSchema, ImplementationRegistry, RawTransaction, ScheduleOutcome,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

/// Errors that can occur when calling the scheduler.
#[derive(Debug, Error)]
pub enum ClientError {
	/// The request could not be sent or the response not read.
	#[error("Network error: {0}")]
	Network(String),
	/// The response was not a JSON-RPC response.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	/// The scheduler answered with an error object.
	#[error("{0}")]
	Rpc(String),
	/// The implementation configuration is invalid.
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
}

/// Transport to a remote scheduler.
#[async_trait]
pub trait SchedulingInterface: Send + Sync {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Submits a raw transaction for release under `condition` and returns
	/// the scheduling identifier.
	async fn schedule_transaction(
		&self,
		condition: &Condition,
		raw: &RawTransaction,
	) -> Result<String, ClientError>;
}

/// Type alias for scheduling factory functions.
pub type SchedulingFactory = fn(&toml::Value) -> Result<Box<dyn SchedulingInterface>, ClientError>;

/// Registry trait for scheduling implementations.
pub trait SchedulingRegistry: ImplementationRegistry<Factory = SchedulingFactory> {}

/// Get all registered scheduling implementations.
pub fn get_all_implementations() -> Vec<(&'static str, SchedulingFactory)> {
	use implementations::http;

	vec![(http::Registry::NAME, http::Registry::factory())]
}

/// Service turning scheduling calls into displayable outcomes.
pub struct SchedulingService {
	implementation: Box<dyn SchedulingInterface>,
}

impl SchedulingService {
	pub fn new(implementation: Box<dyn SchedulingInterface>) -> Self {
		Self { implementation }
	}

	/// Builds the service from a named implementation and its table.
	pub fn from_config(name: &str, config: &toml::Value) -> Result<Self, ClientError> {
		let factory = get_all_implementations()
			.into_iter()
			.find(|(registered, _)| *registered == name)
			.map(|(_, factory)| factory)
			.ok_or_else(|| {
				ClientError::InvalidConfig(format!("Unknown scheduling implementation '{}'", name))
			})?;

		Self::from_factory(factory, config)
	}

	/// Builds the implementation and checks its table against the
	/// implementation's own schema.
	pub fn from_factory(
		factory: SchedulingFactory,
		config: &toml::Value,
	) -> Result<Self, ClientError> {
		let implementation = factory(config)?;
		implementation
			.config_schema()
			.validate(config)
			.map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

		Ok(Self::new(implementation))
	}

	/// Schedules the transaction. Failures are reported in the outcome,
	/// never as an error.
	pub async fn schedule(&self, condition: &Condition, raw: &RawTransaction) -> ScheduleOutcome {
		tracing::info!(condition = %condition, "Scheduling transaction");

		match self.implementation.schedule_transaction(condition, raw).await {
			Ok(id) => {
				tracing::info!(id = %id, "Transaction scheduled");
				ScheduleOutcome::Scheduled { id }
			},
			Err(e) => {
				tracing::warn!(error = %e, "Scheduling failed");
				ScheduleOutcome::Failed {
					message: e.to_string(),
				}
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use scheduler_types::{Field, FieldType, Schema};

	struct RejectingScheduler;

	struct EndpointSchema;

	impl ConfigSchema for EndpointSchema {
		fn validate(&self, config: &toml::Value) -> Result<(), scheduler_types::ValidationError> {
			Schema::new(vec![Field::new("endpoint", FieldType::String)], vec![]).validate(config)
		}
	}

	fn create_rejecting(
		_config: &toml::Value,
	) -> Result<Box<dyn SchedulingInterface>, ClientError> {
		Ok(Box::new(RejectingScheduler))
	}

	#[async_trait]
	impl SchedulingInterface for RejectingScheduler {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(EndpointSchema)
		}

		async fn schedule_transaction(
			&self,
			_condition: &Condition,
			_raw: &RawTransaction,
		) -> Result<String, ClientError> {
			Err(ClientError::Rpc("Nonce too low".to_string()))
		}
	}

	#[tokio::test]
	async fn test_failure_becomes_outcome() {
		let service = SchedulingService::new(Box::new(RejectingScheduler));
		let raw: RawTransaction = "0xf86c".parse().unwrap();
		let outcome = service.schedule(&Condition::block(10), &raw).await;
		assert_eq!(
			outcome,
			ScheduleOutcome::Failed {
				message: "Nonce too low".to_string()
			}
		);
	}

	#[test]
	fn test_from_factory_checks_implementation_schema() {
		let empty = toml::Value::Table(toml::map::Map::new());
		assert!(matches!(
			SchedulingService::from_factory(create_rejecting, &empty),
			Err(ClientError::InvalidConfig(msg)) if msg.contains("endpoint")
		));

		let config: toml::Value = toml::from_str(r#"endpoint = "http://localhost:8000""#).unwrap();
		assert!(SchedulingService::from_factory(create_rejecting, &config).is_ok());
	}

	#[test]
	fn test_unknown_implementation() {
		let config = toml::Value::Table(toml::map::Map::new());
		assert!(matches!(
			SchedulingService::from_config("carrier-pigeon", &config),
			Err(ClientError::InvalidConfig(_))
		));
	}
}
