//! Configuration module for the transaction scheduler client.
//!
//! Configuration is read from a TOML file. `${VAR}` and `${VAR:-default}`
//! references are substituted from the environment before parsing, and the
//! parsed configuration is validated before it is returned.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Remote scheduler endpoint.
	pub scheduler: SchedulerConfig,
	/// Wallet and signer backend. Without it only pasted raw transactions
	/// can be scheduled.
	pub account: Option<AccountConfig>,
	/// Wallet polling periods.
	#[serde(default)]
	pub polling: PollingConfig,
	/// Condition defaults.
	#[serde(default)]
	pub condition: ConditionConfig,
}

/// Remote scheduler settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
	/// Scheduling implementation name.
	#[serde(default = "default_scheduler_implementation")]
	pub implementation: String,
	/// Base URL; calls are posted to `<endpoint>/rpc`.
	pub endpoint: String,
	/// Request timeout in seconds.
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
}

impl SchedulerConfig {
	/// This section as the table handed to the implementation factory.
	pub fn implementation_config(&self) -> Result<toml::Value, ConfigError> {
		toml::Value::try_from(self)
			.map_err(|e| ConfigError::Parse(format!("Failed to serialize scheduler config: {}", e)))
	}
}

fn default_scheduler_implementation() -> String {
	"http".to_string()
}

fn default_timeout_seconds() -> u64 {
	30
}

/// Configuration for account management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

impl AccountConfig {
	/// RPC URL of the primary implementation, if it has one.
	pub fn rpc_url(&self) -> Option<&str> {
		self.implementations
			.get(&self.primary)
			.and_then(|table| table.get("rpc_url"))
			.and_then(|url| url.as_str())
	}
}

/// Wallet polling periods in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
	#[serde(default = "default_accounts_interval_ms")]
	pub accounts_interval_ms: u64,
	#[serde(default = "default_gas_price_interval_ms")]
	pub gas_price_interval_ms: u64,
	#[serde(default = "default_chain_head_interval_ms")]
	pub chain_head_interval_ms: u64,
}

impl Default for PollingConfig {
	fn default() -> Self {
		Self {
			accounts_interval_ms: default_accounts_interval_ms(),
			gas_price_interval_ms: default_gas_price_interval_ms(),
			chain_head_interval_ms: default_chain_head_interval_ms(),
		}
	}
}

impl PollingConfig {
	pub fn accounts_interval(&self) -> Duration {
		Duration::from_millis(self.accounts_interval_ms)
	}

	pub fn gas_price_interval(&self) -> Duration {
		Duration::from_millis(self.gas_price_interval_ms)
	}

	pub fn chain_head_interval(&self) -> Duration {
		Duration::from_millis(self.chain_head_interval_ms)
	}
}

fn default_accounts_interval_ms() -> u64 {
	5000
}

fn default_gas_price_interval_ms() -> u64 {
	2500
}

fn default_chain_head_interval_ms() -> u64 {
	5000
}

/// Condition defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConditionConfig {
	/// Distance between now and the initial release time.
	#[serde(default = "default_delay_seconds")]
	pub default_delay_seconds: u64,
}

impl Default for ConditionConfig {
	fn default() -> Self {
		Self {
			default_delay_seconds: default_delay_seconds(),
		}
	}
}

impl ConditionConfig {
	pub fn default_delay(&self) -> Duration {
		Duration::from_secs(self.default_delay_seconds)
	}
}

fn default_delay_seconds() -> u64 {
	3 * 60 * 60
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads and validates configuration from a file.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Unable to read config file at {}: {}", path.display(), e),
			))
		})?;
		content.parse()
	}

	/// Checks cross-section consistency. The contents of implementation
	/// tables (scheduler endpoint and timeout, account tables) are checked
	/// by each implementation's schema when its service is built.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.scheduler.implementation.is_empty() {
			return Err(ConfigError::Validation(
				"Scheduler implementation cannot be empty".into(),
			));
		}

		if let Some(account) = &self.account {
			if account.primary.is_empty() {
				return Err(ConfigError::Validation(
					"Account primary implementation cannot be empty".into(),
				));
			}
			if !account.implementations.contains_key(&account.primary) {
				return Err(ConfigError::Validation(format!(
					"Primary account '{}' not found in implementations",
					account.primary
				)));
			}
		}

		for (name, interval_ms) in [
			("accounts_interval_ms", self.polling.accounts_interval_ms),
			("gas_price_interval_ms", self.polling.gas_price_interval_ms),
			("chain_head_interval_ms", self.polling.chain_head_interval_ms),
		] {
			if interval_ms == 0 {
				return Err(ConfigError::Validation(format!(
					"Polling {} must be greater than 0",
					name
				)));
			}
		}

		if self.condition.default_delay_seconds == 0 {
			return Err(ConfigError::Validation(
				"Condition default_delay_seconds must be greater than 0".into(),
			));
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string, resolving environment
/// variables first and validating afterwards.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
