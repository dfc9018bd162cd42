//! Wallet and signer seam for the transaction scheduler.
//!
//! Key handling is never done locally. Accounts, gas price and chain head
//! come from an external wallet, and signing is delegated to an external
//! signer that returns raw transaction bytes. Both roles are usually served
//! by the same node, so implementations provide both behind
//! [`AccountInterface`].

use async_trait::async_trait;
use scheduler_types::{
	Address, CanonicalTransaction, ConfigSchema, ImplementationRegistry, SignedTransaction, U256,
};
use std::collections::HashMap;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod node;
}

/// Errors that can occur when talking to the wallet or signer.
#[derive(Debug, Error)]
pub enum AccountError {
	/// The signer refused or failed to sign.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// The wallet or node could not be reached or returned garbage.
	#[error("Network error: {0}")]
	Network(String),
	/// The implementation configuration is invalid.
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
	/// Error that occurs when interacting with the account implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Read side of an external wallet.
#[async_trait]
pub trait WalletInterface: Send + Sync {
	/// Accounts the wallet exposes, in wallet order.
	async fn accounts(&self) -> Result<Vec<Address>, AccountError>;

	/// Current network gas price in wei.
	async fn gas_price(&self) -> Result<U256, AccountError>;

	/// Height of the latest block.
	async fn block_number(&self) -> Result<u64, AccountError>;
}

/// External signer producing raw transaction bytes.
#[async_trait]
pub trait SignerInterface: Send + Sync {
	/// Signs the canonical transaction without broadcasting it.
	async fn sign_transaction(
		&self,
		tx: &CanonicalTransaction,
	) -> Result<SignedTransaction, AccountError>;
}

/// A configured backend serving both wallet and signer roles.
pub trait AccountInterface: WalletInterface + SignerInterface {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for account factory functions.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Get all registered account implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::node;

	vec![(node::Registry::NAME, node::Registry::factory())]
}

/// Service wrapping the selected account implementation.
///
/// Implements both [`WalletInterface`] and [`SignerInterface`] so it can be
/// shared with the wallet tracker and the draft model alike.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Builds the service from the `[account]` section: the `primary` name
	/// selects one of the `implementations` tables.
	pub fn from_config(
		primary: &str,
		implementations: &HashMap<String, toml::Value>,
	) -> Result<Self, AccountError> {
		let table = implementations.get(primary).ok_or_else(|| {
			AccountError::InvalidConfig(format!(
				"Primary account implementation '{}' has no configuration table",
				primary
			))
		})?;

		let factory = get_all_implementations()
			.into_iter()
			.find(|(name, _)| *name == primary)
			.map(|(_, factory)| factory)
			.ok_or_else(|| {
				AccountError::InvalidConfig(format!(
					"Unknown account implementation '{}'",
					primary
				))
			})?;

		let service = Self::from_factory(factory, table)?;
		tracing::info!(implementation = %primary, "Loaded account implementation");
		Ok(service)
	}

	/// Builds the implementation and checks its table against the
	/// implementation's own schema.
	pub fn from_factory(
		factory: AccountFactory,
		config: &toml::Value,
	) -> Result<Self, AccountError> {
		let implementation = factory(config)?;
		implementation
			.config_schema()
			.validate(config)
			.map_err(|e| AccountError::InvalidConfig(e.to_string()))?;

		Ok(Self::new(implementation))
	}
}

#[async_trait]
impl WalletInterface for AccountService {
	async fn accounts(&self) -> Result<Vec<Address>, AccountError> {
		self.implementation.accounts().await
	}

	async fn gas_price(&self) -> Result<U256, AccountError> {
		self.implementation.gas_price().await
	}

	async fn block_number(&self) -> Result<u64, AccountError> {
		self.implementation.block_number().await
	}
}

#[async_trait]
impl SignerInterface for AccountService {
	async fn sign_transaction(
		&self,
		tx: &CanonicalTransaction,
	) -> Result<SignedTransaction, AccountError> {
		tracing::debug!(from = %tx.from, to = ?tx.to, "Requesting signature");
		let signed = self.implementation.sign_transaction(tx).await?;
		tracing::info!(raw = %signed.raw, "Transaction signed");
		Ok(signed)
	}
}
