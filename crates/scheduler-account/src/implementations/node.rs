//! Account implementation backed by an Ethereum node's JSON-RPC API.
//!
//! Uses the node's unlocked accounts: `eth_accounts`, `eth_gasPrice` and
//! `eth_blockNumber` for the wallet role and `eth_signTransaction` for
//! signing. The node never broadcasts; the signed bytes are returned.

use crate::{AccountError, AccountInterface, SignerInterface, WalletInterface};
use alloy_primitives::{Address, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_transport_http::Http;
use async_trait::async_trait;
use scheduler_types::{
	http_url_validator, CanonicalTransaction, ConfigSchema, Field, FieldType, Schema,
	SignedTransaction, ValidationError, SIGN_METHOD,
};

/// Node-backed wallet and signer.
pub struct NodeAccount {
	provider: RootProvider<Http<reqwest::Client>>,
	rpc_url: String,
}

impl NodeAccount {
	pub fn new(rpc_url: &str) -> Result<Self, AccountError> {
		let url = rpc_url
			.parse()
			.map_err(|e| AccountError::InvalidConfig(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

		Ok(Self {
			provider: RootProvider::new_http(url),
			rpc_url: rpc_url.to_string(),
		})
	}

	pub fn rpc_url(&self) -> &str {
		&self.rpc_url
	}
}

/// Configuration schema for the node account.
pub struct NodeAccountSchema;

impl NodeAccountSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		Self.validate(config)
	}
}

impl ConfigSchema for NodeAccountSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("rpc_url", FieldType::String).with_validator(http_url_validator)],
			vec![],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl WalletInterface for NodeAccount {
	async fn accounts(&self) -> Result<Vec<Address>, AccountError> {
		self.provider
			.get_accounts()
			.await
			.map_err(|e| AccountError::Network(format!("Failed to get accounts: {}", e)))
	}

	async fn gas_price(&self) -> Result<U256, AccountError> {
		let gas_price = self
			.provider
			.get_gas_price()
			.await
			.map_err(|e| AccountError::Network(format!("Failed to get gas price: {}", e)))?;

		Ok(U256::from(gas_price))
	}

	async fn block_number(&self) -> Result<u64, AccountError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| AccountError::Network(format!("Failed to get block number: {}", e)))
	}
}

#[async_trait]
impl SignerInterface for NodeAccount {
	async fn sign_transaction(
		&self,
		tx: &CanonicalTransaction,
	) -> Result<SignedTransaction, AccountError> {
		self.provider
			.raw_request::<_, SignedTransaction>(SIGN_METHOD.into(), (tx.clone(),))
			.await
			.map_err(|e| AccountError::SigningFailed(e.to_string()))
	}
}

impl AccountInterface for NodeAccount {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NodeAccountSchema)
	}
}

/// Factory function to create a node account from configuration.
///
/// Configuration parameters:
/// - `rpc_url`: HTTP(S) endpoint of the node
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	NodeAccountSchema::validate_config(config)
		.map_err(|e| AccountError::InvalidConfig(e.to_string()))?;

	let rpc_url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AccountError::InvalidConfig("rpc_url is required".to_string()))?;

	Ok(Box::new(NodeAccount::new(rpc_url)?))
}

/// Registry for the node account implementation.
pub struct Registry;

impl scheduler_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "node";
	type Factory = crate::AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl crate::AccountRegistry for Registry {}
