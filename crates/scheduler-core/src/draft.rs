//! Transaction composition.
//!
//! [`TransactionDraft`] holds the fields a user types when composing a
//! transaction, validates them as they change, and produces the canonical
//! JSON handed to the external signer. Wallet state (accounts and gas
//! price) is folded in as it is polled.

use scheduler_account::SignerInterface;
use scheduler_types::{
	account_label, classify_address, is_valid_data, to_checksum_address, Address, AddressCheck,
	AddressWarning, CanonicalTransaction, EtherUnit, JsonRpcRequest, PayloadError, Quantity,
	SignedTransaction, SIGN_METHOD, U256,
};
use thiserror::Error;

/// Gas limit text a new draft starts with.
pub const DEFAULT_GAS_LIMIT: &str = "21k";

/// Number of gas price options offered before the wallet reports a price.
const FALLBACK_GAS_PRICE_OPTIONS: u64 = 40;

/// Upper bound on generated gas price options. Larger ranges are covered
/// in even gwei steps.
pub const MAX_GAS_PRICE_OPTIONS: u64 = 1000;

/// Errors that block signing a draft.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
	#[error("Sender is required")]
	MissingSender,
	#[error("Invalid sender: {0}")]
	InvalidSender(String),
	#[error("Invalid recipient: {0}")]
	InvalidRecipient(String),
	#[error("Invalid data: {0}")]
	InvalidData(String),
	#[error("Signing failed: {0}")]
	SigningFailed(String),
}

/// Editable draft fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
	Sender,
	Recipient,
	Value,
	GasLimit,
	GasPrice,
	Data,
}

/// A wallet account offered as sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountOption {
	/// Checksummed address.
	pub address: String,
	/// Abbreviated form for display.
	pub label: String,
}

/// A selectable gas price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPriceOption {
	/// Price in wei.
	pub value: U256,
	pub text: String,
}

impl GasPriceOption {
	fn gwei(n: U256) -> Self {
		Self {
			value: n.saturating_mul(EtherUnit::Gwei.multiplier()),
			text: format!("{} gwei", n),
		}
	}
}

/// Gwei options from 1 up to `max`, at most [`MAX_GAS_PRICE_OPTIONS`] of them.
fn gwei_options(max: U256) -> Vec<GasPriceOption> {
	let max = max.max(U256::from(1u64));
	let cap = U256::from(MAX_GAS_PRICE_OPTIONS);
	let step = if max <= cap {
		U256::from(1u64)
	} else {
		(max - U256::from(1u64)) / cap + U256::from(1u64)
	};
	let count = u64::try_from((max - U256::from(1u64)) / step + U256::from(1u64))
		.unwrap_or(MAX_GAS_PRICE_OPTIONS)
		.min(MAX_GAS_PRICE_OPTIONS);

	(1..=count)
		.map(|i| GasPriceOption::gwei(step.saturating_mul(U256::from(i)).min(max)))
		.collect()
}

/// A transaction being composed.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
	sender: AddressCheck,
	recipient: AddressCheck,
	value: Quantity,
	gas_limit: Quantity,
	gas_price: Quantity,
	data: String,
	accounts: Vec<AccountOption>,
	gas_price_options: Vec<GasPriceOption>,
}

impl Default for TransactionDraft {
	fn default() -> Self {
		Self::new()
	}
}

impl TransactionDraft {
	pub fn new() -> Self {
		Self {
			sender: classify_address(""),
			recipient: classify_address(""),
			value: Quantity::parse(""),
			gas_limit: Quantity::parse(DEFAULT_GAS_LIMIT),
			gas_price: Quantity::parse("0"),
			data: String::new(),
			accounts: Vec::new(),
			gas_price_options: gwei_options(U256::from(FALLBACK_GAS_PRICE_OPTIONS)),
		}
	}

	/// Updates a field from user text and returns the hint to show next to
	/// it, if any.
	pub fn set_field(&mut self, field: DraftField, text: &str) -> Option<String> {
		match field {
			DraftField::Sender => {
				self.sender = classify_address(text);
				self.sender.warning.map(|w| w.to_string())
			},
			DraftField::Recipient => {
				self.recipient = classify_address(text);
				self.recipient.warning.map(|w| w.to_string())
			},
			DraftField::Value => {
				self.value = Quantity::parse(text);
				quantity_hint(&self.value)
			},
			DraftField::GasLimit => {
				self.gas_limit = Quantity::parse(text);
				quantity_hint(&self.gas_limit)
			},
			DraftField::GasPrice => {
				self.choose_gas_price(text);
				quantity_hint(&self.gas_price)
			},
			DraftField::Data => {
				self.data = text.to_string();
				self.data_error().map(|e| e.to_string())
			},
		}
	}

	pub fn sender(&self) -> &AddressCheck {
		&self.sender
	}

	pub fn recipient(&self) -> &AddressCheck {
		&self.recipient
	}

	pub fn value(&self) -> &Quantity {
		&self.value
	}

	pub fn gas_limit(&self) -> &Quantity {
		&self.gas_limit
	}

	pub fn gas_price(&self) -> &Quantity {
		&self.gas_price
	}

	pub fn data(&self) -> &str {
		&self.data
	}

	pub fn data_error(&self) -> Option<PayloadError> {
		if is_valid_data(&self.data) {
			None
		} else {
			Some(PayloadError::InvalidData(self.data.clone()))
		}
	}

	pub fn accounts(&self) -> &[AccountOption] {
		&self.accounts
	}

	pub fn gas_price_options(&self) -> &[GasPriceOption] {
		&self.gas_price_options
	}

	/// Replaces the account options with the wallet's accounts and selects
	/// the first one as sender (or clears the sender when there are none).
	pub fn apply_accounts(&mut self, accounts: &[Address]) {
		self.accounts = accounts
			.iter()
			.map(|account| {
				let address = to_checksum_address(&hex::encode(account));
				AccountOption {
					label: account_label(&address),
					address,
				}
			})
			.collect();

		let first = self
			.accounts
			.first()
			.map(|option| option.address.clone())
			.unwrap_or_default();
		self.sender = classify_address(&first);
	}

	/// Rebuilds the gas price options around the network price: gwei steps
	/// up to twice the current price, always including the network price
	/// itself. The middle option is selected unless a price was already
	/// chosen.
	pub fn apply_gas_price(&mut self, price: U256) {
		let multiplier = EtherUnit::Gwei.multiplier();
		let gwei = price / multiplier;
		let max = gwei
			.saturating_mul(U256::from(2u64))
			.min(U256::MAX / multiplier);
		self.gas_price_options = gwei_options(max);

		if !gwei.is_zero() {
			let network = GasPriceOption::gwei(gwei);
			if let Err(position) = self
				.gas_price_options
				.binary_search_by(|option| option.value.cmp(&network.value))
			{
				self.gas_price_options.insert(position, network);
			}
		}

		if self.gas_price.is_zero() {
			let middle = &self.gas_price_options[self.gas_price_options.len() / 2];
			self.gas_price = Quantity::from_value(middle.value);
		}
	}

	/// Selects a typed gas price, adding it as an option if it is new.
	pub fn choose_gas_price(&mut self, text: &str) {
		let price = Quantity::parse(text);
		if !self
			.gas_price_options
			.iter()
			.any(|option| option.value == price.value())
		{
			self.gas_price_options.push(GasPriceOption {
				value: price.value(),
				text: text.to_string(),
			});
		}
		self.gas_price = price;
	}

	/// The draft as the signer expects it.
	pub fn to_canonical(&self) -> CanonicalTransaction {
		CanonicalTransaction {
			from: self.sender.value.clone(),
			to: Some(self.recipient.value.clone()).filter(|to| !to.is_empty()),
			value: self.value.value(),
			gas_price: self.gas_price.value(),
			gas: self.gas_limit.value(),
			data: Some(self.data.clone()).filter(|data| !data.is_empty()),
		}
	}

	/// Checks the fields that block signing. Checksum and contract creation
	/// warnings are shown but do not block.
	pub fn validate(&self) -> Result<(), DraftError> {
		match self.sender.warning {
			_ if self.sender.is_empty() => return Err(DraftError::MissingSender),
			Some(AddressWarning::Malformed) => {
				return Err(DraftError::InvalidSender(self.sender.value.clone()))
			},
			_ => {},
		}

		if matches!(self.recipient.warning, Some(warning) if warning.is_blocking()) {
			return Err(DraftError::InvalidRecipient(self.recipient.value.clone()));
		}

		if let Some(error) = self.data_error() {
			return Err(DraftError::InvalidData(error.to_string()));
		}

		Ok(())
	}

	/// Validates the draft and asks the signer for the raw transaction.
	pub async fn submit(
		&self,
		signer: &dyn SignerInterface,
	) -> Result<SignedTransaction, DraftError> {
		self.validate()?;

		let tx = self.to_canonical();
		tracing::info!(from = %tx.from, to = ?tx.to, "Submitting draft for signing");

		signer
			.sign_transaction(&tx)
			.await
			.map_err(|e| DraftError::SigningFailed(e.to_string()))
	}

	/// The `eth_signTransaction` request for signing the draft manually.
	pub fn sign_request(&self) -> JsonRpcRequest<(CanonicalTransaction,)> {
		JsonRpcRequest::new(1, SIGN_METHOD, (self.to_canonical(),))
	}

	/// A curl command sending [`Self::sign_request`] to a node.
	pub fn curl_command(&self, node_url: &str) -> Result<String, serde_json::Error> {
		let body = serde_json::to_string(&self.sign_request())?;
		Ok(format!(
			"curl {} -X POST -HContent-Type:application/json --data '{}'",
			node_url, body
		))
	}
}

fn quantity_hint(quantity: &Quantity) -> Option<String> {
	if quantity.is_valid() || quantity.text().trim().is_empty() {
		None
	} else {
		Some(format!("Unable to parse '{}', using 0", quantity.text()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use mockall::mock;
	use scheduler_account::AccountError;
	use serde_json::json;

	mock! {
		pub Signer {}

		#[async_trait]
		impl SignerInterface for Signer {
			async fn sign_transaction(
				&self,
				tx: &CanonicalTransaction,
			) -> Result<SignedTransaction, AccountError>;
		}
	}

	const SENDER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
	const RECIPIENT: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

	fn signed(raw: &str) -> SignedTransaction {
		SignedTransaction {
			raw: raw.parse().unwrap(),
			tx: None,
		}
	}

	#[test]
	fn test_defaults() {
		let draft = TransactionDraft::new();
		assert_eq!(draft.gas_limit().value(), U256::from(21_000u64));
		assert!(draft.gas_price().is_zero());
		assert_eq!(draft.gas_price_options().len(), 40);
		assert_eq!(draft.gas_price_options()[0].text, "1 gwei");
		assert_eq!(draft.validate(), Err(DraftError::MissingSender));
	}

	#[test]
	fn test_canonical_json() {
		let mut draft = TransactionDraft::new();
		draft.set_field(DraftField::Sender, SENDER);
		draft.set_field(DraftField::Value, "1 ether");
		draft.set_field(DraftField::GasPrice, "3 gwei");

		assert_eq!(
			serde_json::to_value(draft.to_canonical()).unwrap(),
			json!({
				"from": SENDER,
				"to": null,
				"value": "0xde0b6b3a7640000",
				"gasPrice": "0xb2d05e00",
				"gas": "0x5208",
				"data": null
			})
		);

		draft.set_field(DraftField::Recipient, RECIPIENT);
		draft.set_field(DraftField::Data, "0xabcd");
		let tx = draft.to_canonical();
		assert_eq!(tx.to.as_deref(), Some(RECIPIENT));
		assert_eq!(tx.data.as_deref(), Some("0xabcd"));
	}

	#[test]
	fn test_field_hints() {
		let mut draft = TransactionDraft::new();
		assert_eq!(
			draft.set_field(DraftField::Recipient, "").as_deref(),
			Some("You didn't specify recipient - this will create a contract")
		);
		assert_eq!(
			draft.set_field(DraftField::Recipient, "0xAB").as_deref(),
			Some("This does not look like Ethereum address.")
		);
		assert_eq!(draft.set_field(DraftField::Recipient, RECIPIENT), None);
		assert_eq!(
			draft.set_field(DraftField::Value, "lots").as_deref(),
			Some("Unable to parse 'lots', using 0")
		);
		assert_eq!(draft.set_field(DraftField::Value, ""), None);
		assert!(draft.set_field(DraftField::Data, "0xabc").is_some());
	}

	#[test]
	fn test_validation_rules() {
		let mut draft = TransactionDraft::new();
		draft.set_field(DraftField::Sender, "0x1234");
		assert_eq!(
			draft.validate(),
			Err(DraftError::InvalidSender("0x1234".to_string()))
		);

		draft.set_field(DraftField::Sender, SENDER);
		assert_eq!(draft.validate(), Ok(()));

		// a wrong checksum is shown but does not block
		draft.set_field(DraftField::Recipient, "0xFB6916095ca1df60bB79Ce92cE3Ea74c37c5d359");
		assert_eq!(draft.recipient().warning, Some(AddressWarning::BadChecksum));
		assert_eq!(draft.validate(), Ok(()));

		draft.set_field(DraftField::Recipient, "not-an-address");
		assert!(matches!(draft.validate(), Err(DraftError::InvalidRecipient(_))));

		draft.set_field(DraftField::Recipient, "");
		draft.set_field(DraftField::Data, "0xzz");
		assert!(matches!(draft.validate(), Err(DraftError::InvalidData(_))));
	}

	#[test]
	fn test_apply_accounts_selects_first() {
		let mut draft = TransactionDraft::new();
		let first: Address = SENDER.parse().unwrap();
		let second: Address = RECIPIENT.parse().unwrap();

		draft.apply_accounts(&[first, second]);
		assert_eq!(draft.accounts().len(), 2);
		assert_eq!(draft.accounts()[0].address, SENDER);
		assert_eq!(draft.accounts()[0].label, "0x5aAeb6053F...E7Ef1BeAed");
		assert_eq!(draft.sender().value, SENDER);
		assert!(draft.sender().is_ok());

		draft.apply_accounts(&[]);
		assert!(draft.sender().is_empty());
	}

	#[test]
	fn test_apply_gas_price_selects_middle_option() {
		let mut draft = TransactionDraft::new();
		draft.apply_gas_price(U256::from(20_000_000_000u64));

		let options = draft.gas_price_options();
		assert_eq!(options.len(), 40);
		assert_eq!(options[39].text, "40 gwei");
		assert_eq!(draft.gas_price().value(), U256::from(21_000_000_000u64));

		// an explicit choice survives later price updates
		draft.set_field(DraftField::GasPrice, "5 gwei");
		draft.apply_gas_price(U256::from(2_000_000_000u64));
		assert_eq!(draft.gas_price_options().len(), 4);
		assert_eq!(draft.gas_price().value(), U256::from(5_000_000_000u64));
	}

	#[test]
	fn test_apply_gas_price_below_one_gwei() {
		let mut draft = TransactionDraft::new();
		draft.apply_gas_price(U256::from(100u64));
		assert_eq!(draft.gas_price_options().len(), 1);
		assert_eq!(draft.gas_price().value(), U256::from(1_000_000_000u64));
	}

	#[test]
	fn test_apply_gas_price_bounds_option_count() {
		let gwei = EtherUnit::Gwei.multiplier();
		let one_ether = U256::from(10u64).pow(U256::from(18u64));

		let mut draft = TransactionDraft::new();
		draft.apply_gas_price(one_ether);
		let options = draft.gas_price_options();
		assert_eq!(options.len(), MAX_GAS_PRICE_OPTIONS as usize);
		assert_eq!(options[0].value, U256::from(2_000_000u64) * gwei);
		assert_eq!(
			options.last().map(|o| o.value),
			Some(U256::from(2_000_000_000u64) * gwei)
		);
		assert!(options.iter().any(|o| o.value == one_ether));
		assert!(options.iter().any(|o| o.value == draft.gas_price().value()));

		let mut draft = TransactionDraft::new();
		draft.apply_gas_price(U256::MAX);
		let options = draft.gas_price_options();
		assert!(options.len() <= MAX_GAS_PRICE_OPTIONS as usize + 1);
		assert!(options.windows(2).all(|pair| pair[0].value < pair[1].value));
		let network = (U256::MAX / gwei) * gwei;
		assert!(options.iter().any(|o| o.value == network));
		assert!(!draft.gas_price().is_zero());
	}

	#[test]
	fn test_choose_gas_price_adds_custom_option() {
		let mut draft = TransactionDraft::new();
		draft.choose_gas_price("2.5 gwei");
		assert_eq!(draft.gas_price_options().len(), 41);
		assert_eq!(draft.gas_price_options()[40].text, "2.5 gwei");

		draft.choose_gas_price("3 gwei");
		assert_eq!(draft.gas_price_options().len(), 41);
		assert_eq!(draft.gas_price().value(), U256::from(3_000_000_000u64));
	}

	#[test]
	fn test_sign_request_and_curl() {
		let mut draft = TransactionDraft::new();
		draft.set_field(DraftField::Sender, SENDER);

		let request = serde_json::to_value(draft.sign_request()).unwrap();
		assert_eq!(request["method"], "eth_signTransaction");
		assert_eq!(request["params"][0]["from"], SENDER);
		assert_eq!(request["params"][0]["gas"], "0x5208");

		let curl = draft.curl_command("localhost:8545").unwrap();
		assert!(curl.starts_with(
			"curl localhost:8545 -X POST -HContent-Type:application/json --data '{\"jsonrpc\":\"2.0\""
		));
		assert!(curl.ends_with("'"));
	}

	#[tokio::test]
	async fn test_submit_delegates_to_signer() {
		let mut draft = TransactionDraft::new();
		draft.set_field(DraftField::Sender, SENDER);

		let mut signer = MockSigner::new();
		signer
			.expect_sign_transaction()
			.withf(|tx| tx.from == SENDER && tx.gas == U256::from(21_000u64))
			.times(1)
			.returning(|_| Ok(signed("0xf86c")));

		let result = draft.submit(&signer).await.unwrap();
		assert_eq!(result.raw.as_str(), "0xf86c");
	}

	#[tokio::test]
	async fn test_submit_reports_signer_failure() {
		let mut draft = TransactionDraft::new();
		draft.set_field(DraftField::Sender, SENDER);

		let mut signer = MockSigner::new();
		signer
			.expect_sign_transaction()
			.returning(|_| Err(AccountError::SigningFailed("user rejected".to_string())));

		assert_eq!(
			draft.submit(&signer).await,
			Err(DraftError::SigningFailed(
				"Signing failed: user rejected".to_string()
			))
		);
	}

	#[tokio::test]
	async fn test_submit_validates_first() {
		let draft = TransactionDraft::new();
		let mut signer = MockSigner::new();
		signer.expect_sign_transaction().times(0);

		assert_eq!(draft.submit(&signer).await, Err(DraftError::MissingSender));
	}
}
