//! A scheduling session.
//!
//! Ties the condition model, the draft and the pasted raw transaction to a
//! scheduling service, and folds polled wallet state into the models.

use crate::condition::ConditionModel;
use crate::draft::TransactionDraft;
use crate::CoreError;
use scheduler_account::SignerInterface;
use scheduler_client::SchedulingService;
use scheduler_polling::WalletUpdate;
use scheduler_types::{is_valid_raw_tx, PayloadError, RawTransaction, ScheduleOutcome, SignedTransaction};
use std::sync::Arc;

pub struct SchedulerSession {
	condition: ConditionModel,
	draft: TransactionDraft,
	raw_input: String,
	scheduler: SchedulingService,
	signer: Option<Arc<dyn SignerInterface>>,
}

impl SchedulerSession {
	pub fn new(condition: ConditionModel, scheduler: SchedulingService) -> Self {
		Self {
			condition,
			draft: TransactionDraft::new(),
			raw_input: String::new(),
			scheduler,
			signer: None,
		}
	}

	/// Enables composing and signing through an external signer.
	pub fn with_signer(mut self, signer: Arc<dyn SignerInterface>) -> Self {
		self.signer = Some(signer);
		self
	}

	pub fn condition(&self) -> &ConditionModel {
		&self.condition
	}

	pub fn condition_mut(&mut self) -> &mut ConditionModel {
		&mut self.condition
	}

	pub fn draft(&self) -> &TransactionDraft {
		&self.draft
	}

	pub fn draft_mut(&mut self) -> &mut TransactionDraft {
		&mut self.draft
	}

	/// Folds one polled wallet change into the models.
	pub fn apply_update(&mut self, update: WalletUpdate) {
		match update {
			WalletUpdate::Accounts(accounts) => self.draft.apply_accounts(&accounts),
			WalletUpdate::GasPrice(price) => self.draft.apply_gas_price(price),
			WalletUpdate::ChainHead(block) => self.condition.set_floor(block),
		}
	}

	/// Sets the pasted raw transaction text; returns whether it is valid.
	pub fn set_raw_transaction(&mut self, text: &str) -> bool {
		self.raw_input = text.trim().to_string();
		is_valid_raw_tx(&self.raw_input)
	}

	pub fn raw_transaction(&self) -> &str {
		&self.raw_input
	}

	pub fn raw_transaction_error(&self) -> Option<PayloadError> {
		self.raw_input.parse::<RawTransaction>().err()
	}

	/// Signs the draft and adopts the signed bytes as the raw transaction.
	pub async fn compose(&mut self) -> Result<SignedTransaction, CoreError> {
		let signer = self.signer.clone().ok_or(CoreError::NoSigner)?;
		let signed = self.draft.submit(signer.as_ref()).await?;
		self.raw_input = signed.raw.to_string();
		Ok(signed)
	}

	/// Schedules the raw transaction under the current condition.
	///
	/// An invalid raw transaction is refused before anything is sent;
	/// scheduling failures are reported in the outcome.
	pub async fn schedule(&self) -> Result<ScheduleOutcome, CoreError> {
		let raw: RawTransaction = self
			.raw_input
			.parse()
			.map_err(|e: PayloadError| CoreError::InvalidPayload(e.to_string()))?;

		let condition = self.condition.current();
		Ok(self.scheduler.schedule(&condition, &raw).await)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::condition::{ConditionMode, DEFAULT_DELAY};
	use crate::draft::DraftField;
	use async_trait::async_trait;
	use scheduler_account::AccountError;
	use scheduler_client::implementations::http::HttpScheduler;
	use scheduler_types::{Address, CanonicalTransaction, Condition, U256};
	use std::time::Duration;

	const NOW: u64 = 1_700_000_000;
	const RAW: &str = "0xf86c808504a817c800825208";

	struct StaticSigner;

	#[async_trait]
	impl SignerInterface for StaticSigner {
		async fn sign_transaction(
			&self,
			_tx: &CanonicalTransaction,
		) -> Result<SignedTransaction, AccountError> {
			Ok(SignedTransaction {
				raw: RAW.parse().unwrap(),
				tx: None,
			})
		}
	}

	fn session(endpoint: &str, floor: u64) -> SchedulerSession {
		let condition = ConditionModel::with_clock(Arc::new(|| NOW), floor, DEFAULT_DELAY);
		let scheduler = SchedulingService::new(Box::new(
			HttpScheduler::new(endpoint, Duration::from_secs(5)).unwrap(),
		));
		SchedulerSession::new(condition, scheduler)
	}

	#[tokio::test]
	async fn test_schedule_block_condition_end_to_end() {
		let mut server = mockito::Server::new_async().await;
		let mock = server
			.mock("POST", "/rpc")
			.match_body(mockito::Matcher::Json(serde_json::json!({
				"jsonrpc": "2.0",
				"id": 1,
				"method": "scheduleTransaction",
				"params": [{ "block": "0x96" }, RAW]
			})))
			.with_status(200)
			.with_body(r#"{"jsonrpc":"2.0","id":1,"result":"sched-42"}"#)
			.create_async()
			.await;

		let mut session = session(&server.url(), 100);
		session.condition_mut().set_mode(ConditionMode::Block);
		session.condition_mut().edit_block("150").unwrap();
		assert!(session.set_raw_transaction(RAW));

		let outcome = session.schedule().await.unwrap();
		assert_eq!(
			outcome,
			ScheduleOutcome::Scheduled {
				id: "sched-42".to_string()
			}
		);
		mock.assert_async().await;
	}

	#[tokio::test]
	async fn test_invalid_raw_transaction_is_refused() {
		let mut server = mockito::Server::new_async().await;
		let mock = server
			.mock("POST", "/rpc")
			.expect(0)
			.create_async()
			.await;

		let mut session = session(&server.url(), 0);
		assert!(!session.set_raw_transaction("0xnot-hex"));
		assert!(session.raw_transaction_error().is_some());
		assert!(matches!(
			session.schedule().await,
			Err(CoreError::InvalidPayload(_))
		));
		mock.assert_async().await;
	}

	#[tokio::test]
	async fn test_compose_adopts_signed_bytes() {
		let mut session =
			session("http://localhost:8000", 0).with_signer(Arc::new(StaticSigner));
		session
			.draft_mut()
			.set_field(DraftField::Sender, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");

		let signed = session.compose().await.unwrap();
		assert_eq!(signed.raw.as_str(), RAW);
		assert_eq!(session.raw_transaction(), RAW);
		assert!(session.raw_transaction_error().is_none());
	}

	#[tokio::test]
	async fn test_compose_without_signer() {
		let mut session = session("http://localhost:8000", 0);
		assert!(matches!(session.compose().await, Err(CoreError::NoSigner)));
	}

	#[test]
	fn test_apply_wallet_updates() {
		let mut session = session("http://localhost:8000", 0);
		let account = Address::repeat_byte(0xab);

		session.apply_update(WalletUpdate::Accounts(vec![account]));
		session.apply_update(WalletUpdate::GasPrice(U256::from(4_000_000_000u64)));
		session.apply_update(WalletUpdate::ChainHead(1_000));

		assert_eq!(
			session.draft().sender().value,
			account.to_checksum(None)
		);
		assert_eq!(session.draft().gas_price_options().len(), 8);
		assert_eq!(session.condition().floor(), 1_000);
		assert_eq!(*session.condition().current(), Condition::time(NOW + 10_800));
	}
}
