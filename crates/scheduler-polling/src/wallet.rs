//! Live wallet state tracking.
//!
//! Runs one poller per piece of wallet state and forwards changes as
//! [`WalletUpdate`] events. The draft model consumes accounts and gas price;
//! the condition model consumes the chain head as its block floor.

use crate::{PollError, PollHandle, Poller};
use scheduler_account::WalletInterface;
use scheduler_types::{Address, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// A change in observed wallet state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletUpdate {
	Accounts(Vec<Address>),
	GasPrice(U256),
	ChainHead(u64),
}

/// Poll periods for each piece of wallet state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
	pub accounts: Duration,
	pub gas_price: Duration,
	pub chain_head: Duration,
}

impl Default for PollIntervals {
	fn default() -> Self {
		Self {
			accounts: Duration::from_millis(5000),
			gas_price: Duration::from_millis(2500),
			chain_head: Duration::from_millis(5000),
		}
	}
}

/// Owns the wallet pollers. Dropping the tracker stops all of them.
#[derive(Debug)]
pub struct WalletTracker {
	handles: Vec<PollHandle>,
}

impl WalletTracker {
	/// Starts polling `wallet` on the current tokio runtime.
	pub fn start(
		wallet: Arc<dyn WalletInterface>,
		intervals: PollIntervals,
		sender: mpsc::UnboundedSender<WalletUpdate>,
	) -> Self {
		let accounts = {
			let wallet = wallet.clone();
			let sender = sender.clone();
			Poller::new(intervals.accounts)
				.with_name("accounts")
				.start(
					move || {
						let wallet = wallet.clone();
						async move {
							wallet
								.accounts()
								.await
								.map_err(|e| PollError::Source(e.to_string()))
						}
					},
					move |accounts| {
						let _ = sender.send(WalletUpdate::Accounts(accounts));
					},
				)
		};

		let gas_price = {
			let wallet = wallet.clone();
			let sender = sender.clone();
			Poller::new(intervals.gas_price)
				.with_name("gas_price")
				.start(
					move || {
						let wallet = wallet.clone();
						async move {
							wallet
								.gas_price()
								.await
								.map_err(|e| PollError::Source(e.to_string()))
						}
					},
					move |price| {
						let _ = sender.send(WalletUpdate::GasPrice(price));
					},
				)
		};

		let chain_head = Poller::new(intervals.chain_head)
			.with_name("chain_head")
			.start(
				move || {
					let wallet = wallet.clone();
					async move {
						wallet
							.block_number()
							.await
							.map_err(|e| PollError::Source(e.to_string()))
					}
				},
				move |block| {
					let _ = sender.send(WalletUpdate::ChainHead(block));
				},
			);

		tracing::info!(
			accounts_ms = intervals.accounts.as_millis() as u64,
			gas_price_ms = intervals.gas_price.as_millis() as u64,
			chain_head_ms = intervals.chain_head.as_millis() as u64,
			"Started wallet tracking"
		);

		Self {
			handles: vec![accounts, gas_price, chain_head],
		}
	}

	/// Stops all pollers.
	pub fn stop(&self) {
		for handle in &self.handles {
			handle.cancel();
		}
	}
}
