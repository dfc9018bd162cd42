//! Subcommands of the `txsched` binary.

use clap::{Args, Subcommand};
use scheduler_account::{AccountService, SignerInterface, WalletInterface};
use scheduler_client::SchedulingService;
use scheduler_config::Config;
use scheduler_core::{
	ConditionError, ConditionMode, ConditionModel, DraftField, SchedulerSession, TransactionDraft,
};
use scheduler_polling::wallet::{PollIntervals, WalletTracker, WalletUpdate};
use scheduler_types::{current_timestamp, format_with_commas};
use std::error::Error;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Schedule an already signed raw transaction
	Schedule {
		/// Signed raw transaction (hex)
		#[arg(long)]
		raw: String,
		#[command(flatten)]
		condition: ConditionArgs,
	},
	/// Compose a transaction, sign it through the node and optionally schedule it
	Compose {
		#[command(flatten)]
		draft: DraftArgs,
		#[command(flatten)]
		condition: ConditionArgs,
		/// Schedule the signed transaction right away
		#[arg(long)]
		schedule: bool,
	},
	/// Print a curl command asking a node to sign the transaction
	SignRequest {
		#[command(flatten)]
		draft: DraftArgs,
		/// Node URL; defaults to the configured account rpc_url
		#[arg(long)]
		node_url: Option<String>,
	},
	/// Follow wallet accounts, gas price and chain head
	Watch,
}

/// Release condition flags. Without either flag the configured default
/// delay applies.
#[derive(Args, Debug, Default, Clone)]
#[group(multiple = false)]
pub struct ConditionArgs {
	/// Release at this block (decimal, hex, `12k` shorthand or commas)
	#[arg(long)]
	pub block: Option<String>,
	/// Release at this unix time in seconds
	#[arg(long)]
	pub time: Option<u64>,
}

impl ConditionArgs {
	pub fn apply(&self, model: &mut ConditionModel) -> Result<(), ConditionError> {
		if let Some(block) = &self.block {
			model.set_mode(ConditionMode::Block);
			model.edit_block(block)?;
		} else if let Some(time) = self.time {
			model.select_time(time)?;
		}
		Ok(())
	}
}

/// Transaction draft flags. Values use the quantity grammar (`21k`,
/// `3 gwei`, `0x5208`).
#[derive(Args, Debug, Default, Clone)]
pub struct DraftArgs {
	/// Sender address; defaults to the first wallet account
	#[arg(long)]
	pub from: Option<String>,
	/// Recipient address; omit to create a contract
	#[arg(long)]
	pub to: Option<String>,
	/// Value in wei or with a unit
	#[arg(long)]
	pub value: Option<String>,
	/// Gas limit
	#[arg(long)]
	pub gas: Option<String>,
	/// Gas price; defaults to the middle of the network-derived options
	#[arg(long)]
	pub gas_price: Option<String>,
	/// Call data (0x-prefixed hex)
	#[arg(long)]
	pub data: Option<String>,
}

impl DraftArgs {
	/// Writes the given flags into the draft and returns the hints raised.
	pub fn apply(&self, draft: &mut TransactionDraft) -> Vec<(DraftField, String)> {
		let fields = [
			(DraftField::Sender, &self.from),
			(DraftField::Recipient, &self.to),
			(DraftField::Value, &self.value),
			(DraftField::GasLimit, &self.gas),
			(DraftField::GasPrice, &self.gas_price),
			(DraftField::Data, &self.data),
		];

		fields
			.into_iter()
			.filter_map(|(field, text)| text.as_deref().map(|text| (field, text)))
			.filter_map(|(field, text)| draft.set_field(field, text).map(|hint| (field, hint)))
			.collect()
	}
}

/// Services built from the configuration.
pub struct Context {
	config: Config,
	account: Option<Arc<AccountService>>,
}

impl Context {
	pub fn new(config: Config) -> Result<Self, Box<dyn Error>> {
		let account = match &config.account {
			Some(account) => Some(Arc::new(AccountService::from_config(
				&account.primary,
				&account.implementations,
			)?)),
			None => None,
		};

		let context = Self { config, account };
		// Reject an invalid scheduler table before any command runs
		context.scheduler()?;
		Ok(context)
	}

	fn require_account(&self) -> Result<Arc<AccountService>, Box<dyn Error>> {
		self.account
			.clone()
			.ok_or_else(|| "This command needs an [account] section in the configuration".into())
	}

	fn scheduler(&self) -> Result<SchedulingService, Box<dyn Error>> {
		let table = self.config.scheduler.implementation_config()?;
		Ok(SchedulingService::from_config(
			&self.config.scheduler.implementation,
			&table,
		)?)
	}

	/// Current chain head, or zero when there is no wallet to ask.
	async fn chain_head(&self) -> u64 {
		let Some(account) = &self.account else {
			return 0;
		};
		match account.block_number().await {
			Ok(block) => block,
			Err(e) => {
				tracing::warn!(error = %e, "Failed to read chain head, block floor stays at 0");
				0
			},
		}
	}

	async fn session(&self) -> Result<SchedulerSession, Box<dyn Error>> {
		let condition = ConditionModel::with_clock(
			Arc::new(current_timestamp),
			self.chain_head().await,
			self.config.condition.default_delay(),
		);

		let session = SchedulerSession::new(condition, self.scheduler()?);
		Ok(match &self.account {
			Some(account) => session.with_signer(account.clone() as Arc<dyn SignerInterface>),
			None => session,
		})
	}

	/// Seeds the draft's account and gas price options from the wallet.
	async fn prime_draft(&self, session: &mut SchedulerSession) {
		let Some(account) = &self.account else {
			return;
		};

		match account.accounts().await {
			Ok(accounts) => session.apply_update(WalletUpdate::Accounts(accounts)),
			Err(e) => tracing::warn!(error = %e, "Failed to read wallet accounts"),
		}
		match account.gas_price().await {
			Ok(price) => session.apply_update(WalletUpdate::GasPrice(price)),
			Err(e) => tracing::warn!(error = %e, "Failed to read gas price"),
		}
	}

	fn intervals(&self) -> PollIntervals {
		let polling = &self.config.polling;
		PollIntervals {
			accounts: polling.accounts_interval(),
			gas_price: polling.gas_price_interval(),
			chain_head: polling.chain_head_interval(),
		}
	}
}

pub async fn run(context: &Context, command: Command) -> Result<(), Box<dyn Error>> {
	match command {
		Command::Schedule { raw, condition } => schedule(context, &raw, &condition).await,
		Command::Compose {
			draft,
			condition,
			schedule,
		} => compose(context, &draft, &condition, schedule).await,
		Command::SignRequest { draft, node_url } => {
			let command = sign_request(context, &draft, node_url.as_deref())?;
			println!("{}", command);
			Ok(())
		},
		Command::Watch => watch(context).await,
	}
}

fn apply_condition(
	session: &mut SchedulerSession,
	args: &ConditionArgs,
) -> Result<(), Box<dyn Error>> {
	if let Err(e) = args.apply(session.condition_mut()) {
		eprintln!("{}", e);
		return Err(e.into());
	}
	if let Some(summary) = session.condition().summary() {
		println!("{}", summary);
	}
	Ok(())
}

async fn submit(session: &SchedulerSession) -> Result<(), Box<dyn Error>> {
	let outcome = session.schedule().await?;
	println!("{}", outcome);
	if outcome.is_scheduled() {
		Ok(())
	} else {
		Err(outcome.to_string().into())
	}
}

pub async fn schedule(
	context: &Context,
	raw: &str,
	condition: &ConditionArgs,
) -> Result<(), Box<dyn Error>> {
	let mut session = context.session().await?;
	apply_condition(&mut session, condition)?;

	if !session.set_raw_transaction(raw) {
		if let Some(e) = session.raw_transaction_error() {
			return Err(e.into());
		}
	}

	submit(&session).await
}

pub async fn compose(
	context: &Context,
	draft: &DraftArgs,
	condition: &ConditionArgs,
	schedule: bool,
) -> Result<(), Box<dyn Error>> {
	context.require_account()?;
	let mut session = context.session().await?;
	context.prime_draft(&mut session).await;

	for (field, hint) in draft.apply(session.draft_mut()) {
		eprintln!("{:?}: {}", field, hint);
	}

	let signed = session.compose().await?;
	println!("{}", signed.raw);

	if schedule {
		apply_condition(&mut session, condition)?;
		submit(&session).await?;
	}
	Ok(())
}

pub fn sign_request(
	context: &Context,
	args: &DraftArgs,
	node_url: Option<&str>,
) -> Result<String, Box<dyn Error>> {
	let node_url = node_url
		.or_else(|| context.config.account.as_ref().and_then(|a| a.rpc_url()))
		.ok_or("No node URL given and no account rpc_url configured")?;

	let mut draft = TransactionDraft::new();
	for (field, hint) in args.apply(&mut draft) {
		eprintln!("{:?}: {}", field, hint);
	}
	draft.validate()?;

	Ok(draft.curl_command(node_url)?)
}

pub async fn watch(context: &Context) -> Result<(), Box<dyn Error>> {
	let account = context.require_account()?;
	let mut session = context.session().await?;
	session.condition_mut().set_mode(ConditionMode::Block);

	let (sender, mut updates) = mpsc::unbounded_channel();
	let tracker = WalletTracker::start(
		account as Arc<dyn WalletInterface>,
		context.intervals(),
		sender,
	);

	loop {
		tokio::select! {
			update = updates.recv() => {
				let Some(update) = update else {
					break;
				};
				println!("{}", describe_update(&update));
				session.apply_update(update);
			}
			_ = tokio::signal::ctrl_c() => {
				tracing::info!("Interrupted, stopping wallet tracking");
				break;
			}
		}
	}

	tracker.stop();
	Ok(())
}

fn describe_update(update: &WalletUpdate) -> String {
	match update {
		WalletUpdate::Accounts(accounts) if accounts.is_empty() => {
			"No accounts available".to_string()
		},
		WalletUpdate::Accounts(accounts) => format!(
			"Accounts: {}",
			accounts
				.iter()
				.map(|a| a.to_checksum(None))
				.collect::<Vec<_>>()
				.join(", ")
		),
		WalletUpdate::GasPrice(price) => format!("Gas price: {} wei", price),
		WalletUpdate::ChainHead(block) => {
			format!("Chain head: #{}", format_with_commas(&block.to_string()))
		},
	}
}
