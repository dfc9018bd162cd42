//! Command-line front-end for the transaction scheduler.
//!
//! Drives the condition and draft models from flags, signs through the
//! configured node and submits signed transactions to the remote scheduler.

use clap::Parser;
use scheduler_config::Config;
use std::path::PathBuf;

mod commands;

use commands::{Command, Context};

/// Command-line arguments for the scheduler client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config = Config::from_file(&args.config).await?;
	tracing::info!(
		endpoint = %config.scheduler.endpoint,
		account = ?config.account.as_ref().map(|a| a.primary.as_str()),
		"Loaded configuration"
	);

	let context = Context::new(config)?;
	commands::run(&context, args.command).await
}
