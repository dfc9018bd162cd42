//! Condition and transaction validation engine.
//!
//! The models in this crate are plain state machines owned by a single
//! caller. They validate user input, derive the canonical release condition
//! and transaction, and talk to the outside world only through the signer
//! and scheduling seams.

use thiserror::Error;

pub mod condition;
pub mod draft;
pub mod session;

pub use condition::{calendar_time, describe, Clock, ConditionError, ConditionMode, ConditionModel};
pub use draft::{AccountOption, DraftError, DraftField, GasPriceOption, TransactionDraft};
pub use session::SchedulerSession;

/// Errors surfaced by a scheduling session.
#[derive(Debug, Error)]
pub enum CoreError {
	/// The raw transaction is not valid hex.
	#[error("Invalid payload: {0}")]
	InvalidPayload(String),
	/// Composing requires a configured signer.
	#[error("No signer configured")]
	NoSigner,
	#[error(transparent)]
	Draft(#[from] DraftError),
	#[error(transparent)]
	Condition(#[from] ConditionError),
}
