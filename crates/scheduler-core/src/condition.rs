//! Release condition editing.
//!
//! [`ConditionModel`] keeps the typed state for both release modes and the
//! canonical [`Condition`] derived from it. Accepted edits replace the
//! current condition with a fresh `Arc` and publish it on a watch channel;
//! rejected edits update what the user sees but leave the current condition
//! in effect.

use chrono::DateTime;
use scheduler_types::{current_timestamp, format_with_commas, Condition, Quantity};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// Default distance between now and the initial release time.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3 * 60 * 60);

/// Source of the current unix time in seconds.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Errors returned for edits that do not produce a condition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
	#[error("You need to select a future time.")]
	TimeNotInFuture { time: u64, now: u64 },
	#[error("Number needs to be greater than {}", with_commas(.floor))]
	BlockNotAboveFloor { block: u64, floor: u64 },
	#[error("Invalid input: {0}")]
	InvalidInput(String),
}

fn with_commas(value: &u64) -> String {
	format_with_commas(&value.to_string())
}

/// Which kind of condition is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionMode {
	Time,
	Block,
}

#[derive(Debug, Clone)]
struct TimeState {
	target: u64,
	echo: String,
	echo_error: bool,
	fine_tune: bool,
}

#[derive(Debug, Clone)]
struct BlockState {
	input: String,
	parsed: Option<u64>,
	floor: u64,
}

impl BlockState {
	fn is_valid(&self) -> bool {
		matches!(self.parsed, Some(block) if block > self.floor)
	}
}

/// Two-mode condition editor.
pub struct ConditionModel {
	clock: Clock,
	mode: ConditionMode,
	time: TimeState,
	block: BlockState,
	current: Arc<Condition>,
	sender: watch::Sender<Arc<Condition>>,
}

impl std::fmt::Debug for ConditionModel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConditionModel")
			.field("mode", &self.mode)
			.field("time", &self.time)
			.field("block", &self.block)
			.field("current", &self.current)
			.finish()
	}
}

impl ConditionModel {
	/// Creates a model on the system clock, releasing three hours from now.
	pub fn new(floor: u64) -> Self {
		Self::with_clock(Arc::new(current_timestamp), floor, DEFAULT_DELAY)
	}

	pub fn with_clock(clock: Clock, floor: u64, default_delay: Duration) -> Self {
		let target = clock().saturating_add(default_delay.as_secs());
		let current = Arc::new(Condition::time(target));
		let (sender, _) = watch::channel(current.clone());

		Self {
			clock,
			mode: ConditionMode::Time,
			time: TimeState {
				target,
				echo: target.to_string(),
				echo_error: false,
				fine_tune: false,
			},
			block: BlockState {
				input: String::new(),
				parsed: None,
				floor,
			},
			current,
			sender,
		}
	}

	fn now(&self) -> u64 {
		(self.clock)()
	}

	fn accept(&mut self, condition: Condition) -> Arc<Condition> {
		let condition = Arc::new(condition);
		tracing::debug!(condition = %condition, "Accepted condition");
		self.current = condition.clone();
		self.sender.send_replace(condition.clone());
		condition
	}

	/// Receiver of accepted conditions. Starts at the current condition.
	pub fn subscribe(&self) -> watch::Receiver<Arc<Condition>> {
		self.sender.subscribe()
	}

	pub fn current(&self) -> Arc<Condition> {
		self.current.clone()
	}

	pub fn mode(&self) -> ConditionMode {
		self.mode
	}

	/// Switches the edited mode. Each mode keeps its own values and the
	/// current condition is left alone.
	pub fn set_mode(&mut self, mode: ConditionMode) {
		self.mode = mode;
	}

	pub fn target_time(&self) -> u64 {
		self.time.target
	}

	pub fn time_echo(&self) -> &str {
		&self.time.echo
	}

	pub fn time_echo_error(&self) -> bool {
		self.time.echo_error
	}

	pub fn fine_tune(&self) -> bool {
		self.time.fine_tune
	}

	pub fn block_input(&self) -> &str {
		&self.block.input
	}

	pub fn parsed_block(&self) -> Option<u64> {
		self.block.parsed
	}

	pub fn floor(&self) -> u64 {
		self.block.floor
	}

	/// Selects a release time. The display follows the selection even when
	/// it is rejected.
	pub fn select_time(&mut self, unix_seconds: u64) -> Result<Arc<Condition>, ConditionError> {
		self.time.target = unix_seconds;
		self.time.echo = unix_seconds.to_string();
		self.time.echo_error = false;

		let now = self.now();
		if unix_seconds <= now {
			return Err(ConditionError::TimeNotInFuture {
				time: unix_seconds,
				now,
			});
		}
		Ok(self.accept(Condition::time(unix_seconds)))
	}

	/// Edits the raw seconds field without committing it.
	pub fn edit_time_echo(&mut self, text: &str) {
		let now = self.now();
		self.time.echo = text.to_string();
		self.time.echo_error = !matches!(text.trim().parse::<u64>(), Ok(seconds) if seconds > now);
	}

	/// Commits the raw seconds field as the selected time.
	pub fn commit_time_echo(&mut self) -> Result<Arc<Condition>, ConditionError> {
		let seconds = self
			.time
			.echo
			.trim()
			.parse::<u64>()
			.map_err(|_| ConditionError::InvalidInput(self.time.echo.clone()))?;
		self.select_time(seconds)
	}

	/// Shows or hides the raw seconds field; returns the new state.
	pub fn toggle_fine_tune(&mut self) -> bool {
		self.time.fine_tune = !self.time.fine_tune;
		self.time.fine_tune
	}

	/// Edits the block number. Accepts hex (`0x96`), shorthand (`12k`) and
	/// thousands separators (`1,200,000`).
	pub fn edit_block(&mut self, text: &str) -> Result<Arc<Condition>, ConditionError> {
		self.block.input = text.to_string();
		self.block.parsed = parse_block(text);

		match self.block.parsed {
			None => Err(ConditionError::InvalidInput(text.to_string())),
			Some(block) if block <= self.block.floor => Err(ConditionError::BlockNotAboveFloor {
				block,
				floor: self.block.floor,
			}),
			Some(block) => Ok(self.accept(Condition::block(block))),
		}
	}

	/// Updates the lowest block a condition must exceed. Does not emit.
	pub fn set_floor(&mut self, floor: u64) {
		if floor != self.block.floor {
			tracing::debug!(floor, "Updated block floor");
		}
		self.block.floor = floor;
	}

	/// Adopts a condition supplied from outside, e.g. a loaded draft.
	///
	/// Returns `false` when it is the condition already in effect. Otherwise
	/// switches to its mode, re-seeds that mode's state and records it as
	/// current without publishing it.
	pub fn apply_external(&mut self, condition: Arc<Condition>) -> bool {
		if Arc::ptr_eq(&condition, &self.current) {
			return false;
		}

		match *condition {
			Condition::Time(time) => {
				self.mode = ConditionMode::Time;
				self.time.target = time.unix_seconds;
				self.time.echo = time.unix_seconds.to_string();
				self.time.echo_error = false;
			},
			Condition::Block(block) => {
				self.mode = ConditionMode::Block;
				self.block.input = format!("0x{:x}", block.block_number);
				self.block.parsed = Some(block.block_number);
			},
		}

		self.current = condition.clone();
		self.sender.send_if_modified(|value| {
			*value = condition;
			false
		});
		true
	}

	/// Hint for the active mode, if its input is not acceptable.
	pub fn validation_hint(&self) -> Option<String> {
		match self.mode {
			ConditionMode::Time if self.time.target <= self.now() => Some(
				ConditionError::TimeNotInFuture {
					time: self.time.target,
					now: self.now(),
				}
				.to_string(),
			),
			ConditionMode::Block if !self.block.is_valid() => Some(
				ConditionError::BlockNotAboveFloor {
					block: self.block.parsed.unwrap_or_default(),
					floor: self.block.floor,
				}
				.to_string(),
			),
			_ => None,
		}
	}

	/// Sentence describing when the transaction will be released, if the
	/// active mode holds a valid value.
	pub fn summary(&self) -> Option<String> {
		match self.mode {
			ConditionMode::Block => self.block.parsed.filter(|_| self.block.is_valid()).map(|block| {
				format!(
					"Your transaction will be propagated to the network at block #{}.",
					format_with_commas(&block.to_string())
				)
			}),
			ConditionMode::Time if self.time.target > self.now() => Some(format!(
				"Your transaction will be propagated to the network on {}.",
				calendar_time(self.time.target)
			)),
			ConditionMode::Time => None,
		}
	}
}

fn parse_block(text: &str) -> Option<u64> {
	let cleaned = text.trim().replace(',', "");
	let quantity = Quantity::parse(&cleaned);
	if !quantity.is_valid() {
		return None;
	}
	u64::try_from(quantity.value()).ok()
}

/// Renders a unix time as e.g. `Mon, Oct 16, 2026 3:00 PM UTC`.
pub fn calendar_time(unix_seconds: u64) -> String {
	i64::try_from(unix_seconds)
		.ok()
		.and_then(|seconds| DateTime::from_timestamp(seconds, 0))
		.map(|time| time.format("%a, %b %-d, %Y %-I:%M %p UTC").to_string())
		.unwrap_or_else(|| format!("unix time {}", unix_seconds))
}

/// Short description of a condition for listings.
pub fn describe(condition: &Condition) -> String {
	match condition {
		Condition::Time(time) => calendar_time(time.unix_seconds),
		Condition::Block(_) => condition.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU64, Ordering};

	const NOW: u64 = 1_700_000_000;

	fn fixed_model(floor: u64) -> (ConditionModel, Arc<AtomicU64>) {
		let now = Arc::new(AtomicU64::new(NOW));
		let clock_now = now.clone();
		let model = ConditionModel::with_clock(
			Arc::new(move || clock_now.load(Ordering::SeqCst)),
			floor,
			DEFAULT_DELAY,
		);
		(model, now)
	}

	#[test]
	fn test_initial_condition_is_three_hours_ahead() {
		let (model, _) = fixed_model(0);
		assert_eq!(model.mode(), ConditionMode::Time);
		assert_eq!(*model.current(), Condition::time(NOW + 10_800));
		assert_eq!(*model.subscribe().borrow(), model.current());
		assert_eq!(
			model.summary().as_deref(),
			Some("Your transaction will be propagated to the network on Wed, Nov 15, 2023 1:13 AM UTC.")
		);
	}

	#[test]
	fn test_future_time_emits() {
		let (mut model, _) = fixed_model(0);
		let mut rx = model.subscribe();

		let accepted = model.select_time(NOW + 60).unwrap();
		assert_eq!(*accepted, Condition::time(NOW + 60));
		assert!(rx.has_changed().unwrap());
		assert_eq!(**rx.borrow_and_update(), Condition::time(NOW + 60));
	}

	#[test]
	fn test_past_time_does_not_emit() {
		let (mut model, _) = fixed_model(0);
		let before = model.current();
		let rx = model.subscribe();

		let err = model.select_time(NOW - 1).unwrap_err();
		assert_eq!(err.to_string(), "You need to select a future time.");
		assert!(!rx.has_changed().unwrap());
		assert!(Arc::ptr_eq(&before, &model.current()));
		assert_eq!(model.target_time(), NOW - 1);
		assert_eq!(
			model.validation_hint().as_deref(),
			Some("You need to select a future time.")
		);
		assert_eq!(model.summary(), None);

		// the current instant is not in the future either
		assert!(model.select_time(NOW).is_err());
	}

	#[test]
	fn test_mode_toggle_preserves_time() {
		let (mut model, _) = fixed_model(100);
		model.select_time(NOW + 500).unwrap();
		let rx = model.subscribe();

		model.set_mode(ConditionMode::Block);
		model.set_mode(ConditionMode::Time);

		assert_eq!(model.target_time(), NOW + 500);
		assert_eq!(*model.current(), Condition::time(NOW + 500));
		assert!(!rx.has_changed().unwrap());
	}

	#[test]
	fn test_block_above_floor_emits() {
		let (mut model, _) = fixed_model(100);
		model.set_mode(ConditionMode::Block);

		let accepted = model.edit_block("150").unwrap();
		assert_eq!(*accepted, Condition::block(150));
		assert_eq!(
			serde_json::to_value(&*accepted).unwrap(),
			serde_json::json!({ "block": "0x96" })
		);
		assert_eq!(
			model.summary().as_deref(),
			Some("Your transaction will be propagated to the network at block #150.")
		);
		assert_eq!(model.validation_hint(), None);
	}

	#[test]
	fn test_block_at_or_below_floor_does_not_emit() {
		let (mut model, _) = fixed_model(1_000);
		model.set_mode(ConditionMode::Block);
		let rx = model.subscribe();

		assert_eq!(
			model.edit_block("50"),
			Err(ConditionError::BlockNotAboveFloor {
				block: 50,
				floor: 1_000
			})
		);
		assert!(model.edit_block("1000").is_err());
		assert!(!rx.has_changed().unwrap());
		assert_eq!(model.block_input(), "1000");
		assert_eq!(
			model.validation_hint().as_deref(),
			Some("Number needs to be greater than 1,000")
		);
		assert_eq!(model.summary(), None);
	}

	#[test]
	fn test_block_input_formats() {
		let (mut model, _) = fixed_model(0);
		model.set_mode(ConditionMode::Block);

		assert_eq!(*model.edit_block("0x96").unwrap(), Condition::block(150));
		assert_eq!(*model.edit_block("1,234,567").unwrap(), Condition::block(1_234_567));
		assert_eq!(*model.edit_block("12k").unwrap(), Condition::block(12_000));
		assert_eq!(
			model.edit_block("soon"),
			Err(ConditionError::InvalidInput("soon".to_string()))
		);
		assert_eq!(model.parsed_block(), None);
		assert_eq!(*model.current(), Condition::block(12_000));
	}

	#[test]
	fn test_floor_update_revalidates_without_emitting() {
		let (mut model, _) = fixed_model(100);
		model.set_mode(ConditionMode::Block);
		model.edit_block("150").unwrap();
		let rx = model.subscribe();

		model.set_floor(200);
		assert_eq!(model.floor(), 200);
		assert_eq!(
			model.validation_hint().as_deref(),
			Some("Number needs to be greater than 200")
		);
		assert!(!rx.has_changed().unwrap());
	}

	#[test]
	fn test_fine_tune_echo() {
		let (mut model, _) = fixed_model(0);
		assert!(model.toggle_fine_tune());

		model.edit_time_echo("abc");
		assert!(model.time_echo_error());
		assert_eq!(
			model.commit_time_echo(),
			Err(ConditionError::InvalidInput("abc".to_string()))
		);

		model.edit_time_echo(&(NOW - 10).to_string());
		assert!(model.time_echo_error());

		model.edit_time_echo(&(NOW + 90).to_string());
		assert!(!model.time_echo_error());
		assert_eq!(*model.commit_time_echo().unwrap(), Condition::time(NOW + 90));
		assert!(!model.toggle_fine_tune());
	}

	#[test]
	fn test_time_becomes_stale_as_clock_advances() {
		let (model, now) = fixed_model(0);
		assert_eq!(model.validation_hint(), None);

		now.store(NOW + 20_000, Ordering::SeqCst);
		assert_eq!(
			model.validation_hint().as_deref(),
			Some("You need to select a future time.")
		);
	}

	#[test]
	fn test_apply_external() {
		let (mut model, _) = fixed_model(100);
		let rx = model.subscribe();

		let current = model.current();
		assert!(!model.apply_external(current));

		let external = Arc::new(Condition::block(0x1f4));
		assert!(model.apply_external(external.clone()));
		assert_eq!(model.mode(), ConditionMode::Block);
		assert_eq!(model.block_input(), "0x1f4");
		assert_eq!(model.parsed_block(), Some(500));
		assert!(Arc::ptr_eq(&model.current(), &external));
		assert!(!rx.has_changed().unwrap());
		assert!(!model.apply_external(external));

		let external_time = Arc::new(Condition::time(NOW + 7));
		assert!(model.apply_external(external_time));
		assert_eq!(model.mode(), ConditionMode::Time);
		assert_eq!(model.time_echo(), (NOW + 7).to_string());
	}

	#[test]
	fn test_calendar_time() {
		assert_eq!(calendar_time(1_800_000_000), "Fri, Jan 15, 2027 8:00 AM UTC");
		assert_eq!(describe(&Condition::block(1_234)), "at block #1,234");
	}
}
