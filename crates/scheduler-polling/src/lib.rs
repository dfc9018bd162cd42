//! Change-detecting periodic polling.
//!
//! A [`Poller`] calls an async source once immediately and then on every
//! interval tick. Each successful result is serialized to JSON and compared
//! with the previous snapshot; the change callback only fires when the
//! snapshot differs. Polling stops when the returned [`PollHandle`] is
//! cancelled or dropped, and no callback starts after cancellation even if a
//! poll that was already in flight resolves later.

use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub mod wallet;

pub use wallet::{PollIntervals, WalletTracker, WalletUpdate};

/// Errors produced by a poll source.
#[derive(Debug, Error)]
pub enum PollError {
	/// The polled source failed; the previous snapshot is kept.
	#[error("Poll source failed: {0}")]
	Source(String),
	/// The polled value could not be serialized for comparison.
	#[error("Serialization error: {0}")]
	Serialization(String),
}

/// Order in which resolved polls are delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryOrder {
	/// Deliver in the order polls resolve. A slow poll that resolves after
	/// a newer one can overwrite the newer value.
	#[default]
	Resolution,
	/// Drop results issued before the newest result already observed.
	Issue,
}

#[derive(Debug, Default)]
struct Snapshot {
	last: Option<String>,
	cancelled: bool,
	latest_seq: Option<u64>,
}

type SharedSnapshot = Arc<Mutex<Snapshot>>;

// A callback that panicked while holding the lock leaves the snapshot in a
// consistent state, so poisoning is ignored.
fn lock(snapshot: &SharedSnapshot) -> MutexGuard<'_, Snapshot> {
	snapshot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Periodic poller configuration.
#[derive(Debug, Clone)]
pub struct Poller {
	name: String,
	interval: Duration,
	order: DeliveryOrder,
}

impl Poller {
	pub fn new(interval: Duration) -> Self {
		Self {
			name: "poller".to_string(),
			interval,
			order: DeliveryOrder::default(),
		}
	}

	/// Name used in log records.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	pub fn with_order(mut self, order: DeliveryOrder) -> Self {
		self.order = order;
		self
	}

	pub fn interval(&self) -> Duration {
		self.interval
	}

	/// Starts polling on the current tokio runtime.
	///
	/// Every tick spawns its own poll task, so a slow source never delays
	/// the timer. `on_change` runs while the snapshot lock is held; it must
	/// not cancel its own handle.
	pub fn start<T, F, Fut, C>(&self, poll: F, on_change: C) -> PollHandle
	where
		T: Serialize + Send + 'static,
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<T, PollError>> + Send + 'static,
		C: Fn(T) + Send + Sync + 'static,
	{
		let snapshot: SharedSnapshot = Arc::new(Mutex::new(Snapshot::default()));
		let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

		let on_change = Arc::new(on_change);
		let task_snapshot = snapshot.clone();
		let name = self.name.clone();
		let period = self.interval;
		let order = self.order;

		tracing::debug!(poller = %name, interval_ms = period.as_millis() as u64, "Starting poller");

		let task = tokio::spawn(async move {
			let mut interval = tokio::time::interval(period);
			// Skip missed ticks instead of bursting
			interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
			let mut seq: u64 = 0;

			loop {
				tokio::select! {
					_ = interval.tick() => {
						seq += 1;
						let fut = poll();
						let snapshot = task_snapshot.clone();
						let on_change = on_change.clone();
						let name = name.clone();
						tokio::spawn(async move {
							let result = fut.await;
							deliver(&snapshot, &name, order, seq, result, on_change.as_ref());
						});
					}
					_ = stop_rx.recv() => {
						tracing::debug!(poller = %name, "Stopping poller");
						break;
					}
				}
			}
		});

		PollHandle {
			snapshot,
			stop_tx,
			task,
		}
	}
}

fn deliver<T, C>(
	snapshot: &SharedSnapshot,
	name: &str,
	order: DeliveryOrder,
	seq: u64,
	result: Result<T, PollError>,
	on_change: &C,
) where
	T: Serialize,
	C: Fn(T),
{
	let mut state = lock(snapshot);
	if state.cancelled {
		return;
	}

	let value = match result {
		Ok(value) => value,
		Err(e) => {
			tracing::warn!(poller = %name, error = %e, "Poll failed");
			return;
		},
	};

	if order == DeliveryOrder::Issue {
		if matches!(state.latest_seq, Some(latest) if seq < latest) {
			tracing::debug!(poller = %name, seq, "Dropping stale poll result");
			return;
		}
		state.latest_seq = Some(seq);
	}

	let serialized = match serde_json::to_string(&value) {
		Ok(serialized) => serialized,
		Err(e) => {
			let error = PollError::Serialization(e.to_string());
			tracing::warn!(poller = %name, error = %error, "Poll result not comparable");
			return;
		},
	};

	if state.last.as_deref() == Some(serialized.as_str()) {
		return;
	}

	tracing::debug!(poller = %name, seq, "Polled value changed");
	state.last = Some(serialized);
	on_change(value);
}

/// Owner of a running poller. Dropping the handle cancels it.
#[derive(Debug)]
pub struct PollHandle {
	snapshot: SharedSnapshot,
	stop_tx: mpsc::Sender<()>,
	task: JoinHandle<()>,
}

impl PollHandle {
	/// Stops the timer. Once this returns no further `on_change` call
	/// starts; a call already running completes first.
	pub fn cancel(&self) {
		lock(&self.snapshot).cancelled = true;
		let _ = self.stop_tx.try_send(());
	}

	pub fn is_cancelled(&self) -> bool {
		lock(&self.snapshot).cancelled
	}

	/// Whether the timer task has exited.
	pub fn is_finished(&self) -> bool {
		self.task.is_finished()
	}
}

impl Drop for PollHandle {
	fn drop(&mut self) {
		self.cancel();
	}
}
