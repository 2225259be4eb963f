//! Fixed-interval polling with cancellation.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default wait between poll attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// How a poll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
	/// An attempt returned true.
	Satisfied { attempts: u32 },
	/// The cancellation token fired before an attempt returned true.
	Cancelled { attempts: u32 },
	/// The attempt limit was reached.
	Exhausted { attempts: u32 },
}

impl PollOutcome {
	pub fn is_satisfied(&self) -> bool {
		matches!(self, PollOutcome::Satisfied { .. })
	}

	pub fn attempts(&self) -> u32 {
		match *self {
			PollOutcome::Satisfied { attempts }
			| PollOutcome::Cancelled { attempts }
			| PollOutcome::Exhausted { attempts } => attempts,
		}
	}
}

/// Repeats an async check at a fixed interval until it returns true
#[derive(Debug, Clone)]
pub struct Poller {
	interval: Duration,
	max_attempts: Option<u32>,
}

impl Default for Poller {
	fn default() -> Self {
		Self {
			interval: DEFAULT_POLL_INTERVAL,
			max_attempts: None,
		}
	}
}

impl Poller {
	pub fn new(interval: Duration) -> Self {
		Self {
			interval,
			max_attempts: None,
		}
	}

	/// Give up after `max_attempts` unsuccessful attempts.
	pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
		self.max_attempts = Some(max_attempts);
		self
	}

	pub fn interval(&self) -> Duration {
		self.interval
	}

	/// Run `attempt` until it returns true, `cancel` fires, or the attempt limit is hit.
	///
	/// Cancellation is checked before each attempt and while waiting between attempts. An
	/// attempt that has started always runs to completion.
	pub async fn poll_until<F, Fut>(&self, cancel: &CancellationToken, mut attempt: F) -> PollOutcome
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = bool>,
	{
		let mut attempts = 0u32;
		loop {
			if cancel.is_cancelled() {
				return PollOutcome::Cancelled { attempts };
			}

			attempts += 1;
			if attempt().await {
				return PollOutcome::Satisfied { attempts };
			}
			if self.max_attempts.is_some_and(|max| attempts >= max) {
				return PollOutcome::Exhausted { attempts };
			}

			debug!(
				"Poll attempt {} not satisfied, retrying in {:?}",
				attempts, self.interval
			);
			tokio::select! {
				_ = cancel.cancelled() => return PollOutcome::Cancelled { attempts },
				_ = tokio::time::sleep(self.interval) => {}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};

	#[tokio::test(start_paused = true)]
	async fn stops_on_first_true() {
		let calls = AtomicU32::new(0);
		let outcome = Poller::default()
			.poll_until(&CancellationToken::new(), || async {
				calls.fetch_add(1, Ordering::SeqCst) + 1 >= 3
			})
			.await;

		assert_eq!(outcome, PollOutcome::Satisfied { attempts: 3 });
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn waits_the_interval_between_attempts() {
		let started = tokio::time::Instant::now();
		let calls = AtomicU32::new(0);
		Poller::new(Duration::from_millis(250))
			.poll_until(&CancellationToken::new(), || async {
				calls.fetch_add(1, Ordering::SeqCst) + 1 >= 4
			})
			.await;

		let elapsed = started.elapsed();
		assert!(elapsed >= Duration::from_millis(750));
		assert!(elapsed < Duration::from_millis(1000));
	}

	#[tokio::test(start_paused = true)]
	async fn cancelled_token_stops_before_first_attempt() {
		let cancel = CancellationToken::new();
		cancel.cancel();

		let outcome = Poller::default().poll_until(&cancel, || async { true }).await;

		assert_eq!(outcome, PollOutcome::Cancelled { attempts: 0 });
	}

	#[tokio::test(start_paused = true)]
	async fn cancellation_interrupts_the_wait() {
		let cancel = CancellationToken::new();
		let trigger = cancel.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(2500)).await;
			trigger.cancel();
		});

		let outcome = Poller::default().poll_until(&cancel, || async { false }).await;

		assert_eq!(outcome, PollOutcome::Cancelled { attempts: 3 });
	}

	#[tokio::test(start_paused = true)]
	async fn attempt_limit_is_honoured() {
		let outcome = Poller::default()
			.with_max_attempts(2)
			.poll_until(&CancellationToken::new(), || async { false })
			.await;

		assert_eq!(outcome, PollOutcome::Exhausted { attempts: 2 });
		assert_eq!(outcome.attempts(), 2);
		assert!(!outcome.is_satisfied());
	}
}
