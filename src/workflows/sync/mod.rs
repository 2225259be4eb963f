//! Node synchronization workflow.
//!
//! Polls node info until the node reports it is synced to chain. Every successful fetch
//! overwrites the node status in the store; while the node is behind, a progress estimate and
//! a persistent notice with the current block height are published, and once it is synced the
//! restoring flag is cleared. Navigation from the loading view to home is driven by observing
//! the store, not by the poll loop.

/// Heuristic sync progress from header timestamps
pub mod progress;

pub use progress::{SyncEstimate, SyncProgressEstimator};

use crate::node::NodeClient;
use crate::poll::{PollOutcome, Poller};
use crate::services::{Notification, Services, View};
use crate::store::{Store, StoreField};
use crate::workflows::ActionError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const SYNC_COMPLETE: &str = "Syncing complete";

pub struct SyncWorkflow {
	store: Store,
	node: Arc<dyn NodeClient>,
	services: Services,
	poller: Poller,
	progress: SyncProgressEstimator,
}

impl SyncWorkflow {
	pub fn new(store: Store, node: Arc<dyn NodeClient>, services: Services) -> Self {
		Self {
			store,
			node,
			services,
			poller: Poller::default(),
			progress: SyncProgressEstimator::new(),
		}
	}

	pub fn with_poller(mut self, poller: Poller) -> Self {
		self.poller = poller;
		self
	}

	/// Header timestamp progress is measured from, once the first fetch succeeded.
	pub fn sync_anchor(&self) -> Option<i64> {
		self.progress.anchor_timestamp()
	}

	/// Fetch node info and publish it to the store.
	///
	/// Returns whether the node is synced to chain. Nothing is written when the node call fails.
	pub async fn try_fetch_status(&self) -> Result<bool, ActionError> {
		let info = self.node.get_info().await?;
		let synced = info.synced_to_chain;
		let network = info.network();

		let estimate = if synced {
			// Anchor on the first success even when already synced
			self.progress.anchor(info.best_header_timestamp);
			None
		} else {
			Some(
				self.progress
					.estimate(info.best_header_timestamp, self.services.clock.now_timestamp()),
			)
		};

		self.store.write(|state| {
			state.node.pub_key = info.identity_pubkey;
			state.node.synced_to_chain = synced;
			state.node.block_height = info.block_height;
			state.node.network = network;
			if let Some(estimate) = estimate {
				state.node.percent_synced = estimate.percent;
			}
			if synced {
				state.settings.restoring = false;
			}
		});

		match estimate {
			Some(estimate) => {
				debug!(
					"Sync progress {:.4} (raw {:.4}) at block {}",
					estimate.percent, estimate.raw, info.block_height
				);
				self.services.notifier.display(Notification::waiting(format!(
					"Syncing to chain (block: {})",
					info.block_height
				)));
			}
			None => {
				self.services
					.notifier
					.display(Notification::success(SYNC_COMPLETE));
			}
		}

		Ok(synced)
	}

	/// Fetch node status, logging failures.
	///
	/// `Some(synced)` on success, `None` when the attempt failed.
	pub async fn fetch_status(&self) -> Option<bool> {
		match self.try_fetch_status().await {
			Ok(synced) => Some(synced),
			Err(err) => {
				error!("Getting node info failed: {}", err);
				None
			}
		}
	}

	/// Fetch status at the poll interval until the node is synced or `cancel` fires.
	///
	/// Failed attempts count as not synced yet.
	pub async fn poll_until_synced(&self, cancel: &CancellationToken) -> PollOutcome {
		info!(
			"Waiting for node to sync to chain, polling every {:?}",
			self.poller.interval()
		);
		let outcome = self
			.poller
			.poll_until(cancel, || async { self.fetch_status().await == Some(true) })
			.await;

		match outcome {
			PollOutcome::Satisfied { attempts } => {
				info!("Node synced to chain after {} status fetches", attempts)
			}
			PollOutcome::Cancelled { attempts } => {
				warn!("Sync polling cancelled after {} status fetches", attempts)
			}
			PollOutcome::Exhausted { attempts } => {
				warn!("Node still not synced after {} status fetches", attempts)
			}
		}
		outcome
	}

	/// Show home right away if synced, otherwise show the loader until sync state changes.
	pub fn init_loader_syncing(&self) {
		let reached = Arc::new(AtomicBool::new(false));
		let observer_reached = reached.clone();
		let navigator = self.services.navigator.clone();
		let waiting = self.store.observe_once_if(
			StoreField::SyncedToChain,
			|state| !state.node.synced_to_chain,
			move |_| {
				observer_reached.store(true, Ordering::SeqCst);
				navigator.go(View::Home);
			},
		);
		if waiting.is_none() {
			self.services.navigator.go(View::Home);
			return;
		}

		self.services.navigator.go(View::LoaderSyncing);
		// The change may have landed before the loader was shown
		if reached.load(Ordering::SeqCst) {
			self.services.navigator.go(View::Home);
		}
	}
}
