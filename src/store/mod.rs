//! Wallet store
//!
//! The store is the single owner of shared wallet state. Workflows read and mutate it through
//! [`Store::read`] and [`Store::write`]; the UI and workflows react to changes either through the
//! broadcast channel returned by [`Store::subscribe`] or through one-shot observers registered
//! with [`Store::observe_once`]. Writes diff the state, so only fields whose value actually
//! changed produce events.

/// Field keys, change events and the one-shot observer registry
pub mod events;
/// Typed wallet state
pub mod state;

pub use events::{ObserverId, StoreEvent, StoreField};
pub use state::*;

use events::ObserverRegistry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::debug;

/// Capacity of the change broadcast channel; slow subscribers observe `Lagged`.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Cheaply cloneable handle to the shared wallet state
#[derive(Clone)]
pub struct Store {
	state: Arc<Mutex<WalletState>>,
	observers: Arc<Mutex<ObserverRegistry>>,
	changes: broadcast::Sender<StoreEvent>,
}

impl Store {
	pub fn new(initial: WalletState) -> Self {
		let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
		Self {
			state: Arc::new(Mutex::new(initial)),
			observers: Arc::new(Mutex::new(ObserverRegistry::new())),
			changes,
		}
	}

	/// Read from the current state.
	pub fn read<R>(&self, read: impl FnOnce(&WalletState) -> R) -> R {
		read(&self.lock_state())
	}

	/// Copy of the current state.
	pub fn snapshot(&self) -> WalletState {
		self.lock_state().clone()
	}

	/// Mutate the state and publish every field the mutation changed.
	///
	/// Observers run after the state lock is released and may use the store themselves.
	pub fn write<R>(&self, mutate: impl FnOnce(&mut WalletState) -> R) -> R {
		let (result, changed, after) = {
			let mut state = self.lock_state();
			let before = state.clone();
			let result = mutate(&mut state);
			let changed = StoreField::changed_between(&before, &state);
			let after = if changed.is_empty() {
				None
			} else {
				Some(state.clone())
			};
			(result, changed, after)
		};

		if let Some(after) = after {
			self.publish(&changed, &after);
		}
		result
	}

	/// Run `observer` once, on the next change of `field`.
	pub fn observe_once(
		&self,
		field: StoreField,
		observer: impl FnOnce(&WalletState) + Send + 'static,
	) -> ObserverId {
		self.lock_observers().register(field, Box::new(observer))
	}

	/// Decide under the state lock whether to wait for the next change of `field`.
	///
	/// `decide` sees the current state. When it returns true, `observer` is registered before
	/// the lock is released, so no write lands between the check and the registration.
	/// `decide` must not use the store.
	pub fn observe_once_if(
		&self,
		field: StoreField,
		decide: impl FnOnce(&WalletState) -> bool,
		observer: impl FnOnce(&WalletState) + Send + 'static,
	) -> Option<ObserverId> {
		let state = self.lock_state();
		if !decide(&state) {
			return None;
		}
		Some(self.lock_observers().register(field, Box::new(observer)))
	}

	/// Cancel an observer that has not fired yet.
	pub fn cancel_observer(&self, id: ObserverId) -> bool {
		self.lock_observers().cancel(id)
	}

	/// Receive an event for every changed field from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
		self.changes.subscribe()
	}

	fn publish(&self, changed: &[StoreField], after: &WalletState) {
		for field in changed {
			debug!("Store field changed: {:?}", field);
			// No subscribers is fine
			let _ = self.changes.send(StoreEvent { field: *field });
		}

		let ready = self.lock_observers().take_matching(changed);
		for observer in ready {
			observer(after);
		}
	}

	fn lock_state(&self) -> MutexGuard<'_, WalletState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn lock_observers(&self) -> MutexGuard<'_, ObserverRegistry> {
		self.observers.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

impl Default for Store {
	fn default() -> Self {
		Self::new(WalletState::default())
	}
}
