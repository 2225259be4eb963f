//! Change events for the wallet store.
//!
//! This module defines the field keys the store publishes changes for, and the registry of
//! one-shot observers waiting on the next change of a field. Writers never talk to observers
//! directly: the store diffs its state around every write and hands the changed fields to the
//! registry, which releases the observers that were waiting on them.

use crate::store::state::WalletState;

/// Observable fields of the wallet state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreField {
    Invoice,
    Channels,
    /// Public key, block height and network.
    NodeInfo,
    SyncedToChain,
    PercentSynced,
    Settings,
    DisplayCopied,
}

impl StoreField {
    pub const ALL: [StoreField; 7] = [
        StoreField::Invoice,
        StoreField::Channels,
        StoreField::NodeInfo,
        StoreField::SyncedToChain,
        StoreField::PercentSynced,
        StoreField::Settings,
        StoreField::DisplayCopied,
    ];

    /// Whether this field differs between two states.
    pub fn differs(self, before: &WalletState, after: &WalletState) -> bool {
        match self {
            StoreField::Invoice => before.invoice != after.invoice,
            StoreField::Channels => before.channels != after.channels,
            StoreField::NodeInfo => {
                before.node.pub_key != after.node.pub_key
                    || before.node.block_height != after.node.block_height
                    || before.node.network != after.node.network
            }
            StoreField::SyncedToChain => before.node.synced_to_chain != after.node.synced_to_chain,
            StoreField::PercentSynced => before.node.percent_synced != after.node.percent_synced,
            StoreField::Settings => before.settings != after.settings,
            StoreField::DisplayCopied => before.display_copied != after.display_copied,
        }
    }

    /// All fields that differ between two states, in declaration order.
    pub fn changed_between(before: &WalletState, after: &WalletState) -> Vec<StoreField> {
        Self::ALL
            .into_iter()
            .filter(|field| field.differs(before, after))
            .collect()
    }
}

/// Published on the store's broadcast channel for every changed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreEvent {
    pub field: StoreField,
}

/// Handle for cancelling a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Callback run once with the state right after the write that changed its field.
pub type Observer = Box<dyn FnOnce(&WalletState) + Send>;

/// Registry of one-shot observers keyed by field.
///
/// Observers are released in registration order and each fires at most once.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(ObserverId, StoreField, Observer)>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for the next change of `field`.
    pub fn register(&mut self, field: StoreField, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, field, observer));
        id
    }

    /// Drop a pending observer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _, _)| *observer_id != id);
        self.observers.len() != before
    }

    /// Remove and return every observer waiting on one of `changed`.
    pub fn take_matching(&mut self, changed: &[StoreField]) -> Vec<Observer> {
        let (matching, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.observers)
            .into_iter()
            .partition(|(_, field, _)| changed.contains(field));
        self.observers = pending;
        matching
            .into_iter()
            .map(|(_, _, observer)| observer)
            .collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
