//! Test doubles for the node client and side-effect sinks.

use crate::node::{NodeClient, NodeError};
use crate::services::{Clock, MemoryClipboard, Navigator, Notification, Notifier, Services, View};
use crate::store::Store;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

/// Node client answering from per-command scripts, in order.
#[derive(Default)]
pub struct FakeNode {
	scripts: Mutex<HashMap<String, VecDeque<Result<Value, NodeError>>>>,
	calls: Mutex<Vec<(String, Value)>>,
}

impl FakeNode {
	pub fn respond(&self, command: &str, response: Value) -> &Self {
		self.push(command, Ok(response))
	}

	pub fn fail(&self, command: &str, error: NodeError) -> &Self {
		self.push(command, Err(error))
	}

	fn push(&self, command: &str, result: Result<Value, NodeError>) -> &Self {
		self.scripts
			.lock()
			.unwrap()
			.entry(command.to_string())
			.or_default()
			.push_back(result);
		self
	}

	/// Arguments of every call made with `command`.
	pub fn calls_to(&self, command: &str) -> Vec<Value> {
		self.calls
			.lock()
			.unwrap()
			.iter()
			.filter(|(name, _)| name == command)
			.map(|(_, args)| args.clone())
			.collect()
	}
}

#[async_trait]
impl NodeClient for FakeNode {
	async fn send_command(&self, command: &str, args: Value) -> Result<Value, NodeError> {
		self.calls
			.lock()
			.unwrap()
			.push((command.to_string(), args));
		self.scripts
			.lock()
			.unwrap()
			.get_mut(command)
			.and_then(|script| script.pop_front())
			.unwrap_or_else(|| {
				Err(NodeError::Unavailable(format!(
					"no scripted response for {}",
					command
				)))
			})
	}
}

#[derive(Default)]
pub struct RecordingNotifier {
	notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
	pub fn notifications(&self) -> Vec<Notification> {
		self.notifications.lock().unwrap().clone()
	}
}

impl Notifier for RecordingNotifier {
	fn display(&self, notification: Notification) {
		self.notifications.lock().unwrap().push(notification);
	}
}

#[derive(Default)]
pub struct RecordingNavigator {
	views: Mutex<Vec<View>>,
}

impl RecordingNavigator {
	pub fn views(&self) -> Vec<View> {
		self.views.lock().unwrap().clone()
	}
}

impl Navigator for RecordingNavigator {
	fn go(&self, view: View) {
		self.views.lock().unwrap().push(view);
	}
}

#[derive(Default)]
pub struct FixedClock {
	now: AtomicI64,
}

impl FixedClock {
	pub fn set(&self, timestamp: i64) {
		self.now.store(timestamp, Ordering::SeqCst);
	}
}

impl Clock for FixedClock {
	fn now_timestamp(&self) -> i64 {
		self.now.load(Ordering::SeqCst)
	}
}

/// A store plus recording collaborators, with handles kept for assertions.
pub struct Harness {
	pub store: Store,
	pub node: Arc<FakeNode>,
	pub notifier: Arc<RecordingNotifier>,
	pub navigator: Arc<RecordingNavigator>,
	pub clipboard: Arc<MemoryClipboard>,
	pub clock: Arc<FixedClock>,
}

impl Harness {
	pub fn new() -> Self {
		Self {
			store: Store::default(),
			node: Arc::new(FakeNode::default()),
			notifier: Arc::new(RecordingNotifier::default()),
			navigator: Arc::new(RecordingNavigator::default()),
			clipboard: Arc::new(MemoryClipboard::default()),
			clock: Arc::new(FixedClock::default()),
		}
	}

	pub fn services(&self) -> Services {
		Services {
			notifier: self.notifier.clone(),
			navigator: self.navigator.clone(),
			clipboard: self.clipboard.clone(),
			clock: self.clock.clone(),
		}
	}
}
