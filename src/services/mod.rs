//! Side-effect sinks the workflows report to
//!
//! Notifications, navigation, clipboard access and wall clock time are owned by the host
//! application. Workflows only see these traits, bundled in [`Services`].

/// Log-backed implementations for headless use
pub mod console;

pub use console::{LogNavigator, LogNotifier, MemoryClipboard, SystemClock};

use std::fmt::Display;
use std::sync::Arc;

/// How a notification should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
	Info,
	Success,
	Error,
}

/// A user facing notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
	pub msg: String,
	pub kind: NotificationKind,
	/// Persistent progress notice that stays until replaced.
	pub wait: bool,
	/// Underlying error detail, for failures.
	pub err: Option<String>,
}

impl Notification {
	pub fn info(msg: impl Into<String>) -> Self {
		Self {
			msg: msg.into(),
			kind: NotificationKind::Info,
			wait: false,
			err: None,
		}
	}

	/// A persistent progress notice.
	pub fn waiting(msg: impl Into<String>) -> Self {
		Self {
			wait: true,
			..Self::info(msg)
		}
	}

	pub fn success(msg: impl Into<String>) -> Self {
		Self {
			kind: NotificationKind::Success,
			..Self::info(msg)
		}
	}

	pub fn failure(msg: impl Into<String>, err: &dyn Display) -> Self {
		Self {
			kind: NotificationKind::Error,
			err: Some(err.to_string()),
			..Self::info(msg)
		}
	}
}

/// Views the workflows navigate between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
	Invoice,
	InvoiceQr,
	Home,
	LoaderSyncing,
}

pub trait Notifier: Send + Sync {
	/// Fire-and-forget display of a notice.
	fn display(&self, notification: Notification);
}

pub trait Navigator: Send + Sync {
	fn go(&self, view: View);
}

pub trait Clipboard: Send + Sync {
	fn set_string(&self, text: &str);
}

pub trait Clock: Send + Sync {
	/// Seconds since the Unix epoch.
	fn now_timestamp(&self) -> i64;
}

/// The collaborators every workflow is constructed with
#[derive(Clone)]
pub struct Services {
	pub notifier: Arc<dyn Notifier>,
	pub navigator: Arc<dyn Navigator>,
	pub clipboard: Arc<dyn Clipboard>,
	pub clock: Arc<dyn Clock>,
}

impl Services {
	/// Services that log instead of driving a UI.
	pub fn console() -> Self {
		Self {
			notifier: Arc::new(LogNotifier),
			navigator: Arc::new(LogNavigator),
			clipboard: Arc::new(MemoryClipboard::default()),
			clock: Arc::new(SystemClock),
		}
	}
}
