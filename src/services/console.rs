use super::{Clipboard, Clock, Navigator, Notification, NotificationKind, Notifier, View};
use std::sync::{Mutex, PoisonError};
use tracing::{error, info, warn};

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
	fn display(&self, notification: Notification) {
		match (notification.kind, &notification.err) {
			(NotificationKind::Error, Some(err)) => error!("{} ({})", notification.msg, err),
			(NotificationKind::Error, None) => error!("{}", notification.msg),
			(NotificationKind::Success, _) => info!("{}", notification.msg),
			(NotificationKind::Info, _) if notification.wait => info!("{} ...", notification.msg),
			(NotificationKind::Info, _) => warn!("{}", notification.msg),
		}
	}
}

/// Logs view transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
	fn go(&self, view: View) {
		info!("Navigating to {:?}", view);
	}
}

/// Process local clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
	contents: Mutex<String>,
}

impl MemoryClipboard {
	pub fn contents(&self) -> String {
		self.contents
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}
}

impl Clipboard for MemoryClipboard {
	fn set_string(&self, text: &str) {
		*self.contents.lock().unwrap_or_else(PoisonError::into_inner) = text.to_string();
	}
}

/// Wall clock time from the system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now_timestamp(&self) -> i64 {
		chrono::Utc::now().timestamp()
	}
}
