use crate::node::NodeError;
use crate::utils::ConversionError;

/// Why a workflow step failed
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
	/// The user's input could not be used.
	#[error("Validation error: {0}")]
	Validation(#[from] ConversionError),

	/// The node rejected the command or could not be reached.
	#[error("Node error: {0}")]
	Remote(#[from] NodeError),
}

impl ActionError {
	pub fn is_validation(&self) -> bool {
		matches!(self, ActionError::Validation(_))
	}

	pub fn is_remote(&self) -> bool {
		matches!(self, ActionError::Remote(_))
	}
}
