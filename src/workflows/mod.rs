//! Wallet workflows
//!
//! Each workflow turns a user intent into calls against the node daemon and writes the
//! results into the [`Store`](crate::store::Store), navigating and notifying as side effects.
//!
//! - `invoice`: compose, validate and request an invoice, then show it as a QR code.
//! - `sync`: poll node info until the node is synced to chain, estimating progress meanwhile.
//!
//! Every workflow exposes a core operation returning `Result<_, ActionError>` and a
//! UI-facing adapter that reports failures to the notifier and never returns an error.

pub mod error;
pub mod invoice;
pub mod sync;

pub use error::ActionError;
pub use invoice::InvoiceWorkflow;
pub use sync::SyncWorkflow;
