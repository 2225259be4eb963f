//! Invoice generation.
//!
//! The user enters an amount and a note, which are stored on the invoice draft without
//! validation. Generating converts the amount to satoshis, warns when no channel can receive
//! that much, asks the node for a private invoice and, on success, stores the payment request
//! together with its URI and shows the QR view.

use crate::node::{AddInvoiceRequest, NodeClient, NodeError};
use crate::services::{Notification, Services, View};
use crate::store::{InvoiceDraft, Store};
use crate::utils::{AmountConverter, format_sats};
use crate::workflows::ActionError;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Scheme prefix of shareable invoice URIs.
pub const DEFAULT_URI_PREFIX: &str = "lightning:";

/// Seconds an invoice stays payable (48 hours).
pub const INVOICE_EXPIRY_SECS: u64 = 172_800;

const INBOUND_CAPACITY_WARNING: &str =
	"You don't have enough inbound capacity to receive this payment.";
const INVOICE_FAILED: &str = "Creating invoice failed!";

pub struct InvoiceWorkflow {
	store: Store,
	node: Arc<dyn NodeClient>,
	converter: Arc<dyn AmountConverter>,
	services: Services,
	uri_prefix: String,
}

impl InvoiceWorkflow {
	pub fn new(
		store: Store,
		node: Arc<dyn NodeClient>,
		converter: Arc<dyn AmountConverter>,
		services: Services,
	) -> Self {
		Self {
			store,
			node,
			converter,
			services,
			uri_prefix: DEFAULT_URI_PREFIX.to_string(),
		}
	}

	/// Use a different URI scheme prefix, e.g. for testnet wallets.
	pub fn with_uri_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.uri_prefix = prefix.into();
		self
	}

	/// Start a fresh invoice and show the entry view.
	pub fn init(&self) {
		self.store
			.write(|state| state.invoice = InvoiceDraft::default());
		self.services.navigator.go(View::Invoice);
	}

	pub fn set_amount(&self, amount: &str) {
		self.store
			.write(|state| state.invoice.amount = amount.to_string());
	}

	pub fn set_note(&self, note: &str) {
		self.store
			.write(|state| state.invoice.note = note.to_string());
	}

	/// Check whether any channel can receive `amount` satoshis.
	///
	/// Shows an advisory when none can. Generation continues either way.
	pub fn check_amount(&self, amount: u64) -> bool {
		let has_inbound = self.store.read(|state| {
			state
				.channels
				.iter()
				.any(|channel| channel.remote_balance >= amount)
		});
		if !has_inbound {
			warn!("No channel can receive {} sats", amount);
			self.services
				.notifier
				.display(Notification::info(INBOUND_CAPACITY_WARNING));
		}
		has_inbound
	}

	/// Convert, validate and request the invoice, storing the result on success.
	///
	/// The payment request and URI are written together, so a failure at any step leaves
	/// the draft exactly as it was.
	pub async fn create_invoice(&self) -> Result<InvoiceDraft, ActionError> {
		let (amount, note, settings) = self.store.read(|state| {
			(
				state.invoice.amount.clone(),
				state.invoice.note.clone(),
				state.settings.clone(),
			)
		});

		let value = self.converter.to_base_units(&amount, &settings)?;
		self.check_amount(value);

		info!(
			"Requesting invoice for {} {}",
			format_sats(value, settings.unit),
			settings.unit
		);
		let request = AddInvoiceRequest {
			value,
			memo: note,
			expiry: INVOICE_EXPIRY_SECS,
			private: true,
		};
		let response = self.node.add_invoice(&request).await?;
		if response.payment_request.is_empty() {
			return Err(NodeError::InvalidResponse(
				"node returned an empty payment request".to_string(),
			)
			.into());
		}

		let uri = format!("{}{}", self.uri_prefix, response.payment_request);
		let draft = self.store.write(|state| {
			state.invoice.encoded = response.payment_request;
			state.invoice.uri = uri;
			state.invoice.clone()
		});
		info!("Created invoice {}", draft.encoded);

		self.services.navigator.go(View::InvoiceQr);
		Ok(draft)
	}

	/// Generate the invoice, reporting any failure to the user instead of returning it.
	pub async fn generate_invoice(&self) {
		if let Err(err) = self.create_invoice().await {
			error!("{} {}", INVOICE_FAILED, err);
			self.services
				.notifier
				.display(Notification::failure(INVOICE_FAILED, &err));
		}
	}

	/// Copy `text` to the clipboard and raise the copied flag.
	pub fn copy_to_clipboard(&self, text: &str) {
		self.services.clipboard.set_string(text);
		self.store.write(|state| state.display_copied = true);
	}
}
