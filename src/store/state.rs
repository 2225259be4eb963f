use crate::node::ChannelInfo;
use crate::utils::BtcUnit;

/// The invoice the user is composing or has generated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceDraft {
	/// Decimal amount as typed, in the user's display unit.
	pub amount: String,
	pub note: String,
	/// Encoded payment request returned by the node.
	pub encoded: String,
	/// Shareable URI, the payment request behind the URI scheme prefix.
	pub uri: String,
}

/// A channel as far as receiving is concerned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Channel {
	pub channel_point: String,
	pub remote_pubkey: String,
	pub active: bool,
	pub capacity: u64,
	pub local_balance: u64,
	/// Satoshis the channel can currently receive.
	pub remote_balance: u64,
}

impl From<ChannelInfo> for Channel {
	fn from(info: ChannelInfo) -> Self {
		Self {
			channel_point: info.channel_point,
			remote_pubkey: info.remote_pubkey,
			active: info.active,
			capacity: info.capacity,
			local_balance: info.local_balance,
			remote_balance: info.remote_balance,
		}
	}
}

/// Node identity and chain sync state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSyncStatus {
	pub pub_key: String,
	pub synced_to_chain: bool,
	pub block_height: u32,
	pub network: String,
	/// Estimated sync progress in [0, 1]; only meaningful while not synced.
	pub percent_synced: f64,
}

/// User settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
	/// Bitcoin unit amounts are entered in when not displaying fiat.
	pub unit: BtcUnit,
	/// Fiat currency code, e.g. `usd`.
	pub fiat: String,
	pub display_fiat: bool,
	/// Fiat price of one bitcoin, when known.
	pub exchange_rate: Option<f64>,
	/// Wallet is being restored from seed and waits for chain sync.
	pub restoring: bool,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			unit: BtcUnit::default(),
			fiat: "usd".to_string(),
			display_fiat: false,
			exchange_rate: None,
			restoring: false,
		}
	}
}

/// Everything the store holds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletState {
	pub invoice: InvoiceDraft,
	pub channels: Vec<Channel>,
	pub node: NodeSyncStatus,
	pub settings: Settings,
	/// UI flag raised after something was copied to the clipboard.
	pub display_copied: bool,
}
