//! Request, response and error types for node daemon commands

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Command name for creating an invoice.
pub const ADD_INVOICE: &str = "addInvoice";
/// Command name for fetching node identity and sync state.
pub const GET_INFO: &str = "getInfo";
/// Command name for listing open channels.
pub const LIST_CHANNELS: &str = "listChannels";

/// Arguments of the `addInvoice` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddInvoiceRequest {
	/// Invoice amount in satoshis.
	pub value: u64,
	/// Free-form description embedded in the payment request.
	pub memo: String,
	/// Seconds until the invoice expires.
	pub expiry: u64,
	/// Embed routing hints for private channels.
	pub private: bool,
}

/// Response of the `addInvoice` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddInvoiceResponse {
	/// The BOLT11 encoded payment request.
	#[serde(default)]
	pub payment_request: String,
	/// Payment hash, base64 encoded by the REST gateway.
	#[serde(default)]
	pub r_hash: Option<String>,
	#[serde(default, deserialize_with = "opt_from_wire")]
	pub add_index: Option<u64>,
}

/// A chain the node is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
	#[serde(default)]
	pub chain: String,
	#[serde(default)]
	pub network: String,
}

/// Response of the `getInfo` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
	#[serde(default)]
	pub identity_pubkey: String,
	#[serde(default)]
	pub synced_to_chain: bool,
	#[serde(default)]
	pub block_height: u32,
	#[serde(default)]
	pub chains: Vec<ChainInfo>,
	/// Timestamp (seconds) of the best block header the node knows about.
	#[serde(default, deserialize_with = "opt_from_wire")]
	pub best_header_timestamp: Option<i64>,
}

impl NodeInfo {
	/// Network of the first chain entry, or an empty string.
	pub fn network(&self) -> String {
		self.chains
			.first()
			.map(|chain| chain.network.clone())
			.unwrap_or_default()
	}
}

/// A single channel as reported by `listChannels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
	#[serde(default)]
	pub active: bool,
	#[serde(default)]
	pub remote_pubkey: String,
	#[serde(default)]
	pub channel_point: String,
	#[serde(default, deserialize_with = "from_wire")]
	pub capacity: u64,
	#[serde(default, deserialize_with = "from_wire")]
	pub local_balance: u64,
	#[serde(default, deserialize_with = "from_wire")]
	pub remote_balance: u64,
}

/// Response of the `listChannels` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListChannelsResponse {
	#[serde(default)]
	pub channels: Vec<ChannelInfo>,
}

/// Error body returned by the daemon's REST gateway.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RpcErrorBody {
	pub message: String,
}

/// 64-bit integers arrive as JSON numbers or as decimal strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireNumber<T> {
	Number(T),
	Text(String),
}

fn from_wire<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de> + FromStr,
	T::Err: Display,
{
	match WireNumber::<T>::deserialize(deserializer)? {
		WireNumber::Number(value) => Ok(value),
		WireNumber::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
	}
}

fn opt_from_wire<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de> + FromStr,
	T::Err: Display,
{
	match Option::<WireNumber<T>>::deserialize(deserializer)? {
		None => Ok(None),
		Some(WireNumber::Number(value)) => Ok(Some(value)),
		Some(WireNumber::Text(text)) => text
			.trim()
			.parse()
			.map(Some)
			.map_err(serde::de::Error::custom),
	}
}

/// Error types for node daemon commands
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
	#[error("HTTP error: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("JSON parse error: {0}")]
	JsonError(#[from] serde_json::Error),

	#[error("Node returned status {status}: {message}")]
	RpcError { status: u16, message: String },

	#[error("Unknown node command: {0}")]
	UnknownCommand(String),

	#[error("Invalid node response: {0}")]
	InvalidResponse(String),

	#[error("Node unavailable: {0}")]
	Unavailable(String),

	#[error("Client configuration error: {0}")]
	ConfigError(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn node_info_accepts_string_encoded_timestamps() {
		let info: NodeInfo = serde_json::from_value(json!({
			"identity_pubkey": "02abc",
			"synced_to_chain": false,
			"block_height": 1200,
			"chains": [{ "chain": "bitcoin", "network": "testnet" }],
			"best_header_timestamp": "1500"
		}))
		.unwrap();

		assert_eq!(info.best_header_timestamp, Some(1500));
		assert_eq!(info.network(), "testnet");
	}

	#[test]
	fn node_info_tolerates_missing_fields() {
		let info: NodeInfo = serde_json::from_value(json!({ "block_height": 7 })).unwrap();

		assert!(!info.synced_to_chain);
		assert_eq!(info.best_header_timestamp, None);
		assert_eq!(info.network(), "");
	}

	#[test]
	fn channel_balances_parse_from_numbers_and_strings() {
		let response: ListChannelsResponse = serde_json::from_value(json!({
			"channels": [
				{ "remote_balance": "5000", "local_balance": 10, "capacity": "5010" },
				{ "remote_balance": 42 }
			]
		}))
		.unwrap();

		assert_eq!(response.channels[0].remote_balance, 5000);
		assert_eq!(response.channels[0].capacity, 5010);
		assert_eq!(response.channels[1].remote_balance, 42);
		assert_eq!(response.channels[1].local_balance, 0);
	}

	#[test]
	fn malformed_numbers_are_rejected() {
		let result = serde_json::from_value::<ChannelInfo>(json!({ "remote_balance": "lots" }));
		assert!(result.is_err());
	}
}
