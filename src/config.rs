//! Command line and environment configuration.

use crate::node::{NodeError, RestNodeClient};
use crate::poll::Poller;
use crate::store::Settings;
use crate::utils::BtcUnit;
use crate::workflows::invoice::DEFAULT_URI_PREFIX;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REST_URL: &str = "https://localhost:8080";

#[derive(Parser, Debug, Clone)]
#[command(about = "Wait for a lightning node to sync and create invoices", long_about = None)]
pub struct WalletConfig {
	#[arg(long, env = "LND_REST_URL", default_value = DEFAULT_REST_URL, help = "node REST endpoint")]
	pub rest_url: String,

	#[arg(long, env = "LND_MACAROON_PATH", value_name = "FILE", help = "macaroon used to authenticate")]
	pub macaroon_path: Option<PathBuf>,

	#[arg(long, env = "LND_TLS_CERT_PATH", value_name = "FILE", help = "PEM certificate of the node")]
	pub tls_cert_path: Option<PathBuf>,

	#[arg(long, env = "LND_REQUEST_TIMEOUT_SECS", default_value_t = 30, help = "per request timeout")]
	pub request_timeout_secs: u64,

	#[arg(long, env = "WALLET_POLL_INTERVAL_MS", default_value_t = 1000, help = "wait between status fetches")]
	pub poll_interval_ms: u64,

	#[arg(long, env = "WALLET_MAX_POLL_ATTEMPTS", help = "give up waiting for sync after this many fetches")]
	pub max_poll_attempts: Option<u32>,

	#[arg(long, env = "WALLET_UNIT", default_value = "sat", help = "unit amounts are entered in: btc, mbtc, bits or sat")]
	pub unit: BtcUnit,

	#[arg(long, env = "WALLET_FIAT", default_value = "usd", help = "fiat currency code")]
	pub fiat: String,

	#[arg(long, env = "WALLET_DISPLAY_FIAT", help = "amounts are entered in the fiat currency")]
	pub display_fiat: bool,

	#[arg(long, env = "WALLET_EXCHANGE_RATE", help = "fiat price of one bitcoin")]
	pub exchange_rate: Option<f64>,

	#[arg(long, env = "WALLET_URI_PREFIX", default_value = DEFAULT_URI_PREFIX, help = "scheme prefix of invoice URIs")]
	pub uri_prefix: String,

	#[command(subcommand)]
	pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
	/// Wait until the node is synced to chain
	Sync,
	/// Wait for sync, then create an invoice
	Invoice {
		#[arg(long, help = "amount in the configured unit")]
		amount: String,
		#[arg(long, default_value = "", help = "memo embedded in the invoice")]
		note: String,
		#[arg(long, help = "copy the invoice URI to the clipboard")]
		copy: bool,
	},
}

impl WalletConfig {
	pub fn command(&self) -> Command {
		self.command.clone().unwrap_or(Command::Sync)
	}

	pub fn poller(&self) -> Poller {
		let poller = Poller::new(Duration::from_millis(self.poll_interval_ms));
		match self.max_poll_attempts {
			Some(max) => poller.with_max_attempts(max),
			None => poller,
		}
	}

	/// Initial user settings.
	pub fn settings(&self) -> Settings {
		Settings {
			unit: self.unit,
			fiat: self.fiat.clone(),
			display_fiat: self.display_fiat,
			exchange_rate: self.exchange_rate,
			..Settings::default()
		}
	}

	/// Build the REST client for the configured node.
	pub fn node_client(&self) -> Result<RestNodeClient, NodeError> {
		let tls_cert = self
			.tls_cert_path
			.as_ref()
			.map(std::fs::read)
			.transpose()?;
		let client = RestNodeClient::new(
			&self.rest_url,
			Duration::from_secs(self.request_timeout_secs),
			tls_cert.as_deref(),
		)?;
		match &self.macaroon_path {
			Some(path) => client.with_macaroon_file(path),
			None => Ok(client),
		}
	}
}
