use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use wallet_actions::config::{Command, WalletConfig};
use wallet_actions::node::NodeClient;
use wallet_actions::services::Services;
use wallet_actions::store::{Channel, Store, WalletState};
use wallet_actions::utils::UnitConverter;
use wallet_actions::workflows::{InvoiceWorkflow, SyncWorkflow};

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.init();

	let config = WalletConfig::parse();
	info!("Connecting to node at {}", config.rest_url);

	let node: Arc<dyn NodeClient> = match config.node_client() {
		Ok(client) => Arc::new(client),
		Err(e) => {
			error!("Failed to create node client: {}", e);
			return;
		}
	};

	let store = Store::new(WalletState {
		settings: config.settings(),
		..WalletState::default()
	});
	let services = Services::console();

	let cancel = CancellationToken::new();
	let ctrl_c = cancel.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			info!("Interrupted, stopping");
			ctrl_c.cancel();
		}
	});

	let sync = SyncWorkflow::new(store.clone(), node.clone(), services.clone())
		.with_poller(config.poller());
	sync.init_loader_syncing();
	let outcome = sync.poll_until_synced(&cancel).await;
	if !outcome.is_satisfied() {
		warn!("Node did not finish syncing after {} attempts", outcome.attempts());
		return;
	}

	if let Command::Invoice { amount, note, copy } = config.command() {
		match node.list_channels().await {
			Ok(channels) => store.write(|state| {
				state.channels = channels.into_iter().map(Channel::from).collect();
			}),
			Err(e) => warn!("Failed to list channels: {}", e),
		}

		let invoice = InvoiceWorkflow::new(
			store.clone(),
			node.clone(),
			Arc::new(UnitConverter),
			services.clone(),
		)
		.with_uri_prefix(config.uri_prefix.clone());
		invoice.init();
		invoice.set_amount(&amount);
		invoice.set_note(&note);
		invoice.generate_invoice().await;

		let uri = store.read(|state| state.invoice.uri.clone());
		if uri.is_empty() {
			return;
		}
		info!("Invoice URI: {}", uri);
		if copy {
			invoice.copy_to_clipboard(&uri);
		}
	}
}
