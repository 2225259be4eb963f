//!
//! Client contract and REST implementation for the wallet node daemon.
//!
//! Workflows talk to the daemon through the [`NodeClient`] trait, which executes a named
//! command with JSON arguments. Typed helpers for the commands the wallet uses are provided
//! on top of that single required method, so test doubles only need to script JSON.

use super::types::*;
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder, future::retry};
use reqwest::{Certificate, Client};
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Header carrying the hex encoded macaroon on every REST request.
const MACAROON_HEADER: &str = "Grpc-Metadata-macaroon";

/// Upper bound on time spent retrying a retryable command.
const READ_RETRY_MAX_ELAPSED: Duration = Duration::from_secs(10);

/// Executes named commands against the node daemon.
#[async_trait]
pub trait NodeClient: Send + Sync {
	/// Execute `command` with JSON `args` and return the JSON response.
	async fn send_command(&self, command: &str, args: Value) -> Result<Value, NodeError>;

	/// Create an invoice.
	async fn add_invoice(
		&self,
		request: &AddInvoiceRequest,
	) -> Result<AddInvoiceResponse, NodeError> {
		let args = serde_json::to_value(request)?;
		let response = self.send_command(ADD_INVOICE, args).await?;
		Ok(serde_json::from_value(response)?)
	}

	/// Fetch node identity and chain sync state.
	async fn get_info(&self) -> Result<NodeInfo, NodeError> {
		let response = self.send_command(GET_INFO, json!({})).await?;
		Ok(serde_json::from_value(response)?)
	}

	/// List the node's open channels.
	async fn list_channels(&self) -> Result<Vec<ChannelInfo>, NodeError> {
		let response = self.send_command(LIST_CHANNELS, json!({})).await?;
		let parsed: ListChannelsResponse = serde_json::from_value(response)?;
		Ok(parsed.channels)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
	Get,
	Post,
}

/// REST route backing a node command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Route {
	method: Method,
	path: &'static str,
	/// Transient failures are retried inside the client.
	retryable: bool,
}

impl Route {
	fn for_command(command: &str) -> Result<Self, NodeError> {
		let route = match command {
			// A retried addInvoice could mint two invoices
			ADD_INVOICE => Route {
				method: Method::Post,
				path: "/v1/invoices",
				retryable: false,
			},
			// Fails fast; the sync poll loop is the only retry
			GET_INFO => Route {
				method: Method::Get,
				path: "/v1/getinfo",
				retryable: false,
			},
			LIST_CHANNELS => Route {
				method: Method::Get,
				path: "/v1/channels",
				retryable: true,
			},
			other => return Err(NodeError::UnknownCommand(other.to_string())),
		};
		Ok(route)
	}
}

/// Node daemon client speaking the daemon's REST gateway
#[derive(Clone)]
pub struct RestNodeClient {
	/// The underlying HTTP client.
	http_client: Client,
	/// Base URL of the REST gateway, without a trailing slash.
	base_url: String,
	/// Hex encoded macaroon, if the daemon requires authentication.
	macaroon: Option<String>,
}

impl RestNodeClient {
	/// Create a new REST client.
	///
	/// # Arguments
	/// * `base_url` - Base URL of the daemon REST gateway, e.g. `https://localhost:8080`.
	/// * `timeout` - Per-request timeout applied by the HTTP client.
	/// * `tls_cert` - Optional PEM certificate to trust, for self-signed daemon certificates.
	pub fn new(
		base_url: &str,
		timeout: Duration,
		tls_cert: Option<&[u8]>,
	) -> Result<Self, NodeError> {
		let mut builder = Client::builder().timeout(timeout);
		if let Some(pem) = tls_cert {
			builder = builder.add_root_certificate(Certificate::from_pem(pem)?);
		}
		let http_client = builder.build()?;

		Ok(Self {
			http_client,
			base_url: base_url.trim_end_matches('/').to_string(),
			macaroon: None,
		})
	}

	/// Authenticate requests with the macaroon stored at `path`.
	pub fn with_macaroon_file(mut self, path: &Path) -> Result<Self, NodeError> {
		let bytes = std::fs::read(path)?;
		if bytes.is_empty() {
			return Err(NodeError::ConfigError(format!(
				"Macaroon file {} is empty",
				path.display()
			)));
		}
		self.macaroon = Some(hex::encode(bytes));
		Ok(self)
	}

	fn read_backoff() -> ExponentialBackoff {
		ExponentialBackoffBuilder::new()
			.with_max_elapsed_time(Some(READ_RETRY_MAX_ELAPSED))
			.build()
	}

	/// Execute a single HTTP request for `route`.
	async fn execute(&self, route: Route, args: &Value) -> Result<Value, NodeError> {
		let url = format!("{}{}", self.base_url, route.path);
		let mut request = match route.method {
			Method::Get => self.http_client.get(&url),
			Method::Post => self.http_client.post(&url).json(args),
		};
		if let Some(macaroon) = &self.macaroon {
			request = request.header(MACAROON_HEADER, macaroon);
		}

		let response = request.send().await?;
		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(NodeError::RpcError {
				status: status.as_u16(),
				message: rpc_error_message(&body),
			});
		}

		let body: Value = response.json().await?;
		debug!("Node response from {}: {}", route.path, body);
		Ok(body)
	}
}

#[async_trait]
impl NodeClient for RestNodeClient {
	async fn send_command(&self, command: &str, args: Value) -> Result<Value, NodeError> {
		let route = Route::for_command(command)?;
		debug!("Sending node command {} via {}", command, route.path);

		if !route.retryable {
			return self.execute(route, &args).await;
		}

		retry(Self::read_backoff(), || async {
			self.execute(route, &args).await.map_err(|e| {
				if is_transient(&e) {
					warn!("Transient failure for node command {}: {}", command, e);
					backoff::Error::transient(e)
				} else {
					backoff::Error::permanent(e)
				}
			})
		})
		.await
	}
}

/// Pull the human readable message out of a gateway error body.
fn rpc_error_message(body: &str) -> String {
	serde_json::from_str::<RpcErrorBody>(body)
		.map(|parsed| parsed.message)
		.unwrap_or_else(|_| body.to_string())
}

fn is_transient(error: &NodeError) -> bool {
	match error {
		NodeError::HttpError(e) => e.is_connect() || e.is_timeout(),
		NodeError::RpcError { status, .. } => *status >= 500,
		NodeError::Unavailable(_) => true,
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::{Arc, Mutex};
	use tokio::io::{AsyncReadExt, AsyncWriteExt};
	use tokio::net::{TcpListener, TcpStream};

	/// A request received by the canned gateway, head lower-cased.
	#[derive(Debug, Clone)]
	struct SeenRequest {
		head: String,
		body: String,
	}

	type Seen = Arc<Mutex<Vec<SeenRequest>>>;

	/// Serve one canned reply per connection, in order, recording each request.
	async fn canned_gateway(replies: Vec<(u16, &'static str)>) -> (String, Seen) {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		let seen: Seen = Arc::new(Mutex::new(Vec::new()));
		let recorded = seen.clone();
		tokio::spawn(async move {
			for (status, body) in replies {
				let (mut socket, _) = listener.accept().await.unwrap();
				let request = read_request(&mut socket).await;
				recorded.lock().unwrap().push(request);
				let reply = format!(
					"HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
					status,
					body.len(),
					body
				);
				socket.write_all(reply.as_bytes()).await.unwrap();
				socket.shutdown().await.ok();
			}
		});
		(format!("http://{}", addr), seen)
	}

	async fn read_request(socket: &mut TcpStream) -> SeenRequest {
		let mut buf = Vec::new();
		let mut chunk = [0u8; 1024];
		let head_end = loop {
			let n = socket.read(&mut chunk).await.unwrap();
			assert!(n > 0, "connection closed before the request head");
			buf.extend_from_slice(&chunk[..n]);
			if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
				break pos + 4;
			}
		};
		let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
		let length = head
			.lines()
			.find_map(|line| line.strip_prefix("content-length:"))
			.map(|value| value.trim().parse::<usize>().unwrap())
			.unwrap_or(0);
		while buf.len() < head_end + length {
			let n = socket.read(&mut chunk).await.unwrap();
			assert!(n > 0, "connection closed before the request body");
			buf.extend_from_slice(&chunk[..n]);
		}
		SeenRequest {
			head,
			body: String::from_utf8_lossy(&buf[head_end..head_end + length]).to_string(),
		}
	}

	fn client(base_url: &str) -> RestNodeClient {
		RestNodeClient::new(base_url, Duration::from_secs(5), None).unwrap()
	}

	#[test]
	fn commands_map_to_rest_routes() {
		let invoice = Route::for_command(ADD_INVOICE).unwrap();
		assert_eq!(invoice.method, Method::Post);
		assert_eq!(invoice.path, "/v1/invoices");
		assert!(!invoice.retryable);

		let info = Route::for_command(GET_INFO).unwrap();
		assert_eq!(info.method, Method::Get);
		assert_eq!(info.path, "/v1/getinfo");
		assert!(!info.retryable);

		let channels = Route::for_command(LIST_CHANNELS).unwrap();
		assert_eq!(channels.path, "/v1/channels");
		assert!(channels.retryable);
	}

	#[tokio::test]
	async fn unknown_command_fails_without_network() {
		let client =
			RestNodeClient::new("http://127.0.0.1:1/", Duration::from_secs(1), None).unwrap();

		let err = client
			.send_command("openChannel", json!({}))
			.await
			.unwrap_err();
		assert!(matches!(err, NodeError::UnknownCommand(name) if name == "openChannel"));
	}

	#[test]
	fn base_url_loses_trailing_slash() {
		let client =
			RestNodeClient::new("https://localhost:8080/", Duration::from_secs(1), None).unwrap();
		assert_eq!(client.base_url, "https://localhost:8080");
	}

	#[test]
	fn gateway_error_message_is_extracted() {
		let body = r#"{"code":2,"message":"amount too large","details":[]}"#;
		assert_eq!(rpc_error_message(body), "amount too large");
		assert_eq!(rpc_error_message("bad gateway"), "bad gateway");
	}

	#[test]
	fn server_errors_are_transient_client_errors_are_not() {
		assert!(is_transient(&NodeError::RpcError {
			status: 503,
			message: "server is still starting".to_string(),
		}));
		assert!(!is_transient(&NodeError::RpcError {
			status: 400,
			message: "bad request".to_string(),
		}));
		assert!(!is_transient(&NodeError::InvalidResponse(
			"empty".to_string()
		)));
	}

	#[test]
	fn empty_macaroon_file_is_rejected() {
		let path = std::env::temp_dir().join(format!(
			"wallet_actions_empty_macaroon_{}",
			std::process::id()
		));
		std::fs::write(&path, b"").unwrap();

		let client =
			RestNodeClient::new("https://localhost:8080", Duration::from_secs(1), None).unwrap();
		let result = client.with_macaroon_file(&path);
		std::fs::remove_file(&path).ok();

		assert!(matches!(result, Err(NodeError::ConfigError(_))));
	}

	#[test]
	fn macaroon_is_hex_encoded() {
		let path = std::env::temp_dir().join(format!(
			"wallet_actions_macaroon_{}",
			std::process::id()
		));
		std::fs::write(&path, [0x02u8, 0xab, 0xff]).unwrap();

		let client = RestNodeClient::new("https://localhost:8080", Duration::from_secs(1), None)
			.unwrap()
			.with_macaroon_file(&path)
			.unwrap();
		std::fs::remove_file(&path).ok();

		assert_eq!(client.macaroon.as_deref(), Some("02abff"));
	}

	#[tokio::test]
	async fn get_info_sends_macaroon_header() {
		let (url, seen) = canned_gateway(vec![(
			200,
			r#"{"identity_pubkey":"02ab","synced_to_chain":true,"block_height":800000,"best_header_timestamp":"1700000000"}"#,
		)])
		.await;
		let path = std::env::temp_dir().join(format!(
			"wallet_actions_header_macaroon_{}",
			std::process::id()
		));
		std::fs::write(&path, [0x02u8, 0xab, 0xff]).unwrap();
		let node = client(&url).with_macaroon_file(&path).unwrap();
		std::fs::remove_file(&path).ok();

		let info = node.get_info().await.unwrap();

		assert!(info.synced_to_chain);
		assert_eq!(info.block_height, 800_000);
		assert_eq!(info.best_header_timestamp, Some(1_700_000_000));
		let seen = seen.lock().unwrap();
		assert_eq!(seen.len(), 1);
		assert!(seen[0].head.starts_with("get /v1/getinfo http/1.1"));
		assert!(seen[0].head.contains("grpc-metadata-macaroon: 02abff\r\n"));
	}

	#[tokio::test]
	async fn add_invoice_posts_request_as_json() {
		let (url, seen) = canned_gateway(vec![(
			200,
			r#"{"payment_request":"lnbc1...","r_hash":"AAEC","add_index":"7"}"#,
		)])
		.await;
		let request = AddInvoiceRequest {
			value: 100,
			memo: "coffee".to_string(),
			expiry: 172_800,
			private: true,
		};

		let response = client(&url).add_invoice(&request).await.unwrap();

		assert_eq!(response.payment_request, "lnbc1...");
		assert_eq!(response.add_index, Some(7));
		let seen = seen.lock().unwrap();
		assert_eq!(seen.len(), 1);
		assert!(seen[0].head.starts_with("post /v1/invoices http/1.1"));
		assert!(!seen[0].head.contains("grpc-metadata-macaroon"));
		let body: Value = serde_json::from_str(&seen[0].body).unwrap();
		assert_eq!(
			body,
			json!({ "value": 100, "memo": "coffee", "expiry": 172_800, "private": true })
		);
	}

	#[tokio::test]
	async fn failed_add_invoice_is_attempted_once() {
		let (url, seen) = canned_gateway(vec![
			(500, r#"{"code":2,"message":"wallet locked","details":[]}"#),
			(200, r#"{"payment_request":"lnbc1second"}"#),
		])
		.await;
		let request = AddInvoiceRequest {
			value: 1,
			memo: String::new(),
			expiry: 172_800,
			private: true,
		};

		let err = client(&url).add_invoice(&request).await.unwrap_err();

		assert!(matches!(
			err,
			NodeError::RpcError { status: 500, ref message } if message == "wallet locked"
		));
		assert_eq!(seen.lock().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn failed_get_info_surfaces_without_retry() {
		let (url, seen) = canned_gateway(vec![
			(503, r#"{"code":14,"message":"server is still starting"}"#),
			(200, r#"{"synced_to_chain":true}"#),
		])
		.await;

		let err = client(&url).get_info().await.unwrap_err();

		assert!(matches!(err, NodeError::RpcError { status: 503, .. }));
		assert_eq!(seen.lock().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn unreachable_node_fails_get_info_at_once() {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let url = format!("http://{}", listener.local_addr().unwrap());
		drop(listener);

		let started = std::time::Instant::now();
		let err = client(&url).get_info().await.unwrap_err();

		assert!(matches!(err, NodeError::HttpError(_)));
		assert!(started.elapsed() < Duration::from_secs(2));
	}

	#[tokio::test]
	async fn list_channels_retries_transient_failures() {
		let (url, seen) = canned_gateway(vec![
			(503, "bad gateway"),
			(
				200,
				r#"{"channels":[{"active":true,"capacity":"1000","remote_balance":"400"}]}"#,
			),
		])
		.await;

		let channels = client(&url).list_channels().await.unwrap();

		assert_eq!(channels.len(), 1);
		assert_eq!(channels[0].remote_balance, 400);
		assert_eq!(seen.lock().unwrap().len(), 2);
	}
}
