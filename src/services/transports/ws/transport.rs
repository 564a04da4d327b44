//! WebSocket transport for node interactions.
//!
//! Requests are text frames `{"Action":..,"Id":qid,"Version":"1.0.0",..}`. The node
//! answers with the REST envelope plus the echoed `Id`; frames carrying another id
//! (pushed events, replies to other requests) are skipped while waiting.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Map, Value};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
	sync::Mutex,
	time::{timeout, timeout_at, Instant},
};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{
	models::TransportKind,
	services::transports::{
		ws::{
			config::WsConfig,
			connection::{WebSocketConnection, WsStream},
			endpoint_manager::EndpointManager,
		},
		NodeRequest, NodeResponse, NodeTransport, RotatingTransport, TransportError,
	},
};

const WS_VERSION: &str = "1.0.0";

/// Maps a request onto a WebSocket action and its named parameters
pub(crate) fn ws_action(
	request: &NodeRequest,
) -> Result<(&'static str, Map<String, Value>), TransportError> {
	let mut params = Map::new();
	let action = match request {
		NodeRequest::CurrentBlockHeight => "getblockheight",
		NodeRequest::CurrentBlockHash => "getbestblockhash",
		NodeRequest::BlockByHeight(height) => {
			params.insert("Height".to_string(), json!(height));
			params.insert("Raw".to_string(), json!("0"));
			"getblockbyheight"
		}
		NodeRequest::BlockByHash(hash) => {
			params.insert("Hash".to_string(), json!(hash));
			params.insert("Raw".to_string(), json!("0"));
			"getblockbyhash"
		}
		NodeRequest::BlockInfoByHeight(_) => {
			return Err(TransportError::unsupported(
				"WebSocket has no block info action",
				Some(HashMap::from([(
					"operation".to_string(),
					request.operation().to_string(),
				)])),
			));
		}
		NodeRequest::RawTransaction(hash) => {
			params.insert("Hash".to_string(), json!(hash));
			params.insert("Raw".to_string(), json!("0"));
			"gettransaction"
		}
		NodeRequest::BlockHash(height) => {
			params.insert("Height".to_string(), json!(height));
			"getblockhash"
		}
		NodeRequest::BlockHeightByTxHash(hash) => {
			params.insert("Hash".to_string(), json!(hash));
			"getblockheightbytxhash"
		}
		NodeRequest::BlockTxHashesByHeight(height) => {
			params.insert("Height".to_string(), json!(height));
			"getblocktxsbyheight"
		}
		NodeRequest::Storage {
			contract_address,
			key,
		} => {
			params.insert("Hash".to_string(), json!(contract_address));
			params.insert("Key".to_string(), json!(hex::encode(key)));
			"getstorage"
		}
		NodeRequest::SmartContractEvent(hash) => {
			params.insert("Hash".to_string(), json!(hash));
			"getsmartcodeeventbyhash"
		}
		NodeRequest::SmartContractEventsByBlock(height) => {
			params.insert("Height".to_string(), json!(height));
			"getsmartcodeeventbyheight"
		}
		NodeRequest::MerkleProof {
			block_height,
			root_height,
		} => {
			params.insert("Height".to_string(), json!(block_height));
			params.insert("RootHeight".to_string(), json!(root_height));
			"getmerkleproof"
		}
		NodeRequest::CrossStatesProof { height, key } => {
			params.insert("Height".to_string(), json!(height));
			params.insert("Key".to_string(), json!(key));
			"getcrossstatesproof"
		}
		NodeRequest::HeaderByHeight(height) => {
			params.insert("Height".to_string(), json!(height));
			"getheaderbyheight"
		}
		NodeRequest::StateMerkleRoot(height) => {
			params.insert("Height".to_string(), json!(height));
			"getstatemerkleroot"
		}
		NodeRequest::MemPoolTxState(hash) => {
			params.insert("Hash".to_string(), json!(hash));
			"getmempooltxstate"
		}
		NodeRequest::MemPoolTxCount => "getmempooltxcount",
		NodeRequest::Version => "getversion",
		NodeRequest::NetworkId => "getnetworkid",
		NodeRequest::SendRawTransaction { tx, pre_exec } => {
			params.insert("Data".to_string(), json!(tx.to_hex()));
			params.insert("PreExec".to_string(), json!(u8::from(*pre_exec).to_string()));
			"sendrawtransaction"
		}
	};

	Ok((action, params))
}

/// Builds the request frame for `request` tagged with `qid`
pub fn ws_message(qid: &str, request: &NodeRequest) -> Result<Value, TransportError> {
	let (action, params) = ws_action(request)?;

	let mut message = Map::new();
	message.insert("Action".to_string(), json!(action));
	message.insert("Id".to_string(), json!(qid));
	message.insert("Version".to_string(), json!(WS_VERSION));
	message.extend(params);

	Ok(Value::Object(message))
}

/// A failed exchange over the socket
#[derive(Debug)]
struct ExchangeFailure {
	error: TransportError,
	/// The request frame was written and may have reached the node
	delivered: bool,
}

impl ExchangeFailure {
	fn undelivered(error: TransportError) -> Self {
		Self {
			error,
			delivered: false,
		}
	}
}

/// Sends one frame and waits for the reply carrying `qid`
async fn round_trip(
	stream: &mut WsStream,
	qid: &str,
	message: &str,
	message_timeout: Duration,
) -> Result<NodeResponse, ExchangeFailure> {
	stream
		.send(Message::Text(message.to_string().into()))
		.await
		.map_err(|e| {
			ExchangeFailure::undelivered(TransportError::network(
				"Failed to send request",
				Some(Box::new(e)),
				None,
			))
		})?;

	let deadline = Instant::now() + message_timeout;

	await_reply(stream, qid, deadline)
		.await
		.map_err(|error| ExchangeFailure {
			error,
			delivered: true,
		})
}

/// Reads frames until the reply carrying `qid` arrives or `deadline` passes
async fn await_reply(
	stream: &mut WsStream,
	qid: &str,
	deadline: Instant,
) -> Result<NodeResponse, TransportError> {
	loop {
		let frame = timeout_at(deadline, stream.next())
			.await
			.map_err(|_| {
				TransportError::network(
					"Response timeout",
					None,
					Some(HashMap::from([("qid".to_string(), qid.to_string())])),
				)
			})?
			.ok_or_else(|| TransportError::network("Connection closed", None, None))?
			.map_err(|e| TransportError::network("WebSocket error", Some(Box::new(e)), None))?;

		match frame {
			Message::Text(text) => {
				let reply: NodeResponse = match serde_json::from_str(&text) {
					Ok(reply) => reply,
					Err(e) => {
						tracing::warn!("Skipping unrecognized WebSocket frame: {}", e);
						continue;
					}
				};

				if reply.answers(qid) {
					return Ok(reply);
				}
				tracing::trace!(qid = %qid, "Skipping WebSocket frame for another request");
			}
			Message::Ping(data) => {
				stream.send(Message::Pong(data)).await.map_err(|e| {
					TransportError::network("Failed to send pong", Some(Box::new(e)), None)
				})?;
			}
			Message::Close(_) => {
				return Err(TransportError::network(
					"Connection closed by server",
					None,
					None,
				));
			}
			_ => continue,
		}
	}
}

/// WebSocket transport client
///
/// A single connection is shared by all tasks; requests are serialized over it.
#[derive(Clone, Debug)]
pub struct WsTransportClient {
	/// WebSocket connection state and stream
	pub connection: Arc<Mutex<WebSocketConnection>>,
	/// Manages WebSocket endpoint rotation
	endpoint_manager: Arc<EndpointManager>,
	/// Configuration settings for WebSocket connections
	config: WsConfig,
}

impl WsTransportClient {
	/// Creates a new WebSocket transport client
	///
	/// This constructor:
	/// 1. Tests each URL's connectivity with timeout, in the given order
	/// 2. Uses the first working URL as active
	/// 3. Keeps the other URLs as fallbacks
	pub async fn new(urls: &[String], config: Option<WsConfig>) -> Result<Self, anyhow::Error> {
		let config = config.unwrap_or_default();

		if urls.is_empty() {
			return Err(anyhow::anyhow!("No WebSocket URLs available"));
		}

		let mut active_url = None;
		let mut fallback_urls = Vec::new();

		for url in urls {
			if active_url.is_none() {
				match timeout(config.connection_timeout, connect_async(url.as_str())).await {
					Ok(Ok(_)) => {
						active_url = Some(url.clone());
						continue;
					}
					Ok(Err(e)) => {
						tracing::warn!("WS connect failed for {}: {}", url, e);
					}
					Err(e) => {
						tracing::warn!("WS connect timeout for {}: {}", url, e);
					}
				}
			}
			fallback_urls.push(url.clone());
		}

		let active_url =
			active_url.ok_or_else(|| anyhow::anyhow!("Failed to connect to any WebSocket URL"))?;
		let endpoint_manager = Arc::new(EndpointManager::new(&config, &active_url, fallback_urls));

		let client = Self {
			connection: Arc::new(Mutex::new(WebSocketConnection::default())),
			endpoint_manager,
			config,
		};

		client.connect().await?;

		Ok(client)
	}

	/// Establishes a connection to the active endpoint
	async fn connect(&self) -> Result<(), anyhow::Error> {
		let url = self.endpoint_manager.get_active_url().await?;
		self.try_connect(&url).await
	}

	/// Reopens the connection, rotating to a fallback when the active URL is unreachable
	async fn reconnect(&self) -> Result<(), anyhow::Error> {
		match self.connect().await {
			Ok(()) => Ok(()),
			Err(e) if self.endpoint_manager.should_rotate().await => {
				tracing::debug!("Reconnecting to active URL failed ({}), rotating", e);
				self.endpoint_manager.rotate_url(self).await
			}
			Err(e) => Err(e),
		}
	}

	async fn exchange(&self, qid: &str, message: &str) -> Result<NodeResponse, ExchangeFailure> {
		let mut connection = self.connection.lock().await;
		if !connection.is_connected() {
			return Err(ExchangeFailure::undelivered(TransportError::network(
				"Not connected",
				None,
				None,
			)));
		}

		tracing::trace!(idle = ?connection.idle_for(), "Reusing WebSocket connection");
		connection.update_activity();

		let result = match connection.stream.as_mut() {
			Some(stream) => round_trip(stream, qid, message, self.config.message_timeout).await,
			None => Err(ExchangeFailure::undelivered(TransportError::network(
				"Not connected",
				None,
				None,
			))),
		};

		if result.is_err() {
			connection.mark_broken();
		}
		result
	}
}

#[async_trait]
impl NodeTransport for WsTransportClient {
	fn kind(&self) -> TransportKind {
		TransportKind::Ws
	}

	async fn get_current_url(&self) -> String {
		self.endpoint_manager.active_url.read().await.clone()
	}

	async fn send_request(&self, qid: &str, request: NodeRequest) -> Result<Value, TransportError> {
		let message = ws_message(qid, &request)?.to_string();
		let mut reconnects = 0;

		loop {
			match self.exchange(qid, &message).await {
				Ok(reply) => return reply.into_result(request.operation()),
				Err(ExchangeFailure { error, delivered }) => {
					// A transaction the node may already hold is never sent twice
					if delivered && request.is_submission() {
						tracing::warn!(
							qid = %qid,
							"WebSocket {} failed after the request was sent: {}",
							request,
							error
						);
						return Err(error);
					}

					if reconnects >= self.config.max_reconnect_attempts {
						return Err(error);
					}
					reconnects += 1;

					tracing::warn!(
						"WebSocket request {} failed, reconnecting (attempt {}/{})",
						request,
						reconnects,
						self.config.max_reconnect_attempts
					);

					if reconnects > 1 {
						tokio::time::sleep(self.config.reconnect_timeout).await;
					}

					if let Err(reconnect_error) = self.reconnect().await {
						tracing::warn!("WebSocket reconnect failed: {}", reconnect_error);
					}
				}
			}
		}
	}
}

#[async_trait]
impl RotatingTransport for WsTransportClient {
	async fn try_connect(&self, url: &str) -> Result<(), anyhow::Error> {
		let mut connection = self.connection.lock().await;

		match timeout(self.config.connection_timeout, connect_async(url)).await {
			Ok(Ok((ws_stream, _))) => {
				connection.attach(ws_stream);
				Ok(())
			}
			Ok(Err(e)) => {
				connection.is_healthy = false;
				Err(anyhow::anyhow!("Failed to connect: {}", e))
			}
			Err(_) => {
				connection.is_healthy = false;
				Err(anyhow::anyhow!("Connection timeout"))
			}
		}
	}

	async fn update_client(&self, url: &str) -> Result<(), anyhow::Error> {
		*self.endpoint_manager.active_url.write().await = url.to_string();
		Ok(())
	}
}
