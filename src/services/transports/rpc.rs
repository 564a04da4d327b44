//! JSON-RPC transport for node interactions.
//!
//! Requests are `POST`ed to the active endpoint as
//! `{"jsonrpc":"2.0","method":..,"params":[..],"id":qid}` and the `result` of the reply is
//! returned once its `error` code is checked.

use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::{json, Value};
use std::{collections::HashMap, time::Duration};
use url::Url;

use crate::{
	models::TransportKind,
	services::transports::{
		response::parse_envelope, EndpointManager, HttpRequest, NodeRequest, NodeTransport,
		RotatingTransport, RpcResponse, SubmitRetryStrategy, TransientErrorRetryStrategy,
		TransportError,
	},
	utils::http::{create_retryable_http_client, RetryConfig},
};

/// Maps a request onto its JSON-RPC method name and positional parameters
pub(crate) fn rpc_call(request: &NodeRequest) -> (&'static str, Value) {
	match request {
		NodeRequest::CurrentBlockHeight => ("getblockcount", json!([])),
		NodeRequest::CurrentBlockHash => ("getbestblockhash", json!([])),
		NodeRequest::BlockByHeight(height) => ("getblock", json!([height, 1])),
		NodeRequest::BlockByHash(hash) => ("getblock", json!([hash, 1])),
		NodeRequest::BlockInfoByHeight(height) => ("getblockinfobyheight", json!([height])),
		NodeRequest::RawTransaction(hash) => ("getrawtransaction", json!([hash, 1])),
		NodeRequest::BlockHash(height) => ("getblockhash", json!([height])),
		NodeRequest::BlockHeightByTxHash(hash) => ("getblockheightbytxhash", json!([hash])),
		NodeRequest::BlockTxHashesByHeight(height) => ("getblocktxsbyheight", json!([height])),
		NodeRequest::Storage {
			contract_address,
			key,
		} => ("getstorage", json!([contract_address, hex::encode(key)])),
		NodeRequest::SmartContractEvent(hash) => ("getsmartcodeevent", json!([hash])),
		NodeRequest::SmartContractEventsByBlock(height) => ("getsmartcodeevent", json!([height])),
		NodeRequest::MerkleProof {
			block_height,
			root_height,
		} => ("getmerkleproof", json!([block_height, root_height])),
		NodeRequest::CrossStatesProof { height, key } => {
			("getcrossstatesproof", json!([height, key]))
		}
		NodeRequest::HeaderByHeight(height) => ("getheaderbyheight", json!([height, 1])),
		NodeRequest::StateMerkleRoot(height) => ("getstatemerkleroot", json!([height])),
		NodeRequest::MemPoolTxState(hash) => ("getmempooltxstate", json!([hash])),
		NodeRequest::MemPoolTxCount => ("getmempooltxcount", json!([])),
		NodeRequest::Version => ("getversion", json!([])),
		NodeRequest::NetworkId => ("getnetworkid", json!([])),
		NodeRequest::SendRawTransaction { tx, pre_exec } => (
			"sendrawtransaction",
			json!([tx.to_hex(), u8::from(*pre_exec)]),
		),
	}
}

/// `getblockcount` reports the number of blocks; the current height is one less
fn block_count_to_height(count: Value) -> Result<Value, TransportError> {
	let count = match &count {
		Value::Number(n) => n.as_u64(),
		Value::String(s) => s.parse::<u64>().ok(),
		_ => None,
	}
	.ok_or_else(|| {
		TransportError::response_parse(
			"Block count is not an unsigned integer",
			None,
			Some(HashMap::from([("result".to_string(), count.to_string())])),
		)
	})?;

	Ok(json!(count.saturating_sub(1)))
}

/// JSON-RPC transport client
///
/// The client is thread-safe and can be shared across multiple tasks.
#[derive(Clone, Debug)]
pub struct RpcTransportClient {
	/// Retryable HTTP client for making requests
	pub client: ClientWithMiddleware,
	/// Manages endpoint rotation for high availability
	endpoint_manager: EndpointManager,
}

impl RpcTransportClient {
	/// Creates a new JSON-RPC transport client
	///
	/// The first URL becomes the active endpoint and the rest are fallbacks. URLs are
	/// expected in preference order.
	///
	/// # Arguments
	/// * `urls` - Endpoint URLs, highest preference first
	/// * `retry_config` - Retry policy for transient HTTP failures
	///
	/// # Returns
	/// * `Result<Self, anyhow::Error>` - New client instance or configuration error
	pub fn new(urls: &[String], retry_config: &RetryConfig) -> Result<Self, anyhow::Error> {
		let (active_url, fallback_urls) = urls
			.split_first()
			.ok_or_else(|| anyhow::anyhow!("No RPC URLs provided"))?;

		for url in urls {
			Url::parse(url).with_context(|| format!("Invalid RPC URL: {}", url))?;
		}

		let base_http_client = reqwest::ClientBuilder::new()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(32)
			.timeout(Duration::from_secs(30))
			.connect_timeout(Duration::from_secs(20))
			.build()
			.context("Failed to create base HTTP client")?;

		let submit_client = create_retryable_http_client(
			retry_config,
			base_http_client.clone(),
			Some(SubmitRetryStrategy),
		);
		let client = create_retryable_http_client(
			retry_config,
			base_http_client,
			Some(TransientErrorRetryStrategy),
		);

		Ok(Self {
			endpoint_manager: EndpointManager::new(
				client.clone(),
				active_url,
				fallback_urls.to_vec(),
			)
			.with_submit_client(submit_client),
			client,
		})
	}

	/// Builds the JSON-RPC request body for `request`
	pub fn request_body(qid: &str, request: &NodeRequest) -> Value {
		let (method, params) = rpc_call(request);
		json!({
			"jsonrpc": "2.0",
			"method": method,
			"params": params,
			"id": qid,
		})
	}
}

#[async_trait]
impl NodeTransport for RpcTransportClient {
	fn kind(&self) -> TransportKind {
		TransportKind::Rpc
	}

	async fn get_current_url(&self) -> String {
		self.endpoint_manager.active_url.read().await.clone()
	}

	async fn send_request(&self, qid: &str, request: NodeRequest) -> Result<Value, TransportError> {
		let body = Self::request_body(qid, &request);
		let http_request = if request.is_submission() {
			HttpRequest::Submit {
				path: String::new(),
				body,
			}
		} else {
			HttpRequest::Post {
				path: String::new(),
				body,
			}
		};

		let raw = self
			.endpoint_manager
			.send_request(self, &http_request)
			.await?;

		let response: RpcResponse = parse_envelope(raw, request.operation())?;
		let result = response.into_result(request.operation())?;

		match request {
			NodeRequest::CurrentBlockHeight => block_count_to_height(result),
			_ => Ok(result),
		}
	}
}

#[async_trait]
impl RotatingTransport for RpcTransportClient {
	async fn try_connect(&self, url: &str) -> Result<(), anyhow::Error> {
		let url = Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL: {}", url))?;
		let test_request = Self::request_body("0", &NodeRequest::Version);

		match self.client.post(url.clone()).json(&test_request).send().await {
			Ok(response) if response.status().is_success() => Ok(()),
			Ok(response) => Err(anyhow::anyhow!(
				"Failed to connect to {}: {}",
				url,
				response.status().as_u16()
			)),
			Err(e) => Err(anyhow::anyhow!("Failed to connect to {}: {}", url, e)),
		}
	}

	async fn update_client(&self, url: &str) -> Result<(), anyhow::Error> {
		Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL: {}", url))?;
		*self.endpoint_manager.active_url.write().await = url.to_string();
		Ok(())
	}
}
