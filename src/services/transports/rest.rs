//! REST transport for node interactions.
//!
//! Queries are `GET` requests under `/api/v1/`; transactions are `POST`ed to
//! `/api/v1/transaction`. Every reply uses the node's
//! `{"Action","Desc","Error","Result","Version"}` envelope.

use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::{json, Value};
use std::{collections::HashMap, time::Duration};
use url::Url;

use crate::{
	models::TransportKind,
	services::transports::{
		http::endpoint_manager::join_url, response::parse_envelope, EndpointManager,
		HttpRequest, NodeRequest, NodeResponse, NodeTransport, RotatingTransport,
		SubmitRetryStrategy, TransientErrorRetryStrategy, TransportError,
	},
	utils::http::{create_retryable_http_client, RetryConfig},
};

const API_PREFIX: &str = "/api/v1";
const REST_VERSION: &str = "1.0.0";

/// Maps a request onto a REST route
pub(crate) fn rest_route(request: &NodeRequest) -> Result<HttpRequest, TransportError> {
	let get = |path: String| HttpRequest::Get {
		path: format!("{}{}", API_PREFIX, path),
	};

	let route = match request {
		NodeRequest::CurrentBlockHeight => get("/block/height".to_string()),
		NodeRequest::CurrentBlockHash => get("/block/besthash".to_string()),
		NodeRequest::BlockByHeight(height) => get(format!("/block/details/height/{}", height)),
		NodeRequest::BlockByHash(hash) => get(format!("/block/details/hash/{}", hash)),
		NodeRequest::BlockInfoByHeight(_) => {
			return Err(TransportError::unsupported(
				"REST has no block info route",
				Some(HashMap::from([(
					"operation".to_string(),
					request.operation().to_string(),
				)])),
			));
		}
		NodeRequest::RawTransaction(hash) => get(format!("/transaction/{}?raw=0", hash)),
		NodeRequest::BlockHash(height) => get(format!("/block/hash/{}", height)),
		NodeRequest::BlockHeightByTxHash(hash) => get(format!("/block/height/txhash/{}", hash)),
		NodeRequest::BlockTxHashesByHeight(height) => {
			get(format!("/block/transactions/height/{}", height))
		}
		NodeRequest::Storage {
			contract_address,
			key,
		} => get(format!("/storage/{}/{}", contract_address, hex::encode(key))),
		NodeRequest::SmartContractEvent(hash) => {
			get(format!("/smartcode/event/txhash/{}", hash))
		}
		NodeRequest::SmartContractEventsByBlock(height) => {
			get(format!("/smartcode/event/transactions/{}", height))
		}
		NodeRequest::MerkleProof {
			block_height,
			root_height,
		} => get(format!("/merkleproof/{}/{}", block_height, root_height)),
		NodeRequest::CrossStatesProof { height, key } => {
			get(format!("/crossstatesproof/{}/{}", height, key))
		}
		NodeRequest::HeaderByHeight(height) => get(format!("/header/height/{}", height)),
		NodeRequest::StateMerkleRoot(height) => get(format!("/statemerkleroot/{}", height)),
		NodeRequest::MemPoolTxState(hash) => get(format!("/mempool/txstate/{}", hash)),
		NodeRequest::MemPoolTxCount => get("/mempool/txcount".to_string()),
		NodeRequest::Version => get("/version".to_string()),
		NodeRequest::NetworkId => get("/networkid".to_string()),
		NodeRequest::SendRawTransaction { tx, pre_exec } => {
			let path = if *pre_exec {
				format!("{}/transaction?preExec=1", API_PREFIX)
			} else {
				format!("{}/transaction", API_PREFIX)
			};
			HttpRequest::Submit {
				path,
				body: json!({
					"Action": "sendrawtransaction",
					"Version": REST_VERSION,
					"Data": tx.to_hex(),
				}),
			}
		}
	};

	Ok(route)
}

/// REST transport client
///
/// The client is thread-safe and can be shared across multiple tasks.
#[derive(Clone, Debug)]
pub struct RestTransportClient {
	/// Retryable HTTP client for making requests
	pub client: ClientWithMiddleware,
	/// Manages endpoint rotation for high availability
	endpoint_manager: EndpointManager,
}

impl RestTransportClient {
	/// Creates a new REST transport client
	///
	/// # Arguments
	/// * `urls` - Endpoint base URLs, highest preference first
	/// * `retry_config` - Retry policy for transient HTTP failures
	pub fn new(urls: &[String], retry_config: &RetryConfig) -> Result<Self, anyhow::Error> {
		let (active_url, fallback_urls) = urls
			.split_first()
			.ok_or_else(|| anyhow::anyhow!("No REST URLs provided"))?;

		for url in urls {
			Url::parse(url).with_context(|| format!("Invalid REST URL: {}", url))?;
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
}

#[async_trait]
impl NodeTransport for RestTransportClient {
	fn kind(&self) -> TransportKind {
		TransportKind::Rest
	}

	async fn get_current_url(&self) -> String {
		self.endpoint_manager.active_url.read().await.clone()
	}

	/// REST routes are addressed by path alone, so `qid` only appears in logs
	async fn send_request(&self, qid: &str, request: NodeRequest) -> Result<Value, TransportError> {
		let http_request = rest_route(&request)?;
		tracing::trace!(qid = %qid, operation = %request, "Sending REST request");

		let raw = self
			.endpoint_manager
			.send_request(self, &http_request)
			.await?;

		let response: NodeResponse = parse_envelope(raw, request.operation())?;
		response.into_result(request.operation())
	}
}

#[async_trait]
impl RotatingTransport for RestTransportClient {
	async fn try_connect(&self, url: &str) -> Result<(), anyhow::Error> {
		Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL: {}", url))?;
		let version_url = join_url(url, &format!("{}/version", API_PREFIX));

		match self.client.get(&version_url).send().await {
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
