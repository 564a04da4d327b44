//! Client manager: one facade over the RPC, REST and WebSocket transports.
//!
//! Every query picks the active transport (explicit default first, then RPC, REST and
//! WebSocket), tags the request with a fresh correlation id and decodes the reply.

use serde_json::Value;
use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
	time::Duration,
};

use crate::{
	models::{
		Block, BlockTxHashes, ClientConfig, ConfigLoader, Header, MemPoolTxCount,
		MemPoolTxState, MerkleProof, PreExecResult, RawTransaction, SmartContractEvent,
		Transaction, TransportKind, Uint256,
	},
	services::{
		client::ClientError,
		decoder,
		transports::{NodeTransport, RestTransportClient, RpcTransportClient, WsTransportClient},
	},
};

/// Blocks to wait for when the caller does not say
pub const DEFAULT_WAIT_BLOCK_COUNT: u32 = 2;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Facade over the configured node transports
///
/// Transports are registered during setup and shared as `Arc<dyn NodeTransport>`; the
/// manager itself is `Send + Sync` and can be shared across tasks.
#[derive(Default)]
pub struct ClientManager {
	rpc: Option<Arc<dyn NodeTransport>>,
	rest: Option<Arc<dyn NodeTransport>>,
	ws: Option<Arc<dyn NodeTransport>>,
	default: Option<Arc<dyn NodeTransport>>,
	chain_id: u64,
	qid: AtomicU64,
}

impl ClientManager {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds every transport that has URLs in `config`
	///
	/// The transport named by `default_transport` is also registered as the explicit
	/// default client.
	pub async fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
		config.validate().map_err(|e| {
			ClientError::config("Invalid client configuration", Some(Box::new(e)), None)
		})?;

		let mut manager = Self::new();
		manager.set_chain_id(config.chain_id);

		let rpc_urls = config.active_urls(TransportKind::Rpc);
		if !rpc_urls.is_empty() {
			let client = RpcTransportClient::new(&rpc_urls, &config.retry)
				.map_err(|e| transport_setup_error(TransportKind::Rpc, e))?;
			manager.set_rpc_client(Arc::new(client));
		}

		let rest_urls = config.active_urls(TransportKind::Rest);
		if !rest_urls.is_empty() {
			let client = RestTransportClient::new(&rest_urls, &config.retry)
				.map_err(|e| transport_setup_error(TransportKind::Rest, e))?;
			manager.set_rest_client(Arc::new(client));
		}

		let ws_urls = config.active_urls(TransportKind::Ws);
		if !ws_urls.is_empty() {
			let client = WsTransportClient::new(&ws_urls, Some(config.ws.clone()))
				.await
				.map_err(|e| transport_setup_error(TransportKind::Ws, e))?;
			manager.set_ws_client(Arc::new(client));
		}

		if let Some(kind) = config.default_transport {
			let default = match kind {
				TransportKind::Rpc => manager.rpc_client(),
				TransportKind::Rest => manager.rest_client(),
				TransportKind::Ws => manager.ws_client(),
				TransportKind::Custom => None,
			}
			.ok_or_else(|| {
				ClientError::config(
					format!("Default transport '{}' is not configured", kind),
					None,
					None,
				)
			})?;
			manager.set_default_client(default);
		}

		tracing::debug!(
			chain_id = manager.chain_id,
			rpc = manager.rpc.is_some(),
			rest = manager.rest.is_some(),
			ws = manager.ws.is_some(),
			"Client manager initialized"
		);

		Ok(manager)
	}

	pub fn set_rpc_client(&mut self, client: Arc<dyn NodeTransport>) {
		self.rpc = Some(client);
	}

	pub fn rpc_client(&self) -> Option<Arc<dyn NodeTransport>> {
		self.rpc.clone()
	}

	pub fn set_rest_client(&mut self, client: Arc<dyn NodeTransport>) {
		self.rest = Some(client);
	}

	pub fn rest_client(&self) -> Option<Arc<dyn NodeTransport>> {
		self.rest.clone()
	}

	pub fn set_ws_client(&mut self, client: Arc<dyn NodeTransport>) {
		self.ws = Some(client);
	}

	pub fn ws_client(&self) -> Option<Arc<dyn NodeTransport>> {
		self.ws.clone()
	}

	/// Registers a client that takes precedence over every protocol-specific one
	pub fn set_default_client(&mut self, client: Arc<dyn NodeTransport>) {
		self.default = Some(client);
	}

	pub fn default_client(&self) -> Option<Arc<dyn NodeTransport>> {
		self.default.clone()
	}

	pub fn chain_id(&self) -> u64 {
		self.chain_id
	}

	pub fn set_chain_id(&mut self, chain_id: u64) {
		self.chain_id = chain_id;
	}

	/// Returns the next correlation id; the first one is `"1"`
	pub fn next_qid(&self) -> String {
		self.qid
			.fetch_add(1, Ordering::SeqCst)
			.wrapping_add(1)
			.to_string()
	}

	/// The transport requests go to: default, then RPC, REST and WebSocket
	pub fn active_client(&self) -> Result<Arc<dyn NodeTransport>, ClientError> {
		self.default
			.as_ref()
			.or(self.rpc.as_ref())
			.or(self.rest.as_ref())
			.or(self.ws.as_ref())
			.cloned()
			.ok_or(ClientError::NoAvailableClient)
	}

	pub async fn get_current_block_height(&self) -> Result<u32, ClientError> {
		let client = self.active_client()?;
		let raw = client.get_current_block_height(&self.next_qid()).await?;
		Ok(decoder::get_uint32(&raw)?)
	}

	pub async fn get_current_block_hash(&self) -> Result<Uint256, ClientError> {
		let client = self.active_client()?;
		let raw = client.get_current_block_hash(&self.next_qid()).await?;
		Ok(decoder::get_uint256(&raw)?)
	}

	pub async fn get_block_by_height(&self, height: u32) -> Result<Block, ClientError> {
		let client = self.active_client()?;
		let raw = client.get_block_by_height(&self.next_qid(), height).await?;
		Ok(decoder::get_block(&raw)?)
	}

	pub async fn get_block_by_hash(&self, block_hash: &str) -> Result<Block, ClientError> {
		let client = self.active_client()?;
		let raw = client.get_block_by_hash(&self.next_qid(), block_hash).await?;
		Ok(decoder::get_block(&raw)?)
	}

	/// Returns the node's reply as-is
	pub async fn get_block_info_by_height(&self, height: u32) -> Result<Value, ClientError> {
		let client = self.active_client()?;
		Ok(client
			.get_block_info_by_height(&self.next_qid(), height)
			.await?)
	}

	pub async fn get_transaction(&self, tx_hash: &str) -> Result<Transaction, ClientError> {
		let client = self.active_client()?;
		let raw = client.get_raw_transaction(&self.next_qid(), tx_hash).await?;
		Ok(decoder::get_transaction(&raw)?)
	}

	pub async fn get_block_hash(&self, height: u32) -> Result<Uint256, ClientError> {
		let client = self.active_client()?;
		let raw = client.get_block_hash(&self.next_qid(), height).await?;
		Ok(decoder::get_uint256(&raw)?)
	}

	pub async fn get_block_height_by_tx_hash(&self, tx_hash: &str) -> Result<u32, ClientError> {
		let client = self.active_client()?;
		let raw = client
			.get_block_height_by_tx_hash(&self.next_qid(), tx_hash)
			.await?;
		Ok(decoder::get_uint32(&raw)?)
	}

	pub async fn get_block_tx_hashes_by_height(
		&self,
		height: u32,
	) -> Result<BlockTxHashes, ClientError> {
		let client = self.active_client()?;
		let raw = client
			.get_block_tx_hashes_by_height(&self.next_qid(), height)
			.await?;
		Ok(decoder::get_block_tx_hashes(&raw)?)
	}

	/// Reads a contract storage value; an absent key yields an empty vector
	pub async fn get_storage(
		&self,
		contract_address: &str,
		key: &[u8],
	) -> Result<Vec<u8>, ClientError> {
		let client = self.active_client()?;
		let raw = client
			.get_storage(&self.next_qid(), contract_address, key)
			.await?;
		Ok(decoder::get_storage(&raw)?)
	}

	pub async fn get_smart_contract_event(
		&self,
		tx_hash: &str,
	) -> Result<Option<SmartContractEvent>, ClientError> {
		let client = self.active_client()?;
		let raw = client
			.get_smart_contract_event(&self.next_qid(), tx_hash)
			.await?;
		Ok(decoder::get_smart_contract_event(&raw)?)
	}

	pub async fn get_smart_contract_events_by_block(
		&self,
		height: u32,
	) -> Result<Vec<SmartContractEvent>, ClientError> {
		let client = self.active_client()?;
		let raw = client
			.get_smart_contract_events_by_block(&self.next_qid(), height)
			.await?;
		Ok(decoder::get_smart_contract_events(&raw)?)
	}

	pub async fn get_merkle_proof(
		&self,
		block_height: u32,
		root_height: u32,
	) -> Result<MerkleProof, ClientError> {
		let client = self.active_client()?;
		let raw = client
			.get_merkle_proof(&self.next_qid(), block_height, root_height)
			.await?;
		Ok(decoder::get_merkle_proof(&raw)?)
	}

	pub async fn get_cross_states_proof(
		&self,
		height: u32,
		key: &str,
	) -> Result<MerkleProof, ClientError> {
		let client = self.active_client()?;
		let raw = client
			.get_cross_states_proof(&self.next_qid(), height, key)
			.await?;
		Ok(decoder::get_cross_states_proof(&raw)?)
	}

	pub async fn get_header_by_height(&self, height: u32) -> Result<Header, ClientError> {
		let client = self.active_client()?;
		let raw = client.get_header_by_height(&self.next_qid(), height).await?;
		Ok(decoder::get_header(&raw)?)
	}

	pub async fn get_state_merkle_root(&self, height: u32) -> Result<String, ClientError> {
		let client = self.active_client()?;
		let raw = client.get_state_merkle_root(&self.next_qid(), height).await?;
		Ok(decoder::get_state_merkle_root(&raw)?)
	}

	pub async fn get_mem_pool_tx_state(
		&self,
		tx_hash: &str,
	) -> Result<MemPoolTxState, ClientError> {
		let client = self.active_client()?;
		let raw = client.get_mem_pool_tx_state(&self.next_qid(), tx_hash).await?;
		Ok(decoder::get_mem_pool_tx_state(&raw)?)
	}

	pub async fn get_mem_pool_tx_count(&self) -> Result<MemPoolTxCount, ClientError> {
		let client = self.active_client()?;
		let raw = client.get_mem_pool_tx_count(&self.next_qid()).await?;
		Ok(decoder::get_mem_pool_tx_count(&raw)?)
	}

	pub async fn get_version(&self) -> Result<String, ClientError> {
		let client = self.active_client()?;
		let raw = client.get_version(&self.next_qid()).await?;
		Ok(decoder::get_version(&raw)?)
	}

	pub async fn get_network_id(&self) -> Result<u32, ClientError> {
		let client = self.active_client()?;
		let raw = client.get_network_id(&self.next_qid()).await?;
		Ok(decoder::get_uint32(&raw)?)
	}

	/// Submits a signed transaction and returns its hash
	pub async fn send_transaction(&self, tx: &RawTransaction) -> Result<Uint256, ClientError> {
		let client = self.active_client()?;
		let raw = client
			.send_raw_transaction(&self.next_qid(), tx, false)
			.await?;
		Ok(decoder::get_uint256(&raw)?)
	}

	/// Simulates a transaction without committing it
	pub async fn pre_exec_transaction(
		&self,
		tx: &RawTransaction,
	) -> Result<PreExecResult, ClientError> {
		let client = self.active_client()?;
		let raw = client
			.send_raw_transaction(&self.next_qid(), tx, true)
			.await?;
		Ok(decoder::get_pre_exec_result(&raw)?)
	}

	/// Waits until the chain has grown by `block_count` blocks (default 2)
	///
	/// Polls the current height once per second for at most `max(timeout secs, 1)`
	/// ticks. A failed height read during polling is treated as a missed tick; a
	/// failed initial read is returned immediately.
	pub async fn wait_for_generate_block(
		&self,
		timeout: Duration,
		block_count: Option<u32>,
	) -> Result<bool, ClientError> {
		let block_count = match block_count {
			None | Some(0) => DEFAULT_WAIT_BLOCK_COUNT,
			Some(count) => count,
		};

		let start_height = self.get_current_block_height().await?;
		let ticks = timeout.as_secs().max(1);

		tracing::debug!(
			start_height,
			block_count,
			ticks,
			"Waiting for blocks to be generated"
		);

		for tick in 1..=ticks {
			tokio::time::sleep(POLL_INTERVAL).await;

			let height = match self.get_current_block_height().await {
				Ok(height) => height,
				Err(e) => {
					tracing::debug!(tick, "Skipping tick after height read failure: {}", e);
					continue;
				}
			};

			if height.saturating_sub(start_height) >= block_count {
				tracing::debug!(tick, height, "Requested blocks generated");
				return Ok(true);
			}
		}

		Err(ClientError::timeout(
			format!("Wait for generate block timeout after {} seconds", ticks),
			None,
			Some(HashMap::from([
				("start_height".to_string(), start_height.to_string()),
				("block_count".to_string(), block_count.to_string()),
			])),
		))
	}
}

fn transport_setup_error(kind: TransportKind, error: anyhow::Error) -> ClientError {
	ClientError::config(
		format!("Failed to create {} transport", kind),
		Some(error.into()),
		Some(HashMap::from([("transport".to_string(), kind.to_string())])),
	)
}
