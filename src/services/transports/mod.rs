//! Node transport implementations.
//!
//! Provides the transport abstraction the client manager talks to and the concrete
//! implementations for the protocols a node exposes:
//!
//! - JSON-RPC over HTTP
//! - REST over HTTP
//! - WebSocket

mod http {
	pub mod endpoint_manager;
}
mod ws {
	pub mod config;
	pub mod connection;
	pub mod endpoint_manager;
	pub mod transport;
}

mod error;
mod request;
mod response;
mod rest;
mod rpc;

pub use error::TransportError;
pub use http::endpoint_manager::{EndpointManager, HttpRequest};
pub use request::NodeRequest;
pub use response::{NodeResponse, RpcResponse};
pub use rest::RestTransportClient;
pub use rpc::RpcTransportClient;
pub use ws::{config::WsConfig, transport::WsTransportClient};

use async_trait::async_trait;
use reqwest_retry::{
	default_on_request_failure, default_on_request_success, Retryable, RetryableStrategy,
};
use serde_json::Value;

use crate::models::{RawTransaction, TransportKind};

/// HTTP status codes that trigger endpoint rotation
/// - 429: Too Many Requests - indicates rate limiting from the current endpoint
pub const ROTATE_ON_ERROR_CODES: [u16; 1] = [429];

/// Capability shared by every node transport
///
/// Implementors only provide [`NodeTransport::send_request`]; each remote operation is a
/// provided method that builds the matching [`NodeRequest`]. Every method returns the
/// undecoded `Result` payload of the node's reply.
#[async_trait]
pub trait NodeTransport: Send + Sync {
	/// The protocol this transport speaks
	fn kind(&self) -> TransportKind;

	/// Get the current URL being used by the transport
	async fn get_current_url(&self) -> String;

	/// Send a request tagged with the correlation id `qid`
	async fn send_request(&self, qid: &str, request: NodeRequest) -> Result<Value, TransportError>;

	async fn get_current_block_height(&self, qid: &str) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::CurrentBlockHeight).await
	}

	async fn get_current_block_hash(&self, qid: &str) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::CurrentBlockHash).await
	}

	async fn get_block_by_height(&self, qid: &str, height: u32) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::BlockByHeight(height)).await
	}

	async fn get_block_by_hash(&self, qid: &str, hash: &str) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::BlockByHash(hash.to_string()))
			.await
	}

	async fn get_block_info_by_height(
		&self,
		qid: &str,
		height: u32,
	) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::BlockInfoByHeight(height))
			.await
	}

	async fn get_raw_transaction(&self, qid: &str, tx_hash: &str) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::RawTransaction(tx_hash.to_string()))
			.await
	}

	async fn get_block_hash(&self, qid: &str, height: u32) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::BlockHash(height)).await
	}

	async fn get_block_height_by_tx_hash(
		&self,
		qid: &str,
		tx_hash: &str,
	) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::BlockHeightByTxHash(tx_hash.to_string()))
			.await
	}

	async fn get_block_tx_hashes_by_height(
		&self,
		qid: &str,
		height: u32,
	) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::BlockTxHashesByHeight(height))
			.await
	}

	async fn get_storage(
		&self,
		qid: &str,
		contract_address: &str,
		key: &[u8],
	) -> Result<Value, TransportError> {
		self.send_request(
			qid,
			NodeRequest::Storage {
				contract_address: contract_address.to_string(),
				key: key.to_vec(),
			},
		)
		.await
	}

	async fn get_smart_contract_event(
		&self,
		qid: &str,
		tx_hash: &str,
	) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::SmartContractEvent(tx_hash.to_string()))
			.await
	}

	async fn get_smart_contract_events_by_block(
		&self,
		qid: &str,
		height: u32,
	) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::SmartContractEventsByBlock(height))
			.await
	}

	async fn get_merkle_proof(
		&self,
		qid: &str,
		block_height: u32,
		root_height: u32,
	) -> Result<Value, TransportError> {
		self.send_request(
			qid,
			NodeRequest::MerkleProof {
				block_height,
				root_height,
			},
		)
		.await
	}

	async fn get_cross_states_proof(
		&self,
		qid: &str,
		height: u32,
		key: &str,
	) -> Result<Value, TransportError> {
		self.send_request(
			qid,
			NodeRequest::CrossStatesProof {
				height,
				key: key.to_string(),
			},
		)
		.await
	}

	async fn get_header_by_height(&self, qid: &str, height: u32) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::HeaderByHeight(height))
			.await
	}

	async fn get_state_merkle_root(&self, qid: &str, height: u32) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::StateMerkleRoot(height))
			.await
	}

	async fn get_mem_pool_tx_state(
		&self,
		qid: &str,
		tx_hash: &str,
	) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::MemPoolTxState(tx_hash.to_string()))
			.await
	}

	async fn get_mem_pool_tx_count(&self, qid: &str) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::MemPoolTxCount).await
	}

	async fn get_version(&self, qid: &str) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::Version).await
	}

	async fn get_network_id(&self, qid: &str) -> Result<Value, TransportError> {
		self.send_request(qid, NodeRequest::NetworkId).await
	}

	async fn send_raw_transaction(
		&self,
		qid: &str,
		tx: &RawTransaction,
		pre_exec: bool,
	) -> Result<Value, TransportError> {
		self.send_request(
			qid,
			NodeRequest::SendRawTransaction {
				tx: tx.clone(),
				pre_exec,
			},
		)
		.await
	}
}

/// Extension trait for transports that support URL rotation
#[async_trait]
pub trait RotatingTransport: NodeTransport {
	/// Attempts to establish a connection with a new URL
	async fn try_connect(&self, url: &str) -> Result<(), anyhow::Error>;

	/// Updates the client with a new URL
	async fn update_client(&self, url: &str) -> Result<(), anyhow::Error>;
}

/// A default retry strategy that retries on requests based on the status code
/// This can be used to customise the retry strategy
pub struct TransientErrorRetryStrategy;
impl RetryableStrategy for TransientErrorRetryStrategy {
	fn handle(
		&self,
		res: &Result<reqwest::Response, reqwest_middleware::Error>,
	) -> Option<Retryable> {
		match res {
			Ok(success) => default_on_request_success(success),
			Err(error) => default_on_request_failure(error),
		}
	}
}

/// Retry strategy for transaction submits
///
/// A submit that failed may still have reached the node, so every failure is fatal.
pub struct SubmitRetryStrategy;
impl RetryableStrategy for SubmitRetryStrategy {
	fn handle(
		&self,
		res: &Result<reqwest::Response, reqwest_middleware::Error>,
	) -> Option<Retryable> {
		match res {
			Ok(success) if success.status().is_success() => None,
			Ok(_) | Err(_) => Some(Retryable::Fatal),
		}
	}
}
