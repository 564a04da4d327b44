//! Operations a node transport can carry.

use std::fmt;

use crate::models::RawTransaction;

/// A single remote operation and its typed parameters
///
/// Each transport maps a request onto its own wire form: a JSON-RPC method, a REST
/// route or a WebSocket action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRequest {
	CurrentBlockHeight,
	CurrentBlockHash,
	BlockByHeight(u32),
	BlockByHash(String),
	BlockInfoByHeight(u32),
	RawTransaction(String),
	BlockHash(u32),
	BlockHeightByTxHash(String),
	BlockTxHashesByHeight(u32),
	Storage {
		contract_address: String,
		key: Vec<u8>,
	},
	SmartContractEvent(String),
	SmartContractEventsByBlock(u32),
	MerkleProof {
		block_height: u32,
		root_height: u32,
	},
	CrossStatesProof {
		height: u32,
		key: String,
	},
	HeaderByHeight(u32),
	StateMerkleRoot(u32),
	MemPoolTxState(String),
	MemPoolTxCount,
	Version,
	NetworkId,
	SendRawTransaction {
		tx: RawTransaction,
		pre_exec: bool,
	},
}

impl NodeRequest {
	/// Stable operation name used in logs and error metadata
	pub fn operation(&self) -> &'static str {
		match self {
			Self::CurrentBlockHeight => "get_current_block_height",
			Self::CurrentBlockHash => "get_current_block_hash",
			Self::BlockByHeight(_) => "get_block_by_height",
			Self::BlockByHash(_) => "get_block_by_hash",
			Self::BlockInfoByHeight(_) => "get_block_info_by_height",
			Self::RawTransaction(_) => "get_raw_transaction",
			Self::BlockHash(_) => "get_block_hash",
			Self::BlockHeightByTxHash(_) => "get_block_height_by_tx_hash",
			Self::BlockTxHashesByHeight(_) => "get_block_tx_hashes_by_height",
			Self::Storage { .. } => "get_storage",
			Self::SmartContractEvent(_) => "get_smart_contract_event",
			Self::SmartContractEventsByBlock(_) => "get_smart_contract_events_by_block",
			Self::MerkleProof { .. } => "get_merkle_proof",
			Self::CrossStatesProof { .. } => "get_cross_states_proof",
			Self::HeaderByHeight(_) => "get_header_by_height",
			Self::StateMerkleRoot(_) => "get_state_merkle_root",
			Self::MemPoolTxState(_) => "get_mem_pool_tx_state",
			Self::MemPoolTxCount => "get_mem_pool_tx_count",
			Self::Version => "get_version",
			Self::NetworkId => "get_network_id",
			Self::SendRawTransaction { pre_exec: true, .. } => "pre_exec_transaction",
			Self::SendRawTransaction { pre_exec: false, .. } => "send_raw_transaction",
		}
	}

	/// Whether the request changes node state and must reach the node at most once
	pub fn is_submission(&self) -> bool {
		matches!(self, Self::SendRawTransaction { .. })
	}
}

impl fmt::Display for NodeRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.operation())
	}
}
