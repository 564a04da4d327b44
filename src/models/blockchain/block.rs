//! Block, header and per-block transaction listing as returned by the node.

use serde::{Deserialize, Serialize};

use crate::models::blockchain::{hash::Uint256, transaction::Transaction};

/// Block header in the node's verbose JSON form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Header {
	#[serde(default)]
	pub version: u32,
	#[serde(rename = "ChainID", default)]
	pub chain_id: u64,
	pub prev_block_hash: Uint256,
	pub transactions_root: Uint256,
	#[serde(default)]
	pub cross_state_root: Option<Uint256>,
	#[serde(default)]
	pub block_root: Option<Uint256>,
	pub timestamp: u32,
	pub height: u32,
	#[serde(default)]
	pub consensus_data: u64,
	#[serde(default)]
	pub consensus_payload: String,
	#[serde(default)]
	pub next_bookkeeper: String,
	#[serde(default)]
	pub bookkeepers: Vec<String>,
	#[serde(default)]
	pub sig_data: Vec<String>,
	pub hash: Uint256,
}

/// A full block with its transactions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Block {
	pub hash: Uint256,
	#[serde(default)]
	pub size: u64,
	pub header: Header,
	#[serde(default)]
	pub transactions: Vec<Transaction>,
}

impl Block {
	pub fn height(&self) -> u32 {
		self.header.height
	}

	pub fn transaction_hashes(&self) -> Vec<Uint256> {
		self.transactions.iter().map(|tx| tx.hash).collect()
	}
}

/// Transaction hashes included in the block at a given height
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockTxHashes {
	pub hash: Uint256,
	pub height: u32,
	#[serde(default)]
	pub transactions: Vec<Uint256>,
}
