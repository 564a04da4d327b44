//! Transactions, raw signed payloads and pre-execution results.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::models::blockchain::{event::NotifyEventInfo, hash::Uint256};

/// Signature attached to a transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Sig {
	#[serde(default)]
	pub pub_keys: Vec<String>,
	#[serde(default)]
	pub m: u16,
	#[serde(default)]
	pub sig_data: Vec<String>,
}

/// A transaction in the node's verbose JSON form
///
/// The payload is kept as JSON; its shape depends on the transaction type and is not
/// interpreted by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Transaction {
	#[serde(default)]
	pub version: u8,
	#[serde(default)]
	pub tx_type: u8,
	#[serde(default)]
	pub nonce: u32,
	#[serde(rename = "ChainID", default)]
	pub chain_id: u64,
	#[serde(default)]
	pub payload: Value,
	#[serde(default)]
	pub attributes: Value,
	#[serde(default)]
	pub payer: Option<String>,
	#[serde(default)]
	pub sigs: Vec<Sig>,
	pub hash: Uint256,
}

/// A serialized, signed transaction ready to be submitted to the node
///
/// Building and signing transactions happens outside this crate; the client only
/// forwards the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTransaction(Vec<u8>);

impl RawTransaction {
	pub fn new(bytes: Vec<u8>) -> Self {
		Self(bytes)
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	pub fn to_hex(&self) -> String {
		hex::encode(&self.0)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<Vec<u8>> for RawTransaction {
	fn from(bytes: Vec<u8>) -> Self {
		Self(bytes)
	}
}

impl FromStr for RawTransaction {
	type Err = hex::FromHexError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
		hex::decode(trimmed).map(Self)
	}
}

/// Result of simulating a transaction without committing it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreExecResult {
	pub state: u8,
	#[serde(default)]
	pub gas: u64,
	#[serde(default)]
	pub result: Value,
	#[serde(default)]
	pub notify: Vec<NotifyEventInfo>,
}

impl PreExecResult {
	/// The node reports state 1 for a successful execution
	pub fn is_success(&self) -> bool {
		self.state == 1
	}
}
