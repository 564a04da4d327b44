//! Decoding of node replies into domain types.
//!
//! Every function takes the `Result` payload a transport returned and either produces
//! a fully populated value or a [`DecodeError`] naming the decoder and quoting the
//! payload. Numbers are accepted both as JSON numbers and as decimal strings since
//! nodes use either depending on the transport.

mod error;

pub use error::DecodeError;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::str::FromStr;

use crate::models::{
	Block, BlockTxHashes, Header, MemPoolTxCount, MemPoolTxState, MerkleProof, PreExecResult,
	SmartContractEvent, Transaction, Uint256,
};

fn decode<T: DeserializeOwned>(operation: &str, raw: &Value) -> Result<T, DecodeError> {
	T::deserialize(raw).map_err(|e| {
		DecodeError::new(
			operation,
			format!("Unexpected {} payload", operation),
			Some(Box::new(e)),
			raw,
		)
	})
}

pub fn get_uint32(raw: &Value) -> Result<u32, DecodeError> {
	let parsed = match raw {
		Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
		Value::String(s) => s.trim().parse::<u32>().ok(),
		_ => None,
	};

	parsed.ok_or_else(|| {
		DecodeError::new(
			"get_uint32",
			"Expected an unsigned 32-bit integer",
			None,
			raw,
		)
	})
}

pub fn get_uint256(raw: &Value) -> Result<Uint256, DecodeError> {
	let text = raw
		.as_str()
		.ok_or_else(|| DecodeError::new("get_uint256", "Expected a hex string", None, raw))?;

	Uint256::from_str(text).map_err(|e| {
		DecodeError::new("get_uint256", "Invalid 32-byte hash", Some(Box::new(e)), raw)
	})
}

pub fn get_block(raw: &Value) -> Result<Block, DecodeError> {
	decode("get_block", raw)
}

pub fn get_header(raw: &Value) -> Result<Header, DecodeError> {
	decode("get_header", raw)
}

pub fn get_transaction(raw: &Value) -> Result<Transaction, DecodeError> {
	decode("get_transaction", raw)
}

pub fn get_block_tx_hashes(raw: &Value) -> Result<BlockTxHashes, DecodeError> {
	decode("get_block_tx_hashes", raw)
}

/// Storage values arrive hex encoded; a missing key yields an empty value
pub fn get_storage(raw: &Value) -> Result<Vec<u8>, DecodeError> {
	match raw {
		Value::Null => Ok(Vec::new()),
		Value::String(s) if s.is_empty() => Ok(Vec::new()),
		Value::String(s) => hex::decode(s).map_err(|e| {
			DecodeError::new("get_storage", "Invalid hex storage value", Some(Box::new(e)), raw)
		}),
		_ => Err(DecodeError::new(
			"get_storage",
			"Expected a hex string",
			None,
			raw,
		)),
	}
}

/// `None` when the node has no event recorded for the transaction
pub fn get_smart_contract_event(raw: &Value) -> Result<Option<SmartContractEvent>, DecodeError> {
	if is_absent(raw) {
		return Ok(None);
	}
	decode("get_smart_contract_event", raw).map(Some)
}

pub fn get_smart_contract_events(raw: &Value) -> Result<Vec<SmartContractEvent>, DecodeError> {
	if is_absent(raw) {
		return Ok(Vec::new());
	}
	decode("get_smart_contract_events", raw)
}

pub fn get_merkle_proof(raw: &Value) -> Result<MerkleProof, DecodeError> {
	decode("get_merkle_proof", raw)
}

pub fn get_cross_states_proof(raw: &Value) -> Result<MerkleProof, DecodeError> {
	decode("get_cross_states_proof", raw)
}

pub fn get_mem_pool_tx_state(raw: &Value) -> Result<MemPoolTxState, DecodeError> {
	decode("get_mem_pool_tx_state", raw)
}

pub fn get_mem_pool_tx_count(raw: &Value) -> Result<MemPoolTxCount, DecodeError> {
	decode("get_mem_pool_tx_count", raw)
}

pub fn get_version(raw: &Value) -> Result<String, DecodeError> {
	match raw {
		Value::String(s) => Ok(s.clone()),
		Value::Number(n) => Ok(n.to_string()),
		_ => Err(DecodeError::new(
			"get_version",
			"Expected a version string",
			None,
			raw,
		)),
	}
}

pub fn get_state_merkle_root(raw: &Value) -> Result<String, DecodeError> {
	let root = raw.as_str().ok_or_else(|| {
		DecodeError::new("get_state_merkle_root", "Expected a hex string", None, raw)
	})?;

	hex::decode(root).map_err(|e| {
		DecodeError::new(
			"get_state_merkle_root",
			"Invalid hex merkle root",
			Some(Box::new(e)),
			raw,
		)
	})?;

	Ok(root.to_string())
}

pub fn get_pre_exec_result(raw: &Value) -> Result<PreExecResult, DecodeError> {
	decode("get_pre_exec_result", raw)
}

fn is_absent(raw: &Value) -> bool {
	match raw {
		Value::Null => true,
		Value::String(s) => s.is_empty(),
		_ => false,
	}
}
