//! Smart contract execution events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::blockchain::hash::Uint256;

/// A single notification emitted by a contract during execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotifyEventInfo {
	pub contract_address: String,
	#[serde(default)]
	pub states: Value,
}

/// Execution outcome and notifications of one transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SmartContractEvent {
	pub tx_hash: Uint256,
	pub state: u8,
	#[serde(default)]
	pub gas_consumed: u64,
	#[serde(default)]
	pub notify: Vec<NotifyEventInfo>,
}
