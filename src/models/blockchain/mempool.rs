//! Transaction pool state.

use serde::{Deserialize, Serialize};

/// Verification state of a pooled transaction at a given height
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemPoolTxStateItem {
	pub height: u32,
	#[serde(rename = "Type")]
	pub state_type: i32,
	pub err_code: i32,
}

/// Pool state of one transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemPoolTxState {
	#[serde(default)]
	pub state: Vec<MemPoolTxStateItem>,
}

/// Number of pooled transactions, reported by the node as `[verified, verifying]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct MemPoolTxCount {
	pub verified: u32,
	pub verifying: u32,
}

impl From<[u32; 2]> for MemPoolTxCount {
	fn from([verified, verifying]: [u32; 2]) -> Self {
		Self {
			verified,
			verifying,
		}
	}
}

impl From<MemPoolTxCount> for [u32; 2] {
	fn from(count: MemPoolTxCount) -> Self {
		[count.verified, count.verifying]
	}
}

impl MemPoolTxCount {
	pub fn total(&self) -> u32 {
		self.verified.saturating_add(self.verifying)
	}
}
