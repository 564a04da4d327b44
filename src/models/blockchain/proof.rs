//! Merkle proofs for block inclusion and cross-chain state.

use serde::{Deserialize, Serialize};

/// Merkle proof returned by the node
///
/// Block proofs fill the height and root fields; cross-chain state proofs carry only
/// the proof type and the hex encoded audit path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MerkleProof {
	#[serde(rename = "Type", default)]
	pub proof_type: String,
	#[serde(default)]
	pub audit_path: String,
	#[serde(default)]
	pub transactions_root: Option<String>,
	#[serde(default)]
	pub block_height: Option<u32>,
	#[serde(default)]
	pub cur_block_root: Option<String>,
	#[serde(default)]
	pub cur_block_height: Option<u32>,
	#[serde(default)]
	pub target_hashes: Vec<String>,
}

impl MerkleProof {
	/// Decodes the hex audit path into raw bytes
	pub fn audit_path_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
		hex::decode(&self.audit_path)
	}
}
