//! Chain data types returned by the node.
//!
//! These mirror the node's verbose JSON output. They are plain values: the client never
//! validates or re-serializes them into the chain's binary format.

mod block;
mod event;
mod hash;
mod mempool;
mod proof;
mod transaction;

pub use block::{Block, BlockTxHashes, Header};
pub use event::{NotifyEventInfo, SmartContractEvent};
pub use hash::{HashParseError, Uint256, UINT256_SIZE};
pub use mempool::{MemPoolTxCount, MemPoolTxState, MemPoolTxStateItem};
pub use proof::MerkleProof;
pub use transaction::{PreExecResult, RawTransaction, Sig, Transaction};
