//! Domain models and data structures.
//!
//! - `blockchain`: Chain data returned by the node (blocks, transactions, proofs)
//! - `config`: Configuration loading and validation
//! - `core`: Types shared between configuration and services

mod blockchain;
mod config;
mod core;

pub use blockchain::{
	Block, BlockTxHashes, HashParseError, Header, MemPoolTxCount, MemPoolTxState,
	MemPoolTxStateItem, MerkleProof, NotifyEventInfo, PreExecResult, RawTransaction, Sig,
	SmartContractEvent, Transaction, Uint256, UINT256_SIZE,
};
pub use config::{ClientConfig, ConfigError, ConfigLoader, EndpointUrl};
pub use core::TransportKind;
