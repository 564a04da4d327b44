//! Bootstrap module for building the client manager and running commands.
//!
//! - `resolve_config`: Chooses the configuration from a file, explicit URLs or the
//!   `POLY_CLIENT_CONFIG` environment variable
//! - `initialize_client`: Builds a [`ClientManager`] from that configuration
//! - `execute_command`: Runs one [`ClientCommand`] and returns its JSON output

use serde_json::Value;
use std::{
	collections::HashMap,
	env,
	error::Error,
	path::{Path, PathBuf},
	str::FromStr,
	time::Duration,
};

use crate::{
	models::{ClientConfig, ConfigError, ConfigLoader, EndpointUrl, RawTransaction},
	services::client::ClientManager,
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error + Send + Sync>>;

/// Environment variable naming the default configuration file
pub const CONFIG_PATH_ENV: &str = "POLY_CLIENT_CONFIG";

/// Where to find the node, as given on the command line
#[derive(Debug, Clone, Default)]
pub struct EndpointArgs {
	pub config_path: Option<PathBuf>,
	pub rpc_url: Option<String>,
	pub rest_url: Option<String>,
	pub ws_url: Option<String>,
}

impl EndpointArgs {
	fn has_urls(&self) -> bool {
		self.rpc_url.is_some() || self.rest_url.is_some() || self.ws_url.is_some()
	}
}

/// A block addressed by height or by hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRef {
	Height(u32),
	Hash(String),
}

impl FromStr for BlockRef {
	type Err = std::convert::Infallible;

	/// All-digit input is a height, anything else a hash
	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.parse::<u32>() {
			Ok(height) => Ok(Self::Height(height)),
			Err(_) => Ok(Self::Hash(s.to_string())),
		}
	}
}

/// One command of the `poly-client` tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
	Height,
	BlockHash(Option<u32>),
	Block(BlockRef),
	Header(u32),
	Transaction(String),
	Events(BlockRef),
	Storage {
		contract_address: String,
		key: Vec<u8>,
	},
	MemPoolCount,
	MemPoolState(String),
	Version,
	NetworkId,
	MerkleProof {
		block_height: u32,
		root_height: u32,
	},
	Send {
		tx: RawTransaction,
		pre_exec: bool,
	},
	Wait {
		timeout: Duration,
		block_count: Option<u32>,
	},
}

/// Resolves the client configuration
///
/// Precedence: an explicit config file, then URLs given as arguments, then the file
/// named by `POLY_CLIENT_CONFIG`.
pub fn resolve_config(args: &EndpointArgs) -> Result<ClientConfig> {
	if let Some(path) = &args.config_path {
		return Ok(ClientConfig::load_from_path(path)?);
	}

	if args.has_urls() {
		let urls = |url: &Option<String>| {
			url.iter()
				.map(|u| EndpointUrl::new(u.clone(), 100))
				.collect::<Vec<_>>()
		};
		let config = ClientConfig {
			rpc_urls: urls(&args.rpc_url),
			rest_urls: urls(&args.rest_url),
			ws_urls: urls(&args.ws_url),
			..ClientConfig::default()
		};
		config.validate()?;
		return Ok(config);
	}

	match env::var(CONFIG_PATH_ENV) {
		Ok(path) => Ok(ClientConfig::load_from_path(Path::new(&path))?),
		Err(_) => Err(Box::new(ConfigError::validation_error(
			format!(
				"No node configured: pass --config, --rpc, --rest or --ws, or set {}",
				CONFIG_PATH_ENV
			),
			None,
			None,
		))),
	}
}

/// Builds a client manager for the resolved configuration
pub async fn initialize_client(args: &EndpointArgs) -> Result<ClientManager> {
	let config = resolve_config(args)?;
	let manager = ClientManager::from_config(&config).await?;
	Ok(manager)
}

/// Runs `command` against `manager` and returns its output as JSON
pub async fn execute_command(manager: &ClientManager, command: ClientCommand) -> Result<Value> {
	tracing::debug!(command = ?command, "Executing command");

	let output = match command {
		ClientCommand::Height => serde_json::to_value(manager.get_current_block_height().await?)?,
		ClientCommand::BlockHash(None) => {
			serde_json::to_value(manager.get_current_block_hash().await?)?
		}
		ClientCommand::BlockHash(Some(height)) => {
			serde_json::to_value(manager.get_block_hash(height).await?)?
		}
		ClientCommand::Block(BlockRef::Height(height)) => {
			serde_json::to_value(manager.get_block_by_height(height).await?)?
		}
		ClientCommand::Block(BlockRef::Hash(hash)) => {
			serde_json::to_value(manager.get_block_by_hash(&hash).await?)?
		}
		ClientCommand::Header(height) => {
			serde_json::to_value(manager.get_header_by_height(height).await?)?
		}
		ClientCommand::Transaction(hash) => {
			serde_json::to_value(manager.get_transaction(&hash).await?)?
		}
		ClientCommand::Events(BlockRef::Height(height)) => {
			serde_json::to_value(manager.get_smart_contract_events_by_block(height).await?)?
		}
		ClientCommand::Events(BlockRef::Hash(hash)) => {
			serde_json::to_value(manager.get_smart_contract_event(&hash).await?)?
		}
		ClientCommand::Storage {
			contract_address,
			key,
		} => {
			let value = manager.get_storage(&contract_address, &key).await?;
			Value::String(hex::encode(value))
		}
		ClientCommand::MemPoolCount => {
			serde_json::to_value(manager.get_mem_pool_tx_count().await?)?
		}
		ClientCommand::MemPoolState(hash) => {
			serde_json::to_value(manager.get_mem_pool_tx_state(&hash).await?)?
		}
		ClientCommand::Version => Value::String(manager.get_version().await?),
		ClientCommand::NetworkId => serde_json::to_value(manager.get_network_id().await?)?,
		ClientCommand::MerkleProof {
			block_height,
			root_height,
		} => serde_json::to_value(manager.get_merkle_proof(block_height, root_height).await?)?,
		ClientCommand::Send { tx, pre_exec: true } => {
			serde_json::to_value(manager.pre_exec_transaction(&tx).await?)?
		}
		ClientCommand::Send {
			tx,
			pre_exec: false,
		} => serde_json::to_value(manager.send_transaction(&tx).await?)?,
		ClientCommand::Wait {
			timeout,
			block_count,
		} => Value::Bool(manager.wait_for_generate_block(timeout, block_count).await?),
	};

	Ok(output)
}

/// Metadata attached to command failures
pub fn command_metadata(command: &ClientCommand) -> HashMap<String, String> {
	HashMap::from([("command".to_string(), format!("{:?}", command))])
}
