//! Command line client for Poly/Ontology style nodes.
//!
//! Resolves the node endpoints from `--config`, `--rpc/--rest/--ws` or the
//! `POLY_CLIENT_CONFIG` environment variable, runs one subcommand through the client
//! manager and prints the result as pretty JSON on stdout.

use clap::{value_parser, Arg, ArgMatches, Command};
use dotenvy::dotenv;
use poly_client::{
	bootstrap::{
		command_metadata, execute_command, initialize_client, BlockRef, ClientCommand,
		EndpointArgs, Result,
	},
	models::RawTransaction,
	utils::logging::{error::TraceableError, setup_logging},
};
use std::{path::PathBuf, time::Duration};
use tracing::error;

const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 30;

fn cli() -> Command {
	Command::new("poly-client")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Query a Poly/Ontology node over JSON-RPC, REST or WebSocket")
		.subcommand_required(true)
		.arg(
			Arg::new("config")
				.long("config")
				.global(true)
				.help("Path to a client configuration file (default: $POLY_CLIENT_CONFIG)")
				.value_name("FILE")
				.value_parser(value_parser!(PathBuf)),
		)
		.arg(
			Arg::new("rpc")
				.long("rpc")
				.global(true)
				.help("JSON-RPC endpoint URL")
				.value_name("URL"),
		)
		.arg(
			Arg::new("rest")
				.long("rest")
				.global(true)
				.help("REST endpoint URL")
				.value_name("URL"),
		)
		.arg(
			Arg::new("ws")
				.long("ws")
				.global(true)
				.help("WebSocket endpoint URL")
				.value_name("URL"),
		)
		.subcommand(Command::new("height").about("Current block height"))
		.subcommand(
			Command::new("block-hash")
				.about("Hash of the block at HEIGHT, or of the current block")
				.arg(Arg::new("height").value_parser(value_parser!(u32))),
		)
		.subcommand(
			Command::new("block")
				.about("Block by height or hash")
				.arg(Arg::new("block").required(true).value_name("HEIGHT|HASH")),
		)
		.subcommand(
			Command::new("header")
				.about("Block header by height")
				.arg(Arg::new("height").required(true).value_parser(value_parser!(u32))),
		)
		.subcommand(
			Command::new("tx")
				.about("Transaction by hash")
				.arg(Arg::new("hash").required(true)),
		)
		.subcommand(
			Command::new("events")
				.about("Contract events of a transaction hash or of every transaction at a height")
				.arg(Arg::new("target").required(true).value_name("HASH|HEIGHT")),
		)
		.subcommand(
			Command::new("storage")
				.about("Contract storage value")
				.arg(Arg::new("contract").required(true))
				.arg(Arg::new("key").required(true).value_name("KEY_HEX")),
		)
		.subcommand(Command::new("mempool-count").about("Transaction pool counters"))
		.subcommand(
			Command::new("mempool-state")
				.about("Transaction pool state of a transaction")
				.arg(Arg::new("hash").required(true)),
		)
		.subcommand(Command::new("version").about("Node version"))
		.subcommand(Command::new("network-id").about("Node network id"))
		.subcommand(
			Command::new("merkle-proof")
				.about("Merkle proof of a block against a root block")
				.arg(Arg::new("block").required(true).value_parser(value_parser!(u32)))
				.arg(Arg::new("root").required(true).value_parser(value_parser!(u32))),
		)
		.subcommand(
			Command::new("send")
				.about("Send a signed transaction")
				.arg(Arg::new("tx").required(true).value_name("TX_HEX"))
				.arg(
					Arg::new("pre-exec")
						.long("pre-exec")
						.help("Simulate the transaction without committing it")
						.action(clap::ArgAction::SetTrue),
				),
		)
		.subcommand(
			Command::new("wait")
				.about("Wait for new blocks")
				.arg(
					Arg::new("timeout")
						.long("timeout")
						.help("Seconds to wait (default: 30)")
						.value_name("SECONDS")
						.value_parser(value_parser!(u64)),
				)
				.arg(
					Arg::new("blocks")
						.long("blocks")
						.help("Number of blocks to wait for (default: 2)")
						.value_parser(value_parser!(u32)),
				),
		)
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a String> {
	matches
		.get_one::<String>(id)
		.ok_or_else(|| format!("Missing argument: {}", id).into())
}

fn required_u32(matches: &ArgMatches, id: &str) -> Result<u32> {
	matches
		.get_one::<u32>(id)
		.copied()
		.ok_or_else(|| format!("Missing argument: {}", id).into())
}

fn parse_command(matches: &ArgMatches) -> Result<ClientCommand> {
	let (name, sub) = matches.subcommand().ok_or("A subcommand is required")?;

	let command = match name {
		"height" => ClientCommand::Height,
		"block-hash" => ClientCommand::BlockHash(sub.get_one::<u32>("height").copied()),
		"block" => ClientCommand::Block(required(sub, "block")?.parse::<BlockRef>()?),
		"header" => ClientCommand::Header(required_u32(sub, "height")?),
		"tx" => ClientCommand::Transaction(required(sub, "hash")?.clone()),
		"events" => ClientCommand::Events(required(sub, "target")?.parse::<BlockRef>()?),
		"storage" => ClientCommand::Storage {
			contract_address: required(sub, "contract")?.clone(),
			key: hex::decode(required(sub, "key")?)?,
		},
		"mempool-count" => ClientCommand::MemPoolCount,
		"mempool-state" => ClientCommand::MemPoolState(required(sub, "hash")?.clone()),
		"version" => ClientCommand::Version,
		"network-id" => ClientCommand::NetworkId,
		"merkle-proof" => ClientCommand::MerkleProof {
			block_height: required_u32(sub, "block")?,
			root_height: required_u32(sub, "root")?,
		},
		"send" => ClientCommand::Send {
			tx: required(sub, "tx")?.parse::<RawTransaction>()?,
			pre_exec: sub.get_flag("pre-exec"),
		},
		"wait" => ClientCommand::Wait {
			timeout: Duration::from_secs(
				sub.get_one::<u64>("timeout")
					.copied()
					.unwrap_or(DEFAULT_WAIT_TIMEOUT_SECS),
			),
			block_count: sub.get_one::<u32>("blocks").copied(),
		},
		other => return Err(format!("Unknown command: {}", other).into()),
	};

	Ok(command)
}

fn endpoint_args(matches: &ArgMatches) -> EndpointArgs {
	EndpointArgs {
		config_path: matches.get_one::<PathBuf>("config").cloned(),
		rpc_url: matches.get_one::<String>("rpc").cloned(),
		rest_url: matches.get_one::<String>("rest").cloned(),
		ws_url: matches.get_one::<String>("ws").cloned(),
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let matches = cli().get_matches();

	// Load environment variables from .env file
	dotenv().ok();

	setup_logging().unwrap_or_else(|e| {
		eprintln!("Failed to setup logging: {}", e);
	});

	let command = parse_command(&matches)?;
	let manager = initialize_client(&endpoint_args(&matches)).await?;

	match execute_command(&manager, command.clone()).await {
		Ok(output) => {
			println!("{}", serde_json::to_string_pretty(&output)?);
			Ok(())
		}
		Err(e) => {
			error!(
				trace_id = %e.trace_id(),
				metadata = ?command_metadata(&command),
				"Command failed: {}",
				e
			);
			Err(e)
		}
	}
}
