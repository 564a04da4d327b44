use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of transport a client manager can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
	/// JSON-RPC over HTTP
	Rpc,
	/// REST over HTTP
	Rest,
	/// WebSocket
	Ws,
	/// A caller supplied transport, only ever set as the explicit default
	Custom,
}

impl fmt::Display for TransportKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Rpc => "rpc",
			Self::Rest => "rest",
			Self::Ws => "ws",
			Self::Custom => "custom",
		};
		write!(f, "{}", name)
	}
}
