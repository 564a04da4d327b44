//! Reply envelopes returned by the node.
//!
//! JSON-RPC replies carry lowercase `error`/`desc`/`result` fields; REST and WebSocket
//! replies share a PascalCase envelope, the WebSocket one adding the request `Id`.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::services::transports::TransportError;

/// JSON-RPC reply: `{"jsonrpc":"2.0","id":..,"error":0,"desc":"SUCCESS","result":..}`
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
	#[serde(default)]
	pub id: Value,
	#[serde(default)]
	pub error: i64,
	#[serde(default)]
	pub desc: String,
	#[serde(default)]
	pub result: Value,
}

impl RpcResponse {
	/// Unwraps the `result` payload, turning a non-zero error code into a node error
	pub fn into_result(self, operation: &str) -> Result<Value, TransportError> {
		if self.error != 0 {
			return Err(TransportError::node(
				self.error,
				self.desc,
				Some(HashMap::from([(
					"operation".to_string(),
					operation.to_string(),
				)])),
			));
		}
		Ok(self.result)
	}
}

/// REST and WebSocket reply: `{"Action":..,"Desc":..,"Error":0,"Result":..,"Version":..}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeResponse {
	#[serde(default)]
	pub action: String,
	#[serde(default)]
	pub desc: String,
	#[serde(default)]
	pub error: i64,
	#[serde(default)]
	pub result: Value,
	#[serde(default)]
	pub version: String,
	/// Only present on WebSocket replies
	#[serde(default)]
	pub id: Option<Value>,
}

impl NodeResponse {
	/// Unwraps the `Result` payload, turning a non-zero error code into a node error
	pub fn into_result(self, operation: &str) -> Result<Value, TransportError> {
		if self.error != 0 {
			return Err(TransportError::node(
				self.error,
				self.desc,
				Some(HashMap::from([
					("operation".to_string(), operation.to_string()),
					("action".to_string(), self.action),
				])),
			));
		}
		Ok(self.result)
	}

	/// Whether this reply answers the request with correlation id `qid`
	///
	/// Nodes echo the id back either as a string or a number.
	pub fn answers(&self, qid: &str) -> bool {
		match &self.id {
			Some(Value::String(id)) => id == qid,
			Some(Value::Number(id)) => id.to_string() == qid,
			_ => false,
		}
	}
}

/// Parses a raw reply into `T`, mapping failures to a response parse error
pub(crate) fn parse_envelope<T>(raw: Value, operation: &str) -> Result<T, TransportError>
where
	T: serde::de::DeserializeOwned,
{
	serde_json::from_value(raw).map_err(|e| {
		TransportError::response_parse(
			"Unexpected reply envelope",
			Some(Box::new(e)),
			Some(HashMap::from([(
				"operation".to_string(),
				operation.to_string(),
			)])),
		)
	})
}
