//! Decoder error type.

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use crate::utils::logging::error::{ErrorContext, TraceableError};

const PAYLOAD_EXCERPT_LEN: usize = 160;

/// Raised when a node reply cannot be turned into the expected domain value
#[derive(Debug, Error)]
#[error("Decode error: {0}")]
pub struct DecodeError(pub ErrorContext);

impl DecodeError {
	/// Creates a decode error for `operation`, recording an excerpt of the offending payload
	pub fn new(
		operation: &str,
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		payload: &Value,
	) -> Self {
		let metadata = HashMap::from([
			("operation".to_string(), operation.to_string()),
			("payload".to_string(), excerpt(payload)),
		]);
		Self(ErrorContext::new_with_log(msg, source, Some(metadata)))
	}

	/// The operation whose reply failed to decode
	pub fn operation(&self) -> Option<&str> {
		self.0
			.metadata
			.as_ref()
			.and_then(|metadata| metadata.get("operation"))
			.map(String::as_str)
	}
}

impl TraceableError for DecodeError {
	fn trace_id(&self) -> String {
		self.0.trace_id.clone()
	}
}

fn excerpt(payload: &Value) -> String {
	let text = payload.to_string();
	match text.char_indices().nth(PAYLOAD_EXCERPT_LEN) {
		Some((idx, _)) => format!("{}...", &text[..idx]),
		None => text,
	}
}
