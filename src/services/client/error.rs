//! Client manager error types.
//!
//! Wraps transport and decode failures and adds the manager's own failure modes: no
//! configured transport, polling timeouts and configuration problems.

use crate::{
	services::{decoder::DecodeError, transports::TransportError},
	utils::logging::error::{ErrorContext, TraceableError},
};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Errors returned by [`super::ClientManager`]
#[derive(ThisError, Debug)]
pub enum ClientError {
	/// No RPC, REST, WebSocket or default transport is registered
	#[error("don't have available client of poly")]
	NoAvailableClient,

	/// The transport failed to deliver the request or the node rejected it
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The node's reply could not be decoded
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// A polling operation ran out of time
	#[error("Timeout: {0}")]
	Timeout(ErrorContext),

	/// Transports could not be built from the configuration
	#[error("Configuration error: {0}")]
	Config(ErrorContext),
}

impl ClientError {
	pub fn timeout(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Timeout(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn config(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Config(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for ClientError {
	fn trace_id(&self) -> String {
		match self {
			Self::NoAvailableClient => Uuid::new_v4().to_string(),
			Self::Transport(err) => err.trace_id(),
			Self::Decode(err) => err.trace_id(),
			Self::Timeout(ctx) => ctx.trace_id.clone(),
			Self::Config(ctx) => ctx.trace_id.clone(),
		}
	}
}
