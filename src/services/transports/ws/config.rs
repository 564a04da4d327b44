//! WebSocket configuration for node transports
//!
//! Timeouts are expressed in milliseconds in configuration files
//! (`connection_timeout_ms`, `message_timeout_ms`, `reconnect_timeout_ms`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

mod duration_ms {
	use serde::{Deserialize, Deserializer, Serializer};
	use std::time::Duration;

	pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(duration.as_millis() as u64)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		u64::deserialize(deserializer).map(Duration::from_millis)
	}
}

fn default_reconnect_timeout() -> Duration {
	Duration::from_secs(5)
}

fn default_max_reconnect_attempts() -> u32 {
	3
}

fn default_connection_timeout() -> Duration {
	Duration::from_secs(10)
}

fn default_message_timeout() -> Duration {
	Duration::from_secs(5)
}

/// WebSocket configuration for node transports
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsConfig {
	/// How long to wait before reconnecting
	#[serde(
		rename = "reconnect_timeout_ms",
		with = "duration_ms",
		default = "default_reconnect_timeout"
	)]
	pub reconnect_timeout: Duration,
	/// How many times to try reconnecting after a broken connection
	#[serde(default = "default_max_reconnect_attempts")]
	pub max_reconnect_attempts: u32,
	/// How long to wait for a connection to open
	#[serde(
		rename = "connection_timeout_ms",
		with = "duration_ms",
		default = "default_connection_timeout"
	)]
	pub connection_timeout: Duration,
	/// How long to wait for the reply to a request
	#[serde(
		rename = "message_timeout_ms",
		with = "duration_ms",
		default = "default_message_timeout"
	)]
	pub message_timeout: Duration,
}

impl Default for WsConfig {
	fn default() -> Self {
		Self {
			reconnect_timeout: default_reconnect_timeout(),
			max_reconnect_attempts: default_max_reconnect_attempts(),
			connection_timeout: default_connection_timeout(),
			message_timeout: default_message_timeout(),
		}
	}
}

impl WsConfig {
	/// Creates a new WebSocket configuration with default values
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a new WebSocket configuration with a single attempt
	///
	/// Mostly for testing purposes
	pub fn single_attempt() -> Self {
		Self {
			reconnect_timeout: Duration::from_secs(1),
			max_reconnect_attempts: 1,
			connection_timeout: Duration::from_secs(1),
			message_timeout: Duration::from_secs(1),
		}
	}

	pub fn with_reconnect_timeout(mut self, reconnect_timeout: Duration) -> Self {
		self.reconnect_timeout = reconnect_timeout;
		self
	}

	pub fn with_max_reconnect_attempts(mut self, max_reconnect_attempts: u32) -> Self {
		self.max_reconnect_attempts = max_reconnect_attempts;
		self
	}

	pub fn with_connection_timeout(mut self, connection_timeout: Duration) -> Self {
		self.connection_timeout = connection_timeout;
		self
	}

	pub fn with_message_timeout(mut self, message_timeout: Duration) -> Self {
		self.message_timeout = message_timeout;
		self
	}
}
