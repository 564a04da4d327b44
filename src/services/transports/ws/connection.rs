//! WebSocket connection state management
//!
//! Tracks the open stream, its health and the time of the last exchange.

use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// State of a WebSocket connection
///
/// # Fields
/// * `stream` - The WebSocket stream, if connected
/// * `is_healthy` - Whether the connection is considered healthy
/// * `last_activity` - Timestamp of the last activity on the connection
#[derive(Debug)]
pub struct WebSocketConnection {
	pub stream: Option<WsStream>,
	pub is_healthy: bool,
	last_activity: Instant,
}

impl Default for WebSocketConnection {
	/// Creates a connection in a disconnected state
	fn default() -> Self {
		Self {
			stream: None,
			is_healthy: false,
			last_activity: Instant::now(),
		}
	}
}

impl WebSocketConnection {
	/// Whether the connection has a stream and is marked healthy
	pub fn is_connected(&self) -> bool {
		self.stream.is_some() && self.is_healthy
	}

	/// Installs a freshly opened stream
	pub fn attach(&mut self, stream: WsStream) {
		self.stream = Some(stream);
		self.is_healthy = true;
		self.update_activity();
	}

	/// Drops the stream after a failure so the next request reconnects
	pub fn mark_broken(&mut self) {
		self.is_healthy = false;
		self.stream = None;
	}

	pub fn update_activity(&mut self) {
		self.last_activity = Instant::now();
	}

	/// Time elapsed since the last exchange
	pub fn idle_for(&self) -> Duration {
		self.last_activity.elapsed()
	}
}
