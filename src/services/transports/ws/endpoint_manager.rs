//! Manages the rotation of node WebSocket endpoints
//!
//! The active URL is reconnected first; fallbacks are tried in order when it stays
//! unreachable.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;

use crate::services::transports::{ws::config::WsConfig, RotatingTransport};

/// Manages WebSocket endpoint rotation and failover
///
/// # Fields
/// * `active_url` - The currently active WebSocket endpoint URL
/// * `fallback_urls` - List of fallback URLs to use when the active URL fails
/// * `rotation_lock` - Mutex serializing rotations
/// * `config` - Configuration settings for WebSocket connections
#[derive(Clone, Debug)]
pub struct EndpointManager {
	pub active_url: Arc<RwLock<String>>,
	pub fallback_urls: Arc<RwLock<Vec<String>>>,
	rotation_lock: Arc<Mutex<()>>,
	config: WsConfig,
}

impl EndpointManager {
	/// Creates a new WebSocket endpoint manager
	///
	/// The URLs should be pre-sorted by preference, with the preferred URL as the active one.
	pub fn new(config: &WsConfig, active_url: &str, fallback_urls: Vec<String>) -> Self {
		Self {
			active_url: Arc::new(RwLock::new(active_url.to_string())),
			fallback_urls: Arc::new(RwLock::new(fallback_urls)),
			rotation_lock: Arc::new(Mutex::new(())),
			config: config.clone(),
		}
	}

	/// Rotates to the next reachable fallback URL
	///
	/// On success the previous active URL is moved to the back of the fallback list.
	/// Unreachable candidates are put back at the end of the list.
	pub async fn rotate_url<T: RotatingTransport>(
		&self,
		transport: &T,
	) -> Result<(), anyhow::Error> {
		let _guard = self.rotation_lock.lock().await;
		let current_active = self.active_url.read().await.clone();
		let candidates = self.fallback_urls.read().await.len();
		let mut attempts = 0;

		while attempts < candidates {
			let new_url = {
				let mut fallback_urls = self.fallback_urls.write().await;
				match fallback_urls.iter().position(|url| url != &current_active) {
					Some(pos) => fallback_urls.remove(pos),
					None => return Err(anyhow::anyhow!("No fallback URLs available")),
				}
			};

			match timeout(
				self.config.connection_timeout,
				transport.try_connect(&new_url),
			)
			.await
			{
				Ok(Ok(_)) => {
					transport.update_client(&new_url).await?;
					let mut active_url = self.active_url.write().await;
					let mut fallback_urls = self.fallback_urls.write().await;
					tracing::debug!(
						"Successful rotation - from: {}, to: {}",
						current_active,
						new_url
					);
					fallback_urls.push(current_active);
					*active_url = new_url;
					return Ok(());
				}
				Ok(Err(e)) => {
					self.fallback_urls.write().await.push(new_url);
					tracing::warn!("Failed to connect to fallback URL: {}", e);
				}
				Err(_) => {
					self.fallback_urls.write().await.push(new_url);
					tracing::warn!("Connection timeout during rotation");
				}
			}

			attempts += 1;
		}

		Err(anyhow::anyhow!(
			"Failed to rotate after trying {} fallback URLs",
			candidates
		))
	}

	/// Retrieves the currently active WebSocket URL
	pub async fn get_active_url(&self) -> Result<String, anyhow::Error> {
		let url = self.active_url.read().await;
		if url.is_empty() {
			Err(anyhow::anyhow!("No active URL set"))
		} else {
			Ok(url.clone())
		}
	}

	/// Whether any fallback URL is available for rotation
	pub async fn should_rotate(&self) -> bool {
		!self.fallback_urls.read().await.is_empty()
	}
}
