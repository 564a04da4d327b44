//! Manages the rotation of node HTTP endpoints
//!
//! Provides methods for rotating between multiple URLs and sending requests to the active endpoint
//! with automatic fallback to other URLs on failure.
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use crate::services::transports::{RotatingTransport, TransportError, ROTATE_ON_ERROR_CODES};

/// An HTTP request relative to the active endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum HttpRequest {
	/// `GET {active_url}{path}`
	Get { path: String },
	/// `POST {active_url}{path}` with a JSON body
	Post { path: String, body: Value },
	/// `POST {active_url}{path}` that must reach the node at most once
	Submit { path: String, body: Value },
}

impl HttpRequest {
	fn path(&self) -> &str {
		match self {
			Self::Get { path } | Self::Post { path, .. } | Self::Submit { path, .. } => path,
		}
	}

	/// Whether the request may be sent again after a failure that could have reached the node
	pub fn is_replayable(&self) -> bool {
		!matches!(self, Self::Submit { .. })
	}
}

/// True when the request failed before a connection to the node existed
fn never_delivered(error: &reqwest_middleware::Error) -> bool {
	matches!(error, reqwest_middleware::Error::Reqwest(e) if e.is_connect())
}

/// Manages the rotation of node HTTP endpoints
///
/// # Fields
/// * `active_url` - The current active URL
/// * `fallback_urls` - A list of fallback URLs to rotate to
/// * `client` - The client to use for the endpoint manager
/// * `submit_client` - The client used for [`HttpRequest::Submit`]
/// * `rotation_lock` - A lock for managing the rotation process
#[derive(Clone, Debug)]
pub struct EndpointManager {
	pub active_url: Arc<RwLock<String>>,
	pub fallback_urls: Arc<RwLock<Vec<String>>>,
	client: ClientWithMiddleware,
	submit_client: ClientWithMiddleware,
	rotation_lock: Arc<tokio::sync::Mutex<()>>,
}

/// Outcome of a single attempt against one URL
#[derive(Debug)]
enum SingleRequestAttemptOutcome {
	/// Successfully got a response (status might still be error)
	Success(reqwest::Response),
	/// Error during send (e.g., connection, timeout)
	NetworkError(reqwest_middleware::Error),
	/// Error serializing the request body
	SerializationError(TransportError),
}

/// Joins a base URL and a request path without doubling the separator
pub(crate) fn join_url(base: &str, path: &str) -> String {
	if path.is_empty() {
		return base.to_string();
	}
	format!(
		"{}/{}",
		base.trim_end_matches('/'),
		path.trim_start_matches('/')
	)
}

impl EndpointManager {
	/// Creates a new rotating URL client
	///
	/// # Arguments
	/// * `client` - The client to use for the endpoint manager
	/// * `active_url` - The initial active URL
	/// * `fallback_urls` - A list of fallback URLs to rotate to
	pub fn new(client: ClientWithMiddleware, active_url: &str, fallback_urls: Vec<String>) -> Self {
		Self {
			active_url: Arc::new(RwLock::new(active_url.to_string())),
			fallback_urls: Arc::new(RwLock::new(fallback_urls)),
			rotation_lock: Arc::new(tokio::sync::Mutex::new(())),
			submit_client: client.clone(),
			client,
		}
	}

	/// Uses `client` for submits instead of the shared client
	///
	/// The submit client should not retry on its own; see
	/// [`SubmitRetryStrategy`](crate::services::transports::SubmitRetryStrategy).
	pub fn with_submit_client(mut self, client: ClientWithMiddleware) -> Self {
		self.submit_client = client;
		self
	}

	/// Rotates to the next available URL
	///
	/// Picks the first fallback different from the active URL, checks it with
	/// `try_connect` and swaps it in, moving the previous active URL to the back of the
	/// fallback list.
	pub async fn try_rotate_url<T: RotatingTransport>(
		&self,
		transport: &T,
	) -> Result<String, TransportError> {
		let _guard = self.rotation_lock.lock().await;
		let initial_active_url = self.active_url.read().await.clone();
		let current_fallbacks_snapshot = self.fallback_urls.read().await.clone();

		tracing::debug!(
			"Trying to rotate URL: Current Active: '{}', Fallbacks: {:?}",
			initial_active_url,
			current_fallbacks_snapshot,
		);

		let new_url = match current_fallbacks_snapshot
			.iter()
			.find(|&url| *url != initial_active_url)
		{
			Some(url) => url.clone(),
			None => {
				let msg = format!(
					"No fallback URLs available. Current active: '{}', Fallbacks checked: {:?}",
					initial_active_url, current_fallbacks_snapshot
				);
				return Err(TransportError::url_rotation(msg, None, None));
			}
		};

		transport
			.try_connect(&new_url)
			.await
			.map_err(|connect_err| {
				TransportError::url_rotation(
					format!("Failed to connect to new URL '{}'", new_url),
					Some(connect_err.into()),
					None,
				)
			})?;

		transport
			.update_client(&new_url)
			.await
			.map_err(|update_err| {
				TransportError::url_rotation(
					format!(
						"Failed to update transport client with new URL '{}'",
						new_url
					),
					Some(update_err.into()),
					None,
				)
			})?;

		{
			let mut active_url_guard = self.active_url.write().await;
			let mut fallback_urls_guard = self.fallback_urls.write().await;

			let mut next_fallback_urls: Vec<String> = fallback_urls_guard
				.iter()
				.filter(|url| **url != new_url)
				.cloned()
				.collect();
			next_fallback_urls.push(initial_active_url.clone());

			tracing::debug!(
				"Successful URL rotation - from: '{}', to: '{}'. New Fallbacks: {:?}",
				initial_active_url,
				new_url,
				next_fallback_urls
			);

			*fallback_urls_guard = next_fallback_urls;
			*active_url_guard = new_url.clone();
		}
		Ok(new_url)
	}

	async fn try_request_on_url(
		&self,
		url: &str,
		request: &HttpRequest,
	) -> SingleRequestAttemptOutcome {
		let target = join_url(url, request.path());
		let client = if request.is_replayable() {
			&self.client
		} else {
			&self.submit_client
		};

		let builder = match request {
			HttpRequest::Get { .. } => client.get(&target),
			HttpRequest::Post { body, .. } | HttpRequest::Submit { body, .. } => {
				let request_body_str = match serde_json::to_string(body) {
					Ok(body) => body,
					Err(e) => {
						return SingleRequestAttemptOutcome::SerializationError(
							TransportError::request_serialization(
								"Failed to serialize request JSON",
								Some(Box::new(e)),
								None,
							),
						);
					}
				};
				client
					.post(&target)
					.header("Content-Type", "application/json")
					.body(request_body_str)
			}
		};

		match builder.send().await {
			Ok(response) => SingleRequestAttemptOutcome::Success(response),
			Err(network_error) => {
				tracing::warn!("Network error while sending request: {}", network_error);
				SingleRequestAttemptOutcome::NetworkError(network_error)
			}
		}
	}

	/// Sends a request to the active endpoint with automatic URL rotation on failure
	///
	/// # Behavior
	/// - Rotates to a fallback URL on network errors and on statuses listed in
	///   [`ROTATE_ON_ERROR_CODES`], then retries on the new URL
	/// - Any other non-success status fails immediately
	/// - A [`HttpRequest::Submit`] is only resent after a network error when the
	///   connection was never established
	/// - Rotation stops once every fallback has been tried for this request
	/// - Returns the parsed JSON body of the first successful response
	pub async fn send_request<T: RotatingTransport>(
		&self,
		transport: &T,
		request: &HttpRequest,
	) -> Result<Value, TransportError> {
		// Each fallback gets at most one turn per request
		let max_rotations = self.fallback_urls.read().await.len();
		let mut rotations = 0;

		loop {
			let current_url_snapshot = self.active_url.read().await.clone();

			tracing::debug!(
				"Attempting request on active URL: '{}'",
				current_url_snapshot
			);

			match self.try_request_on_url(&current_url_snapshot, request).await {
				SingleRequestAttemptOutcome::Success(response) => {
					let status = response.status();
					if status.is_success() {
						return response.json().await.map_err(|e| {
							TransportError::response_parse(
								"Failed to parse JSON response".to_string(),
								Some(Box::new(e)),
								None,
							)
						});
					}

					let error_body = response.text().await.unwrap_or_default();
					tracing::warn!(
						"Request to {} failed with status {}: {}",
						current_url_snapshot,
						status,
						error_body
					);

					if !ROTATE_ON_ERROR_CODES.contains(&status.as_u16()) {
						return Err(TransportError::http(
							status,
							current_url_snapshot,
							error_body,
							None,
							None,
						));
					}

					if rotations >= max_rotations {
						return Err(TransportError::http(
							status,
							current_url_snapshot,
							error_body,
							None,
							None,
						));
					}

					tracing::debug!(
						"HTTP status {} on '{}' triggers URL rotation attempt",
						status,
						current_url_snapshot
					);

					rotations += 1;
					if let Err(rotation_error) = self.try_rotate_url(transport).await {
						return Err(TransportError::http(
							status,
							current_url_snapshot,
							error_body,
							Some(Box::new(rotation_error)),
							None,
						));
					}
				}
				SingleRequestAttemptOutcome::NetworkError(network_error) => {
					tracing::warn!(
						"Network error for {}: {}",
						current_url_snapshot,
						network_error,
					);

					if !request.is_replayable() && !never_delivered(&network_error) {
						return Err(TransportError::network(
							network_error.to_string(),
							Some(Box::new(network_error)),
							Some(HashMap::from([(
								"url".to_string(),
								current_url_snapshot,
							)])),
						));
					}

					if rotations >= max_rotations {
						return Err(TransportError::network(
							network_error.to_string(),
							Some(Box::new(network_error)),
							None,
						));
					}

					rotations += 1;
					match self.try_rotate_url(transport).await {
						Ok(new_url) => {
							tracing::debug!(
								"Rotation successful after network error, retrying request on new URL: '{}'",
								new_url
							);
						}
						Err(rotation_error) => {
							return Err(TransportError::network(
								network_error.to_string(),
								Some(Box::new(rotation_error)),
								None,
							));
						}
					}
				}
				SingleRequestAttemptOutcome::SerializationError(serialization_error) => {
					return Err(serialization_error);
				}
			}
		}
	}
}
