use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};

use crate::{
	models::{ConfigError, ConfigLoader, TransportKind},
	services::transports::WsConfig,
	utils::http::RetryConfig,
};

fn default_weight() -> u32 {
	100
}

/// A node endpoint and its selection weight
///
/// Higher weights are tried first; a weight of zero disables the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointUrl {
	pub url: String,
	#[serde(default = "default_weight")]
	pub weight: u32,
}

impl EndpointUrl {
	pub fn new(url: impl Into<String>, weight: u32) -> Self {
		Self {
			url: url.into(),
			weight,
		}
	}
}

/// Client configuration: node endpoints per transport plus transport tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Chain identifier recorded on the client manager
	#[serde(default)]
	pub chain_id: u64,
	#[serde(default)]
	pub rpc_urls: Vec<EndpointUrl>,
	#[serde(default)]
	pub rest_urls: Vec<EndpointUrl>,
	#[serde(default)]
	pub ws_urls: Vec<EndpointUrl>,
	/// Transport registered as the explicit default client
	#[serde(default)]
	pub default_transport: Option<TransportKind>,
	#[serde(default)]
	pub retry: RetryConfig,
	#[serde(default)]
	pub ws: WsConfig,
}

impl ClientConfig {
	/// Endpoints of the given kind with a non-zero weight, highest weight first
	pub fn active_urls(&self, kind: TransportKind) -> Vec<String> {
		let urls = match kind {
			TransportKind::Rpc => &self.rpc_urls,
			TransportKind::Rest => &self.rest_urls,
			TransportKind::Ws => &self.ws_urls,
			TransportKind::Custom => return Vec::new(),
		};

		let mut active: Vec<_> = urls.iter().filter(|u| u.weight > 0).collect();
		active.sort_by(|a, b| b.weight.cmp(&a.weight));
		active.into_iter().map(|u| u.url.clone()).collect()
	}

	fn validate_urls(
		urls: &[EndpointUrl],
		kind: TransportKind,
		schemes: &[&str],
	) -> Result<(), ConfigError> {
		for endpoint in urls {
			let parsed = url::Url::parse(&endpoint.url).map_err(|e| {
				ConfigError::validation_error(
					format!("Invalid {} URL", kind),
					Some(Box::new(e)),
					Some(HashMap::from([("url".to_string(), endpoint.url.clone())])),
				)
			})?;

			if !schemes.contains(&parsed.scheme()) {
				return Err(ConfigError::validation_error(
					format!("{} URLs must use one of: {}", kind, schemes.join(", ")),
					None,
					Some(HashMap::from([("url".to_string(), endpoint.url.clone())])),
				));
			}

			if endpoint.weight > 100 {
				return Err(ConfigError::validation_error(
					"All URL weights must be between 0 and 100",
					None,
					Some(HashMap::from([("url".to_string(), endpoint.url.clone())])),
				));
			}
		}
		Ok(())
	}
}

impl ConfigLoader for ClientConfig {
	fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		if !Self::is_json_file(path) {
			return Err(ConfigError::file_error(
				"Configuration file must be a .json file",
				None,
				Some(HashMap::from([(
					"path".to_string(),
					path.display().to_string(),
				)])),
			));
		}

		let file = std::fs::File::open(path)?;
		let config: ClientConfig = serde_json::from_reader(file)?;
		config.validate()?;

		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		Self::validate_urls(&self.rpc_urls, TransportKind::Rpc, &["http", "https"])?;
		Self::validate_urls(&self.rest_urls, TransportKind::Rest, &["http", "https"])?;
		Self::validate_urls(&self.ws_urls, TransportKind::Ws, &["ws", "wss"])?;

		let has_any = [TransportKind::Rpc, TransportKind::Rest, TransportKind::Ws]
			.iter()
			.any(|kind| !self.active_urls(*kind).is_empty());
		if !has_any {
			return Err(ConfigError::validation_error(
				"At least one RPC, REST or WebSocket URL with a non-zero weight is required",
				None,
				None,
			));
		}

		if let Some(kind) = self.default_transport {
			if self.active_urls(kind).is_empty() {
				return Err(ConfigError::validation_error(
					format!("Default transport '{}' has no URLs configured", kind),
					None,
					None,
				));
			}
		}

		Ok(())
	}
}
