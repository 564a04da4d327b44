use mockito::Server;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tokio::{io::AsyncReadExt, net::TcpListener, sync::RwLock};

use poly_client::{
	models::TransportKind,
	services::transports::{
		EndpointManager, HttpRequest, NodeRequest, NodeTransport, RotatingTransport,
		TransportError,
	},
};

// Mock transport that checks candidate URLs with a plain GET
#[derive(Clone)]
struct MockTransport {
	client: reqwest::Client,
	current_url: Arc<RwLock<String>>,
}

impl MockTransport {
	fn new() -> Self {
		Self {
			client: reqwest::Client::new(),
			current_url: Arc::new(RwLock::new(String::new())),
		}
	}
}

#[async_trait::async_trait]
impl NodeTransport for MockTransport {
	fn kind(&self) -> TransportKind {
		TransportKind::Custom
	}

	async fn get_current_url(&self) -> String {
		self.current_url.read().await.clone()
	}

	async fn send_request(
		&self,
		_qid: &str,
		_request: NodeRequest,
	) -> Result<Value, TransportError> {
		Ok(json!({"Result": "mocked_response"}))
	}
}

#[async_trait::async_trait]
impl RotatingTransport for MockTransport {
	async fn try_connect(&self, url: &str) -> Result<(), anyhow::Error> {
		match self.client.get(url).send().await {
			Ok(_) => Ok(()),
			Err(e) => Err(anyhow::anyhow!("Failed to connect: {}", e)),
		}
	}

	async fn update_client(&self, url: &str) -> Result<(), anyhow::Error> {
		*self.current_url.write().await = url.to_string();
		Ok(())
	}
}

fn get_mock_client_builder() -> ClientWithMiddleware {
	ClientBuilder::new(reqwest::Client::new()).build()
}

fn version_request() -> HttpRequest {
	HttpRequest::Post {
		path: String::new(),
		body: json!({"jsonrpc": "2.0", "method": "getversion", "params": [], "id": "1"}),
	}
}

fn submit_request() -> HttpRequest {
	HttpRequest::Submit {
		path: String::new(),
		body: json!({
			"jsonrpc": "2.0",
			"method": "sendrawtransaction",
			"params": ["00d1", 0],
			"id": "1",
		}),
	}
}

// Accepts connections and reads requests without ever answering
async fn start_unresponsive_server() -> String {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let url = format!("http://{}", listener.local_addr().unwrap());

	tokio::spawn(async move {
		while let Ok((mut socket, _)) = listener.accept().await {
			tokio::spawn(async move {
				let mut buf = [0u8; 1024];
				while let Ok(n) = socket.read(&mut buf).await {
					if n == 0 {
						break;
					}
				}
			});
		}
	});

	url
}

#[tokio::test]
async fn test_endpoint_rotation() {
	let server1 = Server::new_async().await;
	let mut server2 = Server::new_async().await;
	let server3 = Server::new_async().await;

	let mock2 = server2
		.mock("GET", "/")
		.with_status(200)
		.create_async()
		.await;

	let manager = EndpointManager::new(
		get_mock_client_builder(),
		server1.url().as_ref(),
		vec![server2.url(), server3.url()],
	);
	let transport = MockTransport::new();

	assert_eq!(&*manager.active_url.read().await, &server1.url());

	manager.try_rotate_url(&transport).await.unwrap();
	assert_eq!(&*manager.active_url.read().await, &server2.url());
	assert_eq!(transport.get_current_url().await, server2.url());
	// The previous active URL goes to the back of the fallback list
	assert_eq!(
		&*manager.fallback_urls.read().await,
		&vec![server3.url(), server1.url()]
	);

	mock2.assert_async().await;
}

#[tokio::test]
async fn test_get_request_joins_path() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("GET", "/api/v1/block/height")
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(r#"{"Error": 0, "Result": 5}"#)
		.create_async()
		.await;

	let base = format!("{}/", server.url());
	let manager = EndpointManager::new(get_mock_client_builder(), &base, vec![]);

	let result = manager
		.send_request(
			&MockTransport::new(),
			&HttpRequest::Get {
				path: "/api/v1/block/height".to_string(),
			},
		)
		.await
		.unwrap();

	assert_eq!(result["Result"], 5);
	mock.assert_async().await;
}

#[tokio::test]
async fn test_rotation_on_rate_limit() {
	let mut primary_server = Server::new_async().await;
	let mut fallback_server = Server::new_async().await;

	let primary_mock = primary_server
		.mock("POST", "/")
		.with_status(429)
		.with_body("Rate limited")
		.expect(1)
		.create_async()
		.await;
	let connect_check_mock = fallback_server
		.mock("GET", "/")
		.with_status(200)
		.create_async()
		.await;
	let fallback_mock = fallback_server
		.mock("POST", "/")
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(r#"{"jsonrpc": "2.0", "error": 0, "result": "1.9.0", "id": "1"}"#)
		.create_async()
		.await;

	let manager = EndpointManager::new(
		get_mock_client_builder(),
		primary_server.url().as_ref(),
		vec![fallback_server.url()],
	);

	let result = manager
		.send_request(&MockTransport::new(), &version_request())
		.await
		.unwrap();

	assert_eq!(result["result"], "1.9.0");
	primary_mock.assert_async().await;
	connect_check_mock.assert_async().await;
	fallback_mock.assert_async().await;
	assert_eq!(&*manager.active_url.read().await, &fallback_server.url());
}

#[tokio::test]
async fn test_rotation_is_bounded_per_request() {
	let mut primary_server = Server::new_async().await;
	let mut fallback_server = Server::new_async().await;

	let primary_mock = primary_server
		.mock("POST", "/")
		.with_status(429)
		.expect(1)
		.create_async()
		.await;
	fallback_server
		.mock("GET", "/")
		.with_status(200)
		.create_async()
		.await;
	let fallback_mock = fallback_server
		.mock("POST", "/")
		.with_status(429)
		.expect(1)
		.create_async()
		.await;

	let manager = EndpointManager::new(
		get_mock_client_builder(),
		primary_server.url().as_ref(),
		vec![fallback_server.url()],
	);

	let err = manager
		.send_request(&MockTransport::new(), &version_request())
		.await
		.unwrap_err();

	match err {
		TransportError::Http { status_code, url, .. } => {
			assert_eq!(status_code, 429);
			assert_eq!(url, fallback_server.url());
		}
		other => panic!("Expected Http error, got {other:?}"),
	}
	primary_mock.assert_async().await;
	fallback_mock.assert_async().await;
}

#[tokio::test]
async fn test_no_fallback_urls_available() {
	let mut server = Server::new_async().await;

	let mock = server
		.mock("POST", "/")
		.with_status(429)
		.with_body("Rate limited")
		.expect(1)
		.create_async()
		.await;

	let manager = EndpointManager::new(get_mock_client_builder(), server.url().as_ref(), vec![]);

	let err = manager
		.send_request(&MockTransport::new(), &version_request())
		.await
		.unwrap_err();

	match err {
		TransportError::Http {
			status_code,
			url,
			body,
			..
		} => {
			assert_eq!(status_code, 429);
			assert_eq!(url, server.url());
			assert_eq!(body, "Rate limited");
		}
		_ => panic!("Expected Http error with status code 429"),
	}
	mock.assert_async().await;
}

#[tokio::test]
async fn test_rotate_url_no_fallbacks() {
	let server = Server::new_async().await;

	let manager = EndpointManager::new(get_mock_client_builder(), server.url().as_ref(), vec![]);
	let err = manager
		.try_rotate_url(&MockTransport::new())
		.await
		.unwrap_err();

	assert!(matches!(err, TransportError::UrlRotation(_)));
	assert!(err.to_string().contains("No fallback URLs available"));
	assert_eq!(&*manager.active_url.read().await, &server.url());
}

#[tokio::test]
async fn test_rotate_url_all_urls_match_active() {
	let server = Server::new_async().await;
	let active_url = server.url();

	let manager = EndpointManager::new(
		get_mock_client_builder(),
		active_url.as_ref(),
		vec![active_url.clone(), active_url.clone()],
	);
	let err = manager
		.try_rotate_url(&MockTransport::new())
		.await
		.unwrap_err();

	assert!(err.to_string().contains("No fallback URLs available"));
	assert_eq!(&*manager.active_url.read().await, &active_url);
}

#[tokio::test]
async fn test_network_error_rotates() {
	let mut fallback_server = Server::new_async().await;
	fallback_server
		.mock("GET", "/")
		.with_status(200)
		.create_async()
		.await;
	let fallback_mock = fallback_server
		.mock("POST", "/")
		.with_status(200)
		.with_body(r#"{"result": "ok"}"#)
		.expect(1)
		.create_async()
		.await;

	let manager = EndpointManager::new(
		get_mock_client_builder(),
		"http://127.0.0.1:1",
		vec![fallback_server.url()],
	);

	let result = manager
		.send_request(&MockTransport::new(), &version_request())
		.await
		.unwrap();

	assert_eq!(result["result"], "ok");
	fallback_mock.assert_async().await;
}

#[tokio::test]
async fn test_submit_rotates_when_never_connected() {
	let mut fallback_server = Server::new_async().await;
	fallback_server
		.mock("GET", "/")
		.with_status(200)
		.create_async()
		.await;
	let fallback_mock = fallback_server
		.mock("POST", "/")
		.with_status(200)
		.with_body(r#"{"result": "ok"}"#)
		.expect(1)
		.create_async()
		.await;

	let manager = EndpointManager::new(
		get_mock_client_builder(),
		"http://127.0.0.1:1",
		vec![fallback_server.url()],
	);

	let result = manager
		.send_request(&MockTransport::new(), &submit_request())
		.await
		.unwrap();

	assert_eq!(result["result"], "ok");
	fallback_mock.assert_async().await;
}

#[tokio::test]
async fn test_submit_is_not_resent_after_delivery() {
	let active_url = start_unresponsive_server().await;
	let mut fallback_server = Server::new_async().await;
	let untouched = fallback_server
		.mock("POST", "/")
		.expect(0)
		.create_async()
		.await;

	let client = reqwest::Client::builder()
		.timeout(Duration::from_millis(200))
		.build()
		.unwrap();
	let manager = EndpointManager::new(
		ClientBuilder::new(client).build(),
		&active_url,
		vec![fallback_server.url()],
	);

	let err = manager
		.send_request(&MockTransport::new(), &submit_request())
		.await
		.unwrap_err();

	assert!(matches!(err, TransportError::Network(_)));
	assert_eq!(&*manager.active_url.read().await, &active_url);
	untouched.assert_async().await;
}
