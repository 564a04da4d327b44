use mockito::{Matcher, Server};
use serde_json::json;

use crate::integration::mocks::{fast_retry, no_retry, rpc_reply};
use poly_client::{
	models::{RawTransaction, TransportKind},
	services::{
		client::{ClientError, ClientManager},
		transports::{NodeTransport, RpcTransportClient, TransportError},
	},
	utils::tests::builders::client_config::ClientConfigBuilder,
};

fn rpc_client(urls: &[&str]) -> RpcTransportClient {
	let urls: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
	RpcTransportClient::new(&urls, &no_retry()).unwrap()
}

#[tokio::test]
async fn test_block_count_is_reported_as_height() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({
			"jsonrpc": "2.0",
			"method": "getblockcount",
			"id": "7"
		})))
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(rpc_reply("7", json!(11)).to_string())
		.expect(1)
		.create_async()
		.await;

	let client = rpc_client(&[&server.url()]);
	assert_eq!(client.kind(), TransportKind::Rpc);

	let height = client.get_current_block_height("7").await.unwrap();
	assert_eq!(height, json!(10));

	mock.assert_async().await;
}

#[tokio::test]
async fn test_storage_key_is_hex_encoded() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({
			"method": "getstorage",
			"params": ["0200000000000000000000000000000000000000", "6b6579"]
		})))
		.with_status(200)
		.with_body(rpc_reply("1", json!("0a0b")).to_string())
		.create_async()
		.await;

	let config = ClientConfigBuilder::new()
		.rpc_url(&server.url())
		.retry(no_retry())
		.build();
	let manager = ClientManager::from_config(&config).await.unwrap();

	let value = manager
		.get_storage("0200000000000000000000000000000000000000", b"key")
		.await
		.unwrap();
	assert_eq!(value, vec![0x0a, 0x0b]);

	mock.assert_async().await;
}

#[tokio::test]
async fn test_node_error_is_surfaced() {
	let mut server = Server::new_async().await;
	server
		.mock("POST", "/")
		.with_status(200)
		.with_body(
			json!({
				"desc": "INVALID PARAMS",
				"error": 42002,
				"id": "1",
				"jsonrpc": "2.0",
				"result": ""
			})
			.to_string(),
		)
		.create_async()
		.await;

	let client = rpc_client(&[&server.url()]);
	let err = client.get_block_by_height("1", 1).await.unwrap_err();

	match err {
		TransportError::Node { code, desc, .. } => {
			assert_eq!(code, 42002);
			assert_eq!(desc, "INVALID PARAMS");
		}
		other => panic!("unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn test_rotates_to_fallback_on_rate_limit() {
	let mut primary = Server::new_async().await;
	let mut fallback = Server::new_async().await;

	let limited = primary
		.mock("POST", "/")
		.with_status(429)
		.with_body("Too Many Requests")
		.expect(1)
		.create_async()
		.await;
	let version = fallback
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({"method": "getversion"})))
		.with_status(200)
		.with_body(rpc_reply("0", json!("1.9.0")).to_string())
		.expect_at_least(1)
		.create_async()
		.await;
	let network_id = fallback
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({"method": "getnetworkid"})))
		.with_status(200)
		.with_body(rpc_reply("1", json!(2)).to_string())
		.expect(1)
		.create_async()
		.await;

	let client = rpc_client(&[&primary.url(), &fallback.url()]);
	let result = client.get_network_id("1").await.unwrap();

	assert_eq!(result, json!(2));
	assert_eq!(client.get_current_url().await, fallback.url());

	limited.assert_async().await;
	version.assert_async().await;
	network_id.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_without_fallback_fails() {
	let mut server = Server::new_async().await;
	server
		.mock("POST", "/")
		.with_status(429)
		.create_async()
		.await;

	let client = rpc_client(&[&server.url()]);
	let err = client.get_version("1").await.unwrap_err();

	match err {
		TransportError::Http { status_code, .. } => assert_eq!(status_code.as_u16(), 429),
		other => panic!("unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn test_server_error_does_not_rotate() {
	let mut primary = Server::new_async().await;
	let mut fallback = Server::new_async().await;

	primary
		.mock("POST", "/")
		.with_status(500)
		.with_body("boom")
		.create_async()
		.await;
	let untouched = fallback
		.mock("POST", "/")
		.expect(0)
		.create_async()
		.await;

	let client = rpc_client(&[&primary.url(), &fallback.url()]);
	let err = client.get_version("1").await.unwrap_err();

	assert!(matches!(err, TransportError::Http { .. }));
	assert_eq!(client.get_current_url().await, primary.url());
	untouched.assert_async().await;
}

#[tokio::test]
async fn test_unparseable_reply_is_a_parse_error() {
	let mut server = Server::new_async().await;
	server
		.mock("POST", "/")
		.with_status(200)
		.with_body("not json")
		.create_async()
		.await;

	let config = ClientConfigBuilder::new()
		.rpc_url(&server.url())
		.retry(no_retry())
		.build();
	let manager = ClientManager::from_config(&config).await.unwrap();

	let err = manager.get_version().await.unwrap_err();
	assert!(matches!(
		err,
		ClientError::Transport(TransportError::ResponseParse(_))
	));
}

#[test]
fn test_new_requires_urls() {
	assert!(RpcTransportClient::new(&[], &no_retry()).is_err());
	assert!(RpcTransportClient::new(&["not a url".to_string()], &no_retry()).is_err());
}

#[tokio::test]
async fn test_failed_submit_is_not_replayed() {
	let mut primary = Server::new_async().await;
	let mut fallback = Server::new_async().await;

	let submit = primary
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({"method": "sendrawtransaction"})))
		.with_status(503)
		.expect(1)
		.create_async()
		.await;
	let untouched = fallback
		.mock("POST", "/")
		.expect(0)
		.create_async()
		.await;

	let urls = vec![primary.url(), fallback.url()];
	let client = RpcTransportClient::new(&urls, &fast_retry()).unwrap();
	let err = client
		.send_raw_transaction("1", &RawTransaction::new(vec![0x00, 0xd1]), false)
		.await
		.unwrap_err();

	assert!(matches!(err, TransportError::Http { .. }));
	submit.assert_async().await;
	untouched.assert_async().await;
}

#[tokio::test]
async fn test_failed_query_is_retried() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/")
		.with_status(503)
		.expect(4)
		.create_async()
		.await;

	let client = RpcTransportClient::new(&[server.url()], &fast_retry()).unwrap();
	let err = client.get_version("1").await.unwrap_err();

	assert!(matches!(err, TransportError::Http { .. }));
	mock.assert_async().await;
}
