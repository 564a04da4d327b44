use mockito::{Matcher, Server};
use serde_json::json;

use crate::integration::mocks::{fast_retry, no_retry, node_reply};
use poly_client::{
	models::{RawTransaction, TransportKind, Uint256},
	services::{
		client::{ClientError, ClientManager},
		transports::{NodeTransport, RestTransportClient, TransportError},
	},
	utils::tests::builders::client_config::ClientConfigBuilder,
};

const TX_HASH: &str = "f1d4e2c0b1f3d2a68abd15ddc5a6473f1aada95b7abd3f1d2e2d6c2dd6ffa3a5";

async fn rest_manager(server: &Server) -> ClientManager {
	let config = ClientConfigBuilder::new()
		.clear_urls()
		.rest_url(&server.url())
		.retry(no_retry())
		.build();
	ClientManager::from_config(&config).await.unwrap()
}

#[tokio::test]
async fn test_current_block_height() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("GET", "/api/v1/block/height")
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(node_reply("getblockheight", None, json!(10)).to_string())
		.expect(1)
		.create_async()
		.await;

	let manager = rest_manager(&server).await;
	assert_eq!(manager.active_client().unwrap().kind(), TransportKind::Rest);
	assert_eq!(manager.get_current_block_height().await.unwrap(), 10);

	mock.assert_async().await;
}

#[tokio::test]
async fn test_storage_route_and_absent_value() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock(
			"GET",
			"/api/v1/storage/0200000000000000000000000000000000000000/6b6579",
		)
		.with_status(200)
		.with_body(node_reply("getstorage", None, json!("")).to_string())
		.expect(1)
		.create_async()
		.await;

	let manager = rest_manager(&server).await;
	let value = manager
		.get_storage("0200000000000000000000000000000000000000", b"key")
		.await
		.unwrap();
	assert!(value.is_empty());

	mock.assert_async().await;
}

#[tokio::test]
async fn test_events_by_block() {
	let mut server = Server::new_async().await;
	server
		.mock("GET", "/api/v1/smartcode/event/transactions/12")
		.with_status(200)
		.with_body(
			node_reply(
				"getsmartcodeeventbyheight",
				None,
				json!([{
					"TxHash": TX_HASH,
					"State": 1,
					"GasConsumed": 0,
					"Notify": [{
						"ContractAddress": "0100000000000000000000000000000000000000",
						"States": ["transfer", "from", "to", 10]
					}]
				}]),
			)
			.to_string(),
		)
		.create_async()
		.await;

	let manager = rest_manager(&server).await;
	let events = manager.get_smart_contract_events_by_block(12).await.unwrap();

	assert_eq!(events.len(), 1);
	assert_eq!(events[0].tx_hash, TX_HASH.parse::<Uint256>().unwrap());
	assert_eq!(
		events[0].notify[0].contract_address,
		"0100000000000000000000000000000000000000"
	);
}

#[tokio::test]
async fn test_send_transaction_posts_hex_payload() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/api/v1/transaction")
		.match_query(Matcher::Missing)
		.match_body(Matcher::PartialJson(json!({
			"Action": "sendrawtransaction",
			"Data": "00d102"
		})))
		.with_status(200)
		.with_body(node_reply("sendrawtransaction", None, json!(TX_HASH)).to_string())
		.expect(1)
		.create_async()
		.await;

	let manager = rest_manager(&server).await;
	let hash = manager
		.send_transaction(&RawTransaction::new(vec![0x00, 0xd1, 0x02]))
		.await
		.unwrap();

	assert_eq!(hash.to_hex_string(), TX_HASH);
	mock.assert_async().await;
}

#[tokio::test]
async fn test_pre_exec_sets_query_flag() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", Matcher::Regex("^/api/v1/transaction".to_string()))
		.match_query(Matcher::UrlEncoded("preExec".to_string(), "1".to_string()))
		.with_status(200)
		.with_body(
			node_reply(
				"sendrawtransaction",
				None,
				json!({"State": 1, "Gas": 20000, "Result": "01", "Notify": []}),
			)
			.to_string(),
		)
		.expect(1)
		.create_async()
		.await;

	let manager = rest_manager(&server).await;
	let result = manager
		.pre_exec_transaction(&RawTransaction::new(vec![0x00]))
		.await
		.unwrap();

	assert_eq!(result.state, 1);
	assert_eq!(result.gas, 20000);
	mock.assert_async().await;
}

#[tokio::test]
async fn test_node_error_is_surfaced() {
	let mut server = Server::new_async().await;
	server
		.mock("GET", "/api/v1/block/details/height/99999999")
		.with_status(200)
		.with_body(
			json!({
				"Action": "getblockbyheight",
				"Desc": "UNKNOWN BLOCK",
				"Error": 44001,
				"Result": "",
				"Version": "1.0.0"
			})
			.to_string(),
		)
		.create_async()
		.await;

	let manager = rest_manager(&server).await;
	let err = manager.get_block_by_height(99999999).await.unwrap_err();

	match err {
		ClientError::Transport(TransportError::Node { code, desc, .. }) => {
			assert_eq!(code, 44001);
			assert_eq!(desc, "UNKNOWN BLOCK");
		}
		other => panic!("unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn test_block_info_is_unsupported() {
	let server = Server::new_async().await;
	let manager = rest_manager(&server).await;

	let err = manager.get_block_info_by_height(1).await.unwrap_err();
	assert!(matches!(
		err,
		ClientError::Transport(TransportError::Unsupported(_))
	));
}

#[tokio::test]
async fn test_rotates_to_fallback_on_rate_limit() {
	let mut primary = Server::new_async().await;
	let mut fallback = Server::new_async().await;

	primary
		.mock("GET", "/api/v1/version")
		.with_status(429)
		.expect(1)
		.create_async()
		.await;
	let version = fallback
		.mock("GET", "/api/v1/version")
		.with_status(200)
		.with_body(node_reply("getversion", None, json!("1.9.0")).to_string())
		.expect_at_least(1)
		.create_async()
		.await;

	let urls = vec![primary.url(), fallback.url()];
	let client = RestTransportClient::new(&urls, &no_retry()).unwrap();

	let result = client.get_version("1").await.unwrap();
	assert_eq!(result, json!("1.9.0"));
	assert_eq!(client.get_current_url().await, fallback.url());

	version.assert_async().await;
}

#[tokio::test]
async fn test_failed_submit_is_not_replayed() {
	let mut server = Server::new_async().await;
	let submit = server
		.mock("POST", "/api/v1/transaction")
		.with_status(503)
		.expect(1)
		.create_async()
		.await;

	let client = RestTransportClient::new(&[server.url()], &fast_retry()).unwrap();
	let err = client
		.send_raw_transaction("1", &RawTransaction::new(vec![0xab]), false)
		.await
		.unwrap_err();

	assert!(matches!(err, TransportError::Http { .. }));
	submit.assert_async().await;
}
