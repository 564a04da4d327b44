use serde_json::json;
use std::{
	sync::{
		atomic::{AtomicU32, Ordering},
		Arc, Mutex,
	},
	time::Duration,
};
use tokio::time::Instant;

use crate::integration::mocks::{answering_transport, mock_transport};
use poly_client::{
	models::{MemPoolTxCount, RawTransaction, TransportKind, Uint256},
	services::{
		client::{ClientError, ClientManager},
		transports::{NodeRequest, TransportError},
	},
};

const TX_HASH: &str = "a5a3ffd62d6c2d2e1d3fbd7a5ba9ad1a3f47a6c5dd15bd8a6ad2f3b1c0e2d4f1";

/// A manager whose RPC transport reports the heights produced by `height_at`
///
/// `height_at` receives the zero-based index of the height read.
fn manager_with_heights(height_at: fn(u32) -> Result<u32, TransportError>) -> ClientManager {
	let calls = Arc::new(AtomicU32::new(0));
	let mut transport = mock_transport(TransportKind::Rpc);
	transport
		.expect_send_request()
		.withf(|_, request| *request == NodeRequest::CurrentBlockHeight)
		.returning(move |_, _| {
			let call = calls.fetch_add(1, Ordering::SeqCst);
			height_at(call).map(|height| json!(height))
		});

	let mut manager = ClientManager::new();
	manager.set_rpc_client(Arc::new(transport));
	manager
}

#[tokio::test]
async fn test_default_client_takes_priority() {
	let mut manager = ClientManager::new();
	manager.set_rpc_client(answering_transport(TransportKind::Rpc, json!(1)));
	manager.set_rest_client(answering_transport(TransportKind::Rest, json!(2)));
	manager.set_default_client(answering_transport(TransportKind::Ws, json!(3)));

	assert_eq!(manager.active_client().unwrap().kind(), TransportKind::Ws);
	assert_eq!(manager.get_current_block_height().await.unwrap(), 3);
}

#[tokio::test]
async fn test_rpc_preferred_over_rest_and_ws() {
	let mut manager = ClientManager::new();
	manager.set_ws_client(answering_transport(TransportKind::Ws, json!(3)));
	manager.set_rest_client(answering_transport(TransportKind::Rest, json!(2)));
	assert_eq!(manager.get_current_block_height().await.unwrap(), 2);

	manager.set_rpc_client(answering_transport(TransportKind::Rpc, json!(1)));
	assert_eq!(manager.get_current_block_height().await.unwrap(), 1);
}

#[tokio::test]
async fn test_ws_used_when_only_client() {
	let mut manager = ClientManager::new();
	manager.set_ws_client(answering_transport(TransportKind::Ws, json!("1.9.0")));

	assert_eq!(manager.get_version().await.unwrap(), "1.9.0");
}

#[tokio::test]
async fn test_no_available_client() {
	let manager = ClientManager::new();

	let err = manager.get_current_block_height().await.unwrap_err();
	assert!(matches!(err, ClientError::NoAvailableClient));
	assert_eq!(err.to_string(), "don't have available client of poly");

	let err = manager.get_storage("0100", b"key").await.unwrap_err();
	assert!(matches!(err, ClientError::NoAvailableClient));
}

#[tokio::test]
async fn test_each_request_gets_a_fresh_qid() {
	let seen = Arc::new(Mutex::new(Vec::new()));
	let recorded = seen.clone();

	let mut transport = mock_transport(TransportKind::Rpc);
	transport.expect_send_request().returning(move |qid, _| {
		recorded.lock().unwrap().push(qid.to_string());
		Ok(json!(7))
	});

	let mut manager = ClientManager::new();
	manager.set_rpc_client(Arc::new(transport));

	for _ in 0..3 {
		manager.get_network_id().await.unwrap();
	}

	assert_eq!(*seen.lock().unwrap(), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_requests_are_routed_with_arguments() {
	let mut transport = mock_transport(TransportKind::Rest);
	transport
		.expect_send_request()
		.withf(|_, request| {
			*request
				== NodeRequest::Storage {
					contract_address: "0200000000000000000000000000000000000000".to_string(),
					key: vec![0x6b, 0x65, 0x79],
				}
		})
		.times(1)
		.returning(|_, _| Ok(json!("0a0b")));
	transport
		.expect_send_request()
		.withf(|_, request| {
			*request
				== NodeRequest::MerkleProof {
					block_height: 10,
					root_height: 20,
				}
		})
		.times(1)
		.returning(|_, _| {
			Ok(json!({
				"Type": "MerkleProof",
				"TransactionsRoot": "",
				"BlockHeight": 10,
				"CurBlockRoot": "",
				"CurBlockHeight": 20,
				"TargetHashes": []
			}))
		});

	let mut manager = ClientManager::new();
	manager.set_rest_client(Arc::new(transport));

	let value = manager
		.get_storage("0200000000000000000000000000000000000000", b"key")
		.await
		.unwrap();
	assert_eq!(value, vec![0x0a, 0x0b]);

	let proof = manager.get_merkle_proof(10, 20).await.unwrap();
	assert_eq!(proof.block_height, Some(10));
	assert_eq!(proof.cur_block_height, Some(20));
}

#[tokio::test]
async fn test_absent_values_decode_to_empty() {
	let mut manager = ClientManager::new();
	manager.set_rpc_client(answering_transport(TransportKind::Rpc, json!(null)));

	assert!(manager.get_storage("0100", b"k").await.unwrap().is_empty());
	assert!(manager.get_smart_contract_event(TX_HASH).await.unwrap().is_none());
	assert!(manager
		.get_smart_contract_events_by_block(5)
		.await
		.unwrap()
		.is_empty());
}

#[tokio::test]
async fn test_send_and_pre_exec_transaction() {
	let mut transport = mock_transport(TransportKind::Rpc);
	transport
		.expect_send_request()
		.withf(|_, request| {
			matches!(request, NodeRequest::SendRawTransaction { pre_exec: false, .. })
		})
		.returning(|_, _| Ok(json!(TX_HASH)));
	transport
		.expect_send_request()
		.withf(|_, request| {
			matches!(request, NodeRequest::SendRawTransaction { pre_exec: true, .. })
		})
		.returning(|_, _| Ok(json!({"State": 1, "Gas": 20000, "Result": "01", "Notify": []})));

	let mut manager = ClientManager::new();
	manager.set_rpc_client(Arc::new(transport));
	let tx = RawTransaction::new(vec![0x00, 0xd1, 0x02]);

	let hash = manager.send_transaction(&tx).await.unwrap();
	assert_eq!(hash, TX_HASH.parse::<Uint256>().unwrap());

	let result = manager.pre_exec_transaction(&tx).await.unwrap();
	assert_eq!(result.state, 1);
}

#[tokio::test]
async fn test_mem_pool_tx_count() {
	let mut manager = ClientManager::new();
	manager.set_rpc_client(answering_transport(TransportKind::Rpc, json!([3, 1])));

	assert_eq!(
		manager.get_mem_pool_tx_count().await.unwrap(),
		MemPoolTxCount {
			verified: 3,
			verifying: 1,
		}
	);
}

#[tokio::test]
async fn test_decode_failure_is_reported() {
	let mut manager = ClientManager::new();
	manager.set_rpc_client(answering_transport(TransportKind::Rpc, json!({"unexpected": true})));

	let err = manager.get_current_block_height().await.unwrap_err();
	assert!(matches!(err, ClientError::Decode(_)));

	let err = manager.get_current_block_hash().await.unwrap_err();
	assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn test_transport_failure_is_reported() {
	let mut transport = mock_transport(TransportKind::Rpc);
	transport
		.expect_send_request()
		.returning(|_, _| Err(TransportError::node(42002, "INVALID PARAMS", None)));

	let mut manager = ClientManager::new();
	manager.set_rpc_client(Arc::new(transport));

	let err = manager.get_block_by_height(1).await.unwrap_err();
	match err {
		ClientError::Transport(TransportError::Node { code, desc, .. }) => {
			assert_eq!(code, 42002);
			assert_eq!(desc, "INVALID PARAMS");
		}
		other => panic!("unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn test_manager_is_shareable_across_tasks() {
	let mut manager = ClientManager::new();
	manager.set_rpc_client(answering_transport(TransportKind::Rpc, json!(9)));
	let manager = Arc::new(manager);

	let handles: Vec<_> = (0..8)
		.map(|_| {
			let manager = manager.clone();
			tokio::spawn(async move { manager.get_current_block_height().await })
		})
		.collect();

	for handle in handles {
		assert_eq!(handle.await.unwrap().unwrap(), 9);
	}
	assert_eq!(manager.next_qid(), "9");
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_generate_block_success() {
	// Start at 100, stay there for one tick, then grow one block per tick
	let manager = manager_with_heights(|call| Ok(100 + call.saturating_sub(1)));

	let started = Instant::now();
	let generated = manager
		.wait_for_generate_block(Duration::from_secs(10), None)
		.await
		.unwrap();

	assert!(generated);
	assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_generate_block_zero_means_default() {
	let manager = manager_with_heights(|call| Ok(100 + call));

	let started = Instant::now();
	let generated = manager
		.wait_for_generate_block(Duration::from_secs(10), Some(0))
		.await
		.unwrap();

	assert!(generated);
	assert_eq!(started.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_generate_block_custom_count() {
	let manager = manager_with_heights(|call| Ok(100 + call));

	let started = Instant::now();
	assert!(manager
		.wait_for_generate_block(Duration::from_secs(10), Some(4))
		.await
		.unwrap());
	assert_eq!(started.elapsed(), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_generate_block_timeout() {
	let manager = manager_with_heights(|_| Ok(100));

	let started = Instant::now();
	let err = manager
		.wait_for_generate_block(Duration::from_secs(3), None)
		.await
		.unwrap_err();

	assert!(matches!(err, ClientError::Timeout(_)));
	assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_generate_block_sub_second_timeout_polls_once() {
	let manager = manager_with_heights(|_| Ok(100));

	let started = Instant::now();
	let err = manager
		.wait_for_generate_block(Duration::from_millis(200), None)
		.await
		.unwrap_err();

	assert!(matches!(err, ClientError::Timeout(_)));
	assert_eq!(started.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_generate_block_skips_failed_reads() {
	let manager = manager_with_heights(|call| match call {
		0 => Ok(100),
		1 | 2 => Err(TransportError::network("connection reset", None, None)),
		_ => Ok(102),
	});

	let started = Instant::now();
	assert!(manager
		.wait_for_generate_block(Duration::from_secs(10), None)
		.await
		.unwrap());
	assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_generate_block_initial_failure() {
	let manager = manager_with_heights(|_| Err(TransportError::network("unreachable", None, None)));

	let started = Instant::now();
	let err = manager
		.wait_for_generate_block(Duration::from_secs(10), None)
		.await
		.unwrap_err();

	assert!(matches!(
		err,
		ClientError::Transport(TransportError::Network(_))
	));
	assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn test_wait_without_client() {
	let manager = ClientManager::new();
	let err = manager
		.wait_for_generate_block(Duration::from_secs(1), None)
		.await
		.unwrap_err();
	assert!(matches!(err, ClientError::NoAvailableClient));
}
