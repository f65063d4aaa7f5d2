mod common;

use common::fast_config;
use compute_engine::cluster::{GridMember, InMemoryGrid, MemberId, MembershipProvider};
use compute_engine::constants::cluster_objects::WORKER_UUIDS;
use compute_engine::lifecycle::{ComputeEngine, EngineState};
use compute_engine::EngineError;
use std::collections::HashSet;
use std::sync::Arc;

fn engine() -> ComputeEngine {
    ComputeEngine::builder()
        .config(fast_config(2))
        .build()
        .unwrap()
}

/// Worker UUIDs node-a published, as another member sees them
async fn published(observer: &GridMember) -> Option<HashSet<String>> {
    observer
        .replicated_set_map(WORKER_UUIDS)
        .unwrap()
        .get(&MemberId::from("node-a"))
        .await
        .unwrap()
}

fn assert_invalid_state(result: compute_engine::EngineResult<()>, expected: &str) {
    match result {
        Err(EngineError::InvalidState(message)) => assert_eq!(message, expected),
        other => panic!("expected InvalidState({expected}), got {other:?}"),
    }
}

#[tokio::test]
async fn test_startup_can_not_be_called_twice() {
    let engine = engine();
    engine.startup().await.unwrap();

    assert_invalid_state(
        engine.startup().await,
        "startup() can not be called multiple times",
    );
    assert_eq!(engine.state().await, EngineState::Started);
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stop_processing_before_startup_fails() {
    let engine = engine();
    assert_invalid_state(
        engine.stop_processing().await,
        "stop_processing() must not be called before startup()",
    );
    assert_eq!(engine.state().await, EngineState::Created);
}

#[tokio::test]
async fn test_stop_processing_after_shutdown_fails() {
    let engine = engine();
    engine.startup().await.unwrap();
    engine.shutdown().await.unwrap();

    assert_invalid_state(
        engine.stop_processing().await,
        "stop_processing() can not be called after shutdown()",
    );
}

#[tokio::test]
async fn test_stop_processing_can_not_be_called_twice() {
    let engine = engine();
    engine.startup().await.unwrap();
    engine.stop_processing().await.unwrap();

    assert_invalid_state(
        engine.stop_processing().await,
        "stop_processing() can not be called multiple times",
    );
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_before_startup_fails() {
    let engine = engine();
    assert_invalid_state(
        engine.shutdown().await,
        "shutdown() must not be called before startup()",
    );
}

#[tokio::test]
async fn test_shutdown_can_not_be_called_twice() {
    let engine = engine();
    engine.startup().await.unwrap();
    engine.shutdown().await.unwrap();

    assert_invalid_state(
        engine.shutdown().await,
        "shutdown() can not be called multiple times",
    );
    assert_eq!(engine.state().await, EngineState::ShutDown);
}

#[tokio::test]
async fn test_shutdown_directly_after_startup() {
    let engine = engine();
    engine.startup().await.unwrap();
    assert!(engine.scheduler().is_running());

    engine.shutdown().await.unwrap();
    assert_eq!(engine.state().await, EngineState::ShutDown);
    assert!(!engine.scheduler().is_running());
}

#[tokio::test]
async fn test_startup_after_shutdown_is_rejected() {
    let engine = engine();
    engine.startup().await.unwrap();
    engine.shutdown().await.unwrap();

    assert_invalid_state(
        engine.startup().await,
        "startup() can not be called multiple times",
    );
}

#[tokio::test]
async fn test_full_sequence_drives_processing_and_membership() {
    let grid = InMemoryGrid::new();
    let observer = grid.join("observer");

    let mut config = fast_config(2);
    config.cluster.enabled = true;
    let member: Arc<dyn MembershipProvider> = Arc::new(grid.join("node-a"));
    let engine = ComputeEngine::builder()
        .config(config)
        .membership_provider(member)
        .build()
        .unwrap();

    assert!(published(&observer).await.is_none());

    engine.startup().await.unwrap();
    assert_eq!(
        published(&observer).await,
        Some(engine.registry().worker_uuids())
    );
    assert!(engine.scheduler().is_running());

    engine.stop_processing().await.unwrap();
    assert_eq!(engine.state().await, EngineState::Stopped);
    assert!(!engine.scheduler().is_running());
    // Processing stopped, membership kept
    assert!(published(&observer).await.is_some());

    engine.shutdown().await.unwrap();
    assert!(published(&observer).await.is_none());
}

#[tokio::test]
async fn test_clustered_engine_requires_membership_provider() {
    let mut config = fast_config(1);
    config.cluster.enabled = true;

    let err = ComputeEngine::builder().config(config).build().unwrap_err();
    assert!(matches!(err, EngineError::ConfigurationError(_)));
}

#[tokio::test]
async fn test_invalid_config_is_rejected_by_builder() {
    let mut config = fast_config(1);
    config.workers.count = 0;

    let err = ComputeEngine::builder().config(config).build().unwrap_err();
    assert!(matches!(err, EngineError::ConfigurationError(_)));
}

#[tokio::test]
async fn test_diagnostics_follow_lifecycle() {
    let engine = engine();

    let snapshot = engine.diagnostics().await.unwrap();
    assert_eq!(snapshot.state, EngineState::Created);
    assert!(snapshot.cluster_worker_uuids.is_none());

    engine.startup().await.unwrap();
    let snapshot = engine.diagnostics().await.unwrap();
    assert_eq!(snapshot.state, EngineState::Started);
    assert_eq!(snapshot.local_worker_uuids.len(), 2);
    assert_eq!(
        snapshot.cluster_worker_uuids.as_ref(),
        Some(&snapshot.local_worker_uuids)
    );

    engine.shutdown().await.unwrap();
}
