use compute_engine::config::{ConfigLoader, EngineConfig};
use compute_engine::EngineError;
use parking_lot::Mutex;
use std::io::Write;
use tokio_test::{assert_err, assert_ok};

// Loading always reads ENGINE_* variables, so tests touching them run one at a time
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn toml_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_without_file_yields_defaults() {
    let _guard = ENV_LOCK.lock();
    let config = assert_ok!(ConfigLoader::load(None));
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn test_load_from_toml_file() {
    let _guard = ENV_LOCK.lock();
    let file = toml_file(
        r#"
        [workers]
        count = 4

        [queue]
        max_execution_count = 3
        default_organization_id = "acme"
        node_name = "node-a"

        [scheduler]
        poll_delay_ms = 250

        [clean_job]
        enabled = false

        [logging]
        level = "debug"
        json = true
        "#,
    );

    let config = assert_ok!(ConfigLoader::load(Some(file.path())));
    assert_eq!(config.workers.count, 4);
    assert_eq!(config.queue.max_execution_count, 3);
    assert_eq!(config.queue.default_organization_id, "acme");
    assert_eq!(config.queue.node_name.as_deref(), Some("node-a"));
    assert_eq!(config.scheduler.poll_delay_ms, 250);
    assert_eq!(
        config.scheduler.disabled_delay_ms,
        EngineConfig::default().scheduler.disabled_delay_ms
    );
    assert!(!config.clean_job.enabled);
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert!(!config.cluster.enabled);
}

#[test]
fn test_missing_file_is_reported() {
    let _guard = ENV_LOCK.lock();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");

    match ConfigLoader::load(Some(path.as_path())) {
        Err(EngineError::ConfigurationError(message)) => {
            assert!(message.contains("not found"));
            assert!(message.contains("engine.toml"));
        }
        other => panic!("expected ConfigurationError, got {other:?}"),
    }
}

#[test]
fn test_environment_overrides_file() {
    let _guard = ENV_LOCK.lock();
    let file = toml_file("[workers]\ncount = 2\n\n[cluster]\nenabled = false\n");

    std::env::set_var("ENGINE_WORKERS__COUNT", "5");
    std::env::set_var("ENGINE_CLUSTER__ENABLED", "true");
    let result = ConfigLoader::load(Some(file.path()));
    std::env::remove_var("ENGINE_WORKERS__COUNT");
    std::env::remove_var("ENGINE_CLUSTER__ENABLED");

    let config = assert_ok!(result);
    assert_eq!(config.workers.count, 5);
    assert!(config.cluster.enabled);
}

#[test]
fn test_out_of_range_values_fail_validation() {
    let _guard = ENV_LOCK.lock();
    for document in [
        "[workers]\ncount = 0\n",
        "[workers]\ncount = 11\n",
        "[queue]\nmax_execution_count = 0\n",
        "[queue]\ndefault_organization_id = \"  \"\n",
        "[queue]\nnode_name = \"\"\n",
        "[scheduler]\npoll_delay_ms = 0\n",
        "[clean_job]\nenabled = true\ninterval_ms = 0\n",
    ] {
        let err = assert_err!(ConfigLoader::load_from_toml(document));
        assert!(
            matches!(err, EngineError::ConfigurationError(_)),
            "{document} gave {err:?}"
        );
    }
}

#[test]
fn test_malformed_document_is_a_configuration_error() {
    let _guard = ENV_LOCK.lock();
    let err = assert_err!(ConfigLoader::load_from_toml("[workers]\ncount = \"many\"\n"));
    assert!(matches!(err, EngineError::ConfigurationError(_)));
}

#[test]
fn test_disabled_clean_job_may_have_zero_interval() {
    let _guard = ENV_LOCK.lock();
    let config = assert_ok!(ConfigLoader::load_from_toml(
        "[clean_job]\nenabled = false\ninterval_ms = 0\n"
    ));
    assert_eq!(config.clean_job.interval_ms, 0);
}
