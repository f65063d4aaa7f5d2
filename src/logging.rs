//! # Structured Logging Module
//!
//! Console logging through the tracing ecosystem. The filter comes from
//! `RUST_LOG` when set, otherwise from [`LoggingConfig::level`]; output is
//! either human-readable or JSON lines.

use crate::config::LoggingConfig;
use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize the global subscriber once; later calls are no-ops
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = build_filter(&config.level);

        let layer = if config.json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(std::io::stdout().is_terminal())
                .with_filter(filter)
                .boxed()
        };

        // A global subscriber may already exist (embedding application, tests)
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - keeping it");
            return;
        }

        tracing::info!(
            level = %config.level,
            json = config.json,
            pid = std::process::id(),
            "🔧 Structured logging initialized"
        );
    });
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log one queue mutation with its task context
pub fn log_queue_operation(
    operation: &str,
    task_uuid: &str,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        task_uuid = %task_uuid,
        status = %status,
        details = details,
        "📋 QUEUE_OPERATION"
    );
}

/// Log a cluster membership change made by this process
pub fn log_cluster_operation(operation: &str, member_id: &str, details: Option<&str>) {
    tracing::info!(
        operation = %operation,
        member_id = %member_id,
        details = details,
        "🌐 CLUSTER_OPERATION"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        // Must not panic on a directive EnvFilter can't parse
        let _ = build_filter("not[a(valid directive");
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        init_structured_logging(&config);
        init_structured_logging(&config);
    }
}
