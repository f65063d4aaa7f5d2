//! Layered configuration loading: defaults, optional file, environment.

use super::EngineConfig;
use crate::constants::defaults;
use crate::error::{EngineError, EngineResult};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Loads [`EngineConfig`] from the usual sources.
///
/// Sources, lowest precedence first:
/// 1. struct defaults (every section is `#[serde(default)]`)
/// 2. the file at `path`, format chosen by extension
/// 3. `ENGINE_<SECTION>__<KEY>` environment variables
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: Option<&Path>) -> EngineResult<EngineConfig> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(EngineError::configuration(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            debug!(path = %path.display(), "Loading engine configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }

        Self::finish(Self::with_environment(builder))
    }

    /// Load from an in-memory TOML document, still honouring environment overrides
    pub fn load_from_toml(content: &str) -> EngineResult<EngineConfig> {
        let builder = Config::builder().add_source(File::from_str(content, FileFormat::Toml));
        Self::finish(Self::with_environment(builder))
    }

    fn with_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> EngineResult<EngineConfig> {
        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            workers = config.workers.count,
            cluster_enabled = config.cluster.enabled,
            max_execution_count = config.queue.max_execution_count,
            "Engine configuration loaded"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = ConfigLoader::load_from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = ConfigLoader::load_from_toml(
            r#"
            [workers]
            count = 3

            [cluster]
            enabled = true
            member_id = "node-a"
            "#,
        )
        .unwrap();

        assert_eq!(config.workers.count, 3);
        assert!(config.cluster.enabled);
        assert_eq!(config.cluster.member_id.as_deref(), Some("node-a"));
        assert_eq!(config.queue.max_execution_count, 1);
        assert!(config.clean_job.enabled);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let result = ConfigLoader::load_from_toml("[workers]\ncount = 42\n");
        assert!(matches!(result, Err(EngineError::ConfigurationError(_))));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ConfigLoader::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(
            result,
            Err(EngineError::ConfigurationError(msg)) if msg.contains("not found")
        ));
    }
}
