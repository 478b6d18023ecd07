//! Configuration loading: YAML file, then `TRIPWIRE_*` environment overrides

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

use tripwire_core::domain::MonitorConfig;

/// Fallback config location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/tripwire.yaml";

const ENV_PREFIX: &str = "TRIPWIRE";

/// Pick the config file: the given path if it exists, else the default
/// location if it exists, else none (built-in defaults).
pub fn resolve_config_path(requested: Option<&Path>) -> Option<PathBuf> {
    let candidates = requested
        .map(|p| PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()))
        .into_iter()
        .chain(std::iter::once(PathBuf::from(DEFAULT_CONFIG_PATH)));

    for candidate in candidates {
        if candidate.is_file() {
            return Some(candidate);
        }
        debug!(path = %candidate.display(), "Config file not found");
    }
    None
}

pub struct ConfigLoader {
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::with_env_prefix(ENV_PREFIX)
    }
}

impl ConfigLoader {
    pub fn with_env_prefix(prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: prefix.into(),
        }
    }

    /// Load, expand `~` in paths and validate
    pub fn load(&self, path: Option<&Path>) -> Result<MonitorConfig> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .try_parsing(true),
        );

        let mut config: MonitorConfig = builder
            .build()
            .and_then(|c| c.try_deserialize::<MonitorConfig>())
            .with_context(|| match path {
                Some(p) => format!("Failed to load config from {}", p.display()),
                None => "Failed to load config from environment".to_string(),
            })?;

        expand_paths(&mut config);
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn expand_paths(config: &mut MonitorConfig) {
    let lock_path = config.file_lock_path.to_string_lossy().into_owned();
    config.file_lock_path = PathBuf::from(shellexpand::tilde(&lock_path).into_owned());
    config.log_file = shellexpand::tilde(&config.log_file).into_owned();
}
