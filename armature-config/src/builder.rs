// SnapshotBuilder - assembles a ConfigSnapshot from files, .env and the environment

use crate::{ConfigError, ConfigLoader, ConfigSnapshot, EnvLoader, FileFormat, Result};
use serde_json::Value;
use tracing::{debug, info};

/// Builder for [`ConfigSnapshot`].
///
/// Sources are applied lowest precedence first: configuration files in the
/// order they were added, then `.env`/environment variables, then values set
/// explicitly on the builder.
pub struct SnapshotBuilder {
    env_prefix: Option<String>,
    load_env: bool,
    load_dotenv: bool,
    dotenv_path: Option<String>,
    config_files: Vec<(String, Option<FileFormat>)>,
    overrides: ConfigSnapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            env_prefix: None,
            load_env: false,
            load_dotenv: false,
            dotenv_path: None,
            config_files: Vec::new(),
            overrides: ConfigSnapshot::new(),
        }
    }

    /// Set environment variable prefix
    pub fn with_prefix(mut self, prefix: String) -> Self {
        self.env_prefix = Some(prefix);
        self
    }

    /// Enable loading from environment variables
    pub fn load_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Enable loading from .env file, then from the environment
    pub fn load_dotenv(mut self, path: Option<String>) -> Self {
        self.load_dotenv = true;
        self.dotenv_path = path;
        self
    }

    /// Add configuration file to load
    pub fn add_file(mut self, path: String, format: FileFormat) -> Self {
        self.config_files.push((path, Some(format)));
        self
    }

    /// Add configuration file, detecting the format from its extension
    pub fn add_file_auto(mut self, path: String) -> Self {
        self.config_files.push((path, None));
        self
    }

    /// Set a value that overrides every other source
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.set(key, value);
        self
    }

    /// Build the snapshot
    pub fn build(self) -> Result<ConfigSnapshot> {
        let mut snapshot = ConfigSnapshot::new();

        for (path, format) in &self.config_files {
            let loader = match format {
                Some(format) => ConfigLoader::new(*format),
                None => ConfigLoader::auto(path)?,
            };
            snapshot.merge(ConfigSnapshot::from_value(loader.load_file(path)?)?);
            debug!(path = %path, "Loaded configuration file");
        }

        if self.load_dotenv {
            match self.dotenv_path.as_deref() {
                Some(path) => {
                    dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
                }
                None => {
                    dotenvy::dotenv().ok(); // Ignore if .env doesn't exist
                }
            }
        }

        if self.load_env || self.load_dotenv {
            let env_vars = EnvLoader::new(self.env_prefix.clone()).load();
            for (key, value) in env_vars {
                snapshot.set(key, value);
            }
        }

        snapshot.merge(self.overrides);

        info!(properties = snapshot.len(), "Configuration snapshot built");
        Ok(snapshot)
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
