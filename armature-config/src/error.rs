// Error types for configuration management

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Property '{key}' must be {expected}")]
    InvalidStructure { key: String, expected: &'static str },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ConfigError {
    pub(crate) fn structure(key: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidStructure {
            key: key.into(),
            expected,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
