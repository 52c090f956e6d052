//! AWS error types.

use armature_config::ConfigError;
use thiserror::Error;

/// Result type for AWS operations.
pub type Result<T> = std::result::Result<T, AwsError>;

/// AWS integration errors.
///
/// Every variant is fatal to startup; nothing here is retried.
#[derive(Debug, Error)]
pub enum AwsError {
    /// No region strategy produced a region.
    #[error("Unable to resolve an AWS region, tried: {}", .0.join(", "))]
    RegionUnresolved(Vec<&'static str>),

    /// Configuration is structurally malformed or holds an invalid value.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// More than one RDS instance configurer was supplied.
    #[error("Only one RdsInstanceConfigurer may exist, found {0}")]
    MultipleConfigurers(usize),

    /// The RDS API does not know the database instance.
    #[error("No database instance found for identifier '{0}'")]
    InstanceNotFound(String),

    /// The instance runs an engine no datasource can be built for.
    #[error("Database engine '{0}' is not supported")]
    UnsupportedEngine(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Service error.
    #[error("AWS service error: {0}")]
    Service(String),
}

impl From<ConfigError> for AwsError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfiguration(err.to_string())
    }
}
