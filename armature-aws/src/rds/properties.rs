//! Typed RDS settings.

use std::fmt;

use armature_config::{ConfigSnapshot, FromProperties, PropertyTable, Validate};
use serde::Serialize;

use crate::config::RDS_CONFIG_PREFIX;
use crate::{EndpointProperties, Result};

/// Settings bound from `cloud.aws.rds-config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdsConfigProperties {
    /// Whether RDS support activates at all.
    pub enabled: bool,
    /// Replacement for the RDS client's default endpoint.
    pub endpoint: Option<EndpointProperties>,
}

impl Default for RdsConfigProperties {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
        }
    }
}

impl RdsConfigProperties {
    /// Bind and validate from a snapshot.
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Result<Self> {
        Ok(snapshot.bind_validated(RDS_CONFIG_PREFIX)?)
    }
}

impl FromProperties for RdsConfigProperties {
    fn from_properties(table: &PropertyTable) -> armature_config::Result<Self> {
        let endpoint = table
            .table("endpoint")?
            .map(|endpoint| EndpointProperties::from_properties(&endpoint))
            .transpose()?;

        Ok(Self {
            enabled: table.strict_bool("enabled")?.unwrap_or(true),
            endpoint,
        })
    }
}

impl Validate for RdsConfigProperties {
    fn validate(&self) -> armature_config::Result<()> {
        match &self.endpoint {
            Some(endpoint) => endpoint.validate(),
            None => Ok(()),
        }
    }
}

/// One named database instance.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RdsInstanceProperties {
    /// RDS instance identifier, also the registry key.
    pub identifier: String,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub database_name: Option<String>,
    pub read_replica_support: bool,
}

impl RdsInstanceProperties {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            username: None,
            password: None,
            database_name: None,
            read_replica_support: false,
        }
    }

    /// Bind one instance's table.
    ///
    /// `readReplicaSupport` uses the lenient parse: only `true` in any case
    /// enables it, malformed values silently mean `false`.
    pub fn from_table(identifier: impl Into<String>, table: &PropertyTable) -> Result<Self> {
        Ok(Self {
            identifier: identifier.into(),
            username: table.string("username")?,
            password: table.string("password")?,
            database_name: table.string("databaseName")?,
            read_replica_support: table.lenient_bool("readReplicaSupport")?,
        })
    }
}

impl fmt::Debug for RdsInstanceProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RdsInstanceProperties")
            .field("identifier", &self.identifier)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database_name", &self.database_name)
            .field("read_replica_support", &self.read_replica_support)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AwsError;

    #[test]
    fn test_rds_config_defaults() {
        let properties = RdsConfigProperties::from_snapshot(&ConfigSnapshot::new()).unwrap();
        assert!(properties.enabled);
        assert!(properties.endpoint.is_none());
    }

    #[test]
    fn test_rds_config_binding() {
        let snapshot = ConfigSnapshot::new()
            .with("cloud.aws.rds-config.enabled", "FALSE")
            .with("cloud.aws.rds-config.endpoint.url", "http://localhost:4566")
            .with("cloud.aws.rds-config.endpoint.region", "us-east-1");

        let properties = RdsConfigProperties::from_snapshot(&snapshot).unwrap();
        assert!(!properties.enabled);
        assert_eq!(
            properties.endpoint,
            Some(EndpointProperties::new("http://localhost:4566").with_region("us-east-1"))
        );
    }

    #[test]
    fn test_rds_config_rejects_bad_flag() {
        let snapshot = ConfigSnapshot::new().with("cloud.aws.rds-config.enabled", "nope");
        assert!(matches!(
            RdsConfigProperties::from_snapshot(&snapshot),
            Err(AwsError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rds_config_rejects_bad_endpoint() {
        let snapshot = ConfigSnapshot::new().with("cloud.aws.rds-config.endpoint.region", "us-east-1");
        assert!(RdsConfigProperties::from_snapshot(&snapshot).is_err());
    }

    #[test]
    fn test_password_is_redacted() {
        let mut instance = RdsInstanceProperties::new("orders");
        instance.password = Some("hunter2".to_string());

        assert!(!format!("{instance:?}").contains("hunter2"));
        let json = serde_json::to_value(&instance).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["identifier"], "orders");
        assert_eq!(json["readReplicaSupport"], false);
    }
}
