//! Datasource descriptors and factories.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::client::{DbInstanceInfo, RdsInstanceLookup};
use super::properties::RdsInstanceProperties;
use crate::{AwsError, Result};

/// Database engine family of an RDS instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    MySql,
    MariaDb,
    Postgres,
    Oracle,
    SqlServer,
}

impl DatabaseType {
    /// Map an RDS engine name such as `aurora-postgresql` or `oracle-ee`.
    pub fn from_engine(engine: &str) -> Option<Self> {
        let engine = engine.to_lowercase();
        match engine.as_str() {
            "mysql" | "aurora" | "aurora-mysql" => Some(Self::MySql),
            "mariadb" => Some(Self::MariaDb),
            "postgres" | "aurora-postgresql" => Some(Self::Postgres),
            e if e.starts_with("oracle") => Some(Self::Oracle),
            e if e.starts_with("sqlserver") => Some(Self::SqlServer),
            _ => None,
        }
    }

    /// URL scheme for connection strings.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::MariaDb => "mariadb",
            Self::Postgres => "postgres",
            Self::Oracle => "oracle",
            Self::SqlServer => "sqlserver",
        }
    }
}

/// Everything needed to open connections to one instance.
#[derive(Clone, PartialEq, Eq)]
pub struct DataSourceInformation {
    pub database_type: DatabaseType,
    pub hostname: String,
    pub port: u16,
    pub database_name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl DataSourceInformation {
    /// Combine what RDS reports with what was configured.
    ///
    /// Configured `username` and `databaseName` take precedence over the
    /// instance's master username and database name.
    pub fn from_instance(instance: &DbInstanceInfo, configured: &RdsInstanceProperties) -> Result<Self> {
        let database_type = DatabaseType::from_engine(&instance.engine)
            .ok_or_else(|| AwsError::UnsupportedEngine(instance.engine.clone()))?;

        let (Some(hostname), Some(port)) = (&instance.address, instance.port) else {
            return Err(AwsError::Service(format!(
                "Database instance '{}' has no endpoint yet",
                instance.identifier
            )));
        };

        Ok(Self {
            database_type,
            hostname: hostname.clone(),
            port,
            database_name: configured
                .database_name
                .clone()
                .or_else(|| instance.db_name.clone()),
            username: configured
                .username
                .clone()
                .or_else(|| instance.master_username.clone()),
            password: configured.password.clone(),
        })
    }

    /// `scheme://host:port[/database]`, credentials left out.
    pub fn url(&self) -> String {
        let mut url = format!(
            "{}://{}:{}",
            self.database_type.scheme(),
            self.hostname,
            self.port
        );
        if let Some(database) = &self.database_name {
            url.push('/');
            url.push_str(database);
        }
        url
    }
}

impl fmt::Debug for DataSourceInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceInformation")
            .field("database_type", &self.database_type)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("database_name", &self.database_name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A ready-to-open connection source, handed to the pool of your choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub url: String,
    pub information: DataSourceInformation,
    /// Extra pool or driver settings.
    pub properties: BTreeMap<String, String>,
}

/// Result of instantiating a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RdsDataSource {
    Single(DataSource),
    ReadReplicaAware {
        primary: DataSource,
        replicas: Vec<DataSource>,
    },
}

impl RdsDataSource {
    pub fn primary(&self) -> &DataSource {
        match self {
            Self::Single(primary) | Self::ReadReplicaAware { primary, .. } => primary,
        }
    }

    pub fn replicas(&self) -> &[DataSource] {
        match self {
            Self::Single(_) => &[],
            Self::ReadReplicaAware { replicas, .. } => replicas,
        }
    }
}

/// Builds a data source from resolved connection information.
pub trait DataSourceFactory: Send + Sync + fmt::Debug {
    fn create_data_source(&self, information: &DataSourceInformation) -> Result<DataSource>;
}

/// Default factory: a connection URL plus fixed properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlDataSourceFactory {
    properties: BTreeMap<String, String>,
}

impl UrlDataSourceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property copied onto every data source.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl DataSourceFactory for UrlDataSourceFactory {
    fn create_data_source(&self, information: &DataSourceInformation) -> Result<DataSource> {
        Ok(DataSource {
            url: information.url(),
            information: information.clone(),
            properties: self.properties.clone(),
        })
    }
}

/// How additional read endpoints are discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceFactoryKind {
    /// Only the instance itself.
    Plain,
    /// The instance plus every read replica RDS reports for it.
    ReadReplicaAware,
}

impl DataSourceFactoryKind {
    pub fn for_instance(instance: &RdsInstanceProperties) -> Self {
        if instance.read_replica_support {
            Self::ReadReplicaAware
        } else {
            Self::Plain
        }
    }
}

/// A registered, not yet instantiated, data source.
#[derive(Debug, Clone)]
pub struct DataSourceDescriptor {
    instance: RdsInstanceProperties,
    kind: DataSourceFactoryKind,
    factory: Arc<dyn DataSourceFactory>,
}

impl DataSourceDescriptor {
    pub fn new(instance: RdsInstanceProperties, factory: Arc<dyn DataSourceFactory>) -> Self {
        Self {
            kind: DataSourceFactoryKind::for_instance(&instance),
            instance,
            factory,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.instance.identifier
    }

    pub fn instance(&self) -> &RdsInstanceProperties {
        &self.instance
    }

    pub fn kind(&self) -> DataSourceFactoryKind {
        self.kind
    }

    pub fn factory(&self) -> &Arc<dyn DataSourceFactory> {
        &self.factory
    }

    /// Look the instance up through the RDS client and build its data source(s).
    pub async fn instantiate(&self, lookup: &dyn RdsInstanceLookup) -> Result<RdsDataSource> {
        let described = lookup.describe_instance(self.identifier()).await?;
        let primary = self.data_source(&described)?;

        match self.kind {
            DataSourceFactoryKind::Plain => Ok(RdsDataSource::Single(primary)),
            DataSourceFactoryKind::ReadReplicaAware => {
                let mut replicas = Vec::with_capacity(described.read_replica_identifiers.len());
                for replica in &described.read_replica_identifiers {
                    let replica = lookup.describe_instance(replica).await?;
                    replicas.push(self.data_source(&replica)?);
                }

                debug!(
                    identifier = self.identifier(),
                    replicas = replicas.len(),
                    "Read replica aware data source created"
                );
                Ok(RdsDataSource::ReadReplicaAware { primary, replicas })
            }
        }
    }

    fn data_source(&self, described: &DbInstanceInfo) -> Result<DataSource> {
        let information = DataSourceInformation::from_instance(described, &self.instance)?;
        self.factory.create_data_source(&information)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postgres(identifier: &str) -> DbInstanceInfo {
        DbInstanceInfo {
            identifier: identifier.to_string(),
            engine: "postgres".to_string(),
            address: Some(format!("{identifier}.abc.eu-west-1.rds.amazonaws.com")),
            port: Some(5432),
            master_username: Some("admin".to_string()),
            db_name: Some("main".to_string()),
            read_replica_identifiers: Vec::new(),
        }
    }

    #[test]
    fn test_engine_mapping() {
        assert_eq!(DatabaseType::from_engine("aurora-postgresql"), Some(DatabaseType::Postgres));
        assert_eq!(DatabaseType::from_engine("aurora"), Some(DatabaseType::MySql));
        assert_eq!(DatabaseType::from_engine("MariaDB"), Some(DatabaseType::MariaDb));
        assert_eq!(DatabaseType::from_engine("oracle-ee"), Some(DatabaseType::Oracle));
        assert_eq!(DatabaseType::from_engine("sqlserver-se"), Some(DatabaseType::SqlServer));
        assert_eq!(DatabaseType::from_engine("db2-se"), None);
    }

    #[test]
    fn test_configured_values_take_precedence() {
        let mut configured = RdsInstanceProperties::new("orders");
        configured.username = Some("alice".to_string());
        configured.password = Some("secret".to_string());

        let information = DataSourceInformation::from_instance(&postgres("orders"), &configured).unwrap();
        assert_eq!(information.username.as_deref(), Some("alice"));
        assert_eq!(information.database_name.as_deref(), Some("main"));
        assert_eq!(information.password.as_deref(), Some("secret"));
        assert_eq!(
            information.url(),
            "postgres://orders.abc.eu-west-1.rds.amazonaws.com:5432/main"
        );
    }

    #[test]
    fn test_unsupported_engine() {
        let mut described = postgres("orders");
        described.engine = "db2-se".to_string();

        let result = DataSourceInformation::from_instance(&described, &RdsInstanceProperties::new("orders"));
        assert!(matches!(result, Err(AwsError::UnsupportedEngine(_))));
    }

    #[test]
    fn test_instance_without_endpoint() {
        let mut described = postgres("orders");
        described.address = None;

        let result = DataSourceInformation::from_instance(&described, &RdsInstanceProperties::new("orders"));
        assert!(matches!(result, Err(AwsError::Service(_))));
    }

    #[test]
    fn test_factory_kind() {
        let mut instance = RdsInstanceProperties::new("orders");
        assert_eq!(DataSourceFactoryKind::for_instance(&instance), DataSourceFactoryKind::Plain);

        instance.read_replica_support = true;
        assert_eq!(
            DataSourceFactoryKind::for_instance(&instance),
            DataSourceFactoryKind::ReadReplicaAware
        );
    }

    #[test]
    fn test_url_factory_properties() {
        let factory = UrlDataSourceFactory::new().with_property("sslmode", "require");
        let information =
            DataSourceInformation::from_instance(&postgres("orders"), &RdsInstanceProperties::new("orders"))
                .unwrap();

        let data_source = factory.create_data_source(&information).unwrap();
        assert_eq!(data_source.properties.get("sslmode").map(String::as_str), Some("require"));
    }
}
