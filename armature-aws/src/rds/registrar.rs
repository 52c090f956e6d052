//! Registration of configured RDS instances.

use std::collections::BTreeMap;
use std::sync::Arc;

use armature_config::{ConfigSnapshot, bind_tables};
use tracing::{debug, info};

use super::configurer::{RdsInstanceConfigurer, select_configurer};
use super::datasource::{DataSourceDescriptor, DataSourceFactory, UrlDataSourceFactory};
use super::properties::RdsInstanceProperties;
use crate::Result;
use crate::config::RDS_INSTANCES_PREFIX;

/// Datasource descriptors keyed by instance identifier.
#[derive(Debug, Clone, Default)]
pub struct DataSourceRegistry {
    descriptors: BTreeMap<String, DataSourceDescriptor>,
}

impl DataSourceRegistry {
    pub fn get(&self, identifier: &str) -> Option<&DataSourceDescriptor> {
        self.descriptors.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.descriptors.contains_key(identifier)
    }

    /// Registered identifiers in ascending order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataSourceDescriptor)> {
        self.descriptors.iter().map(|(id, d)| (id.as_str(), d))
    }
}

/// Turns every `cloud.aws.rds.<identifier>` entry into a datasource descriptor.
#[derive(Debug, Clone)]
pub struct DatabaseInstanceRegistrar {
    prefix: String,
}

impl Default for DatabaseInstanceRegistrar {
    fn default() -> Self {
        Self::with_prefix(RDS_INSTANCES_PREFIX)
    }
}

impl DatabaseInstanceRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Bind the configured instances, keyed by identifier.
    ///
    /// An identifier with no properties still yields an instance with every
    /// optional field absent.
    pub fn collect(&self, snapshot: &ConfigSnapshot) -> Result<BTreeMap<String, RdsInstanceProperties>> {
        bind_tables(snapshot, &self.prefix)?
            .into_iter()
            .map(|(identifier, table)| {
                let instance = RdsInstanceProperties::from_table(identifier.clone(), &table)?;
                Ok((identifier, instance))
            })
            .collect()
    }

    /// Build one descriptor per configured instance.
    ///
    /// Configurers are checked before anything is bound, so a second
    /// configurer fails even when no instance is configured.
    pub fn register(
        &self,
        snapshot: &ConfigSnapshot,
        configurers: &[Arc<dyn RdsInstanceConfigurer>],
    ) -> Result<DataSourceRegistry> {
        let factory: Arc<dyn DataSourceFactory> = match select_configurer(configurers)? {
            Some(configurer) => {
                debug!(configurer = ?configurer, "Using custom datasource factory");
                configurer.data_source_factory()
            }
            None => Arc::new(UrlDataSourceFactory::new()),
        };

        let mut registry = DataSourceRegistry::default();
        for (identifier, instance) in self.collect(snapshot)? {
            info!(
                identifier = %identifier,
                username = ?instance.username,
                database_name = ?instance.database_name,
                read_replica_support = instance.read_replica_support,
                "Registering RDS datasource"
            );
            let descriptor = DataSourceDescriptor::new(instance, Arc::clone(&factory));
            registry.descriptors.insert(identifier, descriptor);
        }

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AwsError;
    use crate::rds::DataSourceFactoryKind;

    #[derive(Debug)]
    struct Custom;

    impl RdsInstanceConfigurer for Custom {
        fn data_source_factory(&self) -> Arc<dyn DataSourceFactory> {
            Arc::new(UrlDataSourceFactory::new().with_property("pool", "custom"))
        }
    }

    fn custom() -> Arc<dyn RdsInstanceConfigurer> {
        Arc::new(Custom)
    }

    #[test]
    fn test_collect_instance() {
        let snapshot = ConfigSnapshot::new()
            .with("cloud.aws.rds.orders.username", "alice")
            .with("cloud.aws.rds.orders.readReplicaSupport", "true");

        let instances = DatabaseInstanceRegistrar::new().collect(&snapshot).unwrap();
        let orders = &instances["orders"];
        assert_eq!(orders.identifier, "orders");
        assert_eq!(orders.username.as_deref(), Some("alice"));
        assert!(orders.read_replica_support);
        assert_eq!(orders.password, None);
        assert_eq!(orders.database_name, None);
    }

    #[test]
    fn test_read_replica_flag_is_lenient() {
        let snapshot = ConfigSnapshot::new()
            .with("cloud.aws.rds.upper.readReplicaSupport", "TrUe")
            .with("cloud.aws.rds.other.readReplicaSupport", "yes");

        let instances = DatabaseInstanceRegistrar::new().collect(&snapshot).unwrap();
        assert!(instances["upper"].read_replica_support);
        assert!(!instances["other"].read_replica_support);
    }

    #[test]
    fn test_empty_entry_and_rds_config_are_separate() {
        let snapshot = ConfigSnapshot::from_value(serde_json::json!({
            "cloud": {"aws": {
                "rds": {"bare": {}},
                "rds-config": {"enabled": "true"}
            }}
        }))
        .unwrap();

        let instances = DatabaseInstanceRegistrar::new().collect(&snapshot).unwrap();
        assert_eq!(instances.keys().collect::<Vec<_>>(), vec!["bare"]);
        assert_eq!(instances["bare"], RdsInstanceProperties::new("bare"));
    }

    #[test]
    fn test_scalar_instance_is_rejected() {
        let snapshot = ConfigSnapshot::new().with("cloud.aws.rds.orders", "alice");
        let result = DatabaseInstanceRegistrar::new().collect(&snapshot);
        assert!(matches!(result, Err(AwsError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_register_with_default_factory() {
        let snapshot = ConfigSnapshot::new()
            .with("cloud.aws.rds.orders.readReplicaSupport", "true")
            .with("cloud.aws.rds.billing.username", "bob");

        let registry = DatabaseInstanceRegistrar::new().register(&snapshot, &[]).unwrap();
        assert_eq!(registry.identifiers().collect::<Vec<_>>(), vec!["billing", "orders"]);
        assert_eq!(
            registry.get("orders").map(DataSourceDescriptor::kind),
            Some(DataSourceFactoryKind::ReadReplicaAware)
        );
        assert_eq!(
            registry.get("billing").map(DataSourceDescriptor::kind),
            Some(DataSourceFactoryKind::Plain)
        );
    }

    #[test]
    fn test_register_with_one_configurer() {
        let snapshot = ConfigSnapshot::new().with("cloud.aws.rds.orders.username", "alice");
        let registry = DatabaseInstanceRegistrar::new()
            .register(&snapshot, &[custom()])
            .unwrap();

        assert_eq!(registry.len(), 1);
        let factory = format!("{:?}", registry.get("orders").unwrap().factory());
        assert!(factory.contains("custom"));
    }

    #[test]
    fn test_two_configurers_fail_without_instances() {
        let result = DatabaseInstanceRegistrar::new().register(&ConfigSnapshot::new(), &[custom(), custom()]);
        assert!(matches!(result, Err(AwsError::MultipleConfigurers(2))));
    }

    #[test]
    fn test_custom_prefix() {
        let snapshot = ConfigSnapshot::new().with("databases.reports.username", "carol");
        let registrar = DatabaseInstanceRegistrar::with_prefix("databases");

        assert_eq!(registrar.prefix(), "databases");
        assert!(registrar.register(&snapshot, &[]).unwrap().contains("reports"));
    }
}
