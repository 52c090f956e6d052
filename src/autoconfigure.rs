// Startup routine wiring region, endpoint and RDS registration together

use std::fmt;
use std::sync::Arc;

use armature_aws::{
    AwsError, CredentialsProperties, CredentialsSource, DataSourceRegistry,
    DatabaseInstanceRegistrar, EndpointConfiguration, EndpointConfigurationResolver,
    RdsClientFactory, RdsConfigProperties, RdsDataSource, RdsInstanceConfigurer, RdsInstanceLookup,
    RegionResolver, RegionSource, RegionStrategy, Result, select_configurer,
};
use armature_config::ConfigSnapshot;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Builder for [`AutoConfiguration`].
pub struct AutoConfigurationBuilder {
    snapshot: ConfigSnapshot,
    region_source: Option<RegionSource>,
    region_strategies: Option<Vec<Arc<dyn RegionStrategy>>>,
    configurers: Vec<Arc<dyn RdsInstanceConfigurer>>,
}

impl AutoConfigurationBuilder {
    /// Use this region source; `cloud.aws.region.*` is then not consulted.
    pub fn region_source(mut self, source: RegionSource) -> Self {
        self.region_source = Some(source);
        self
    }

    /// Strategies for the provider chain, replacing the default chain.
    pub fn region_strategies(mut self, strategies: Vec<Arc<dyn RegionStrategy>>) -> Self {
        self.region_strategies = Some(strategies);
        self
    }

    /// Register an RDS instance configurer. At most one may be registered.
    pub fn configurer(mut self, configurer: Arc<dyn RdsInstanceConfigurer>) -> Self {
        self.configurers.push(configurer);
        self
    }

    /// Run the startup sequence.
    ///
    /// Region source first, then the RDS settings. When RDS is enabled the
    /// configurers are validated, the endpoint override resolved, and the
    /// configured instances registered. The first error aborts startup.
    pub async fn build(self) -> Result<AutoConfiguration> {
        let region_source = match self.region_source {
            Some(source) => {
                info!(is_static = source.is_static(), "Using supplied AWS region source");
                source
            }
            None => {
                let resolver = match self.region_strategies {
                    Some(strategies) => RegionResolver::with_strategies(strategies),
                    None => RegionResolver::new(),
                };
                resolver.resolve(&self.snapshot)
            }
        };

        let credentials = CredentialsProperties::from_snapshot(&self.snapshot)?.source();

        let properties = RdsConfigProperties::from_snapshot(&self.snapshot)?;
        if !properties.enabled {
            warn!("RDS support disabled by cloud.aws.rds-config.enabled");
            return Ok(AutoConfiguration {
                region_source,
                credentials,
                rds: None,
            });
        }

        select_configurer(&self.configurers)?;

        let endpoint =
            EndpointConfigurationResolver::resolve(properties.endpoint.as_ref(), &region_source).await?;

        let data_sources = DatabaseInstanceRegistrar::new().register(&self.snapshot, &self.configurers)?;
        info!(
            instances = data_sources.len(),
            endpoint = ?endpoint.as_ref().map(|e| e.url.as_str()),
            "RDS support activated"
        );

        Ok(AutoConfiguration {
            region_source,
            credentials,
            rds: Some(RdsAutoConfiguration {
                properties,
                endpoint,
                data_sources,
                client: OnceCell::new(),
            }),
        })
    }
}

impl fmt::Debug for AutoConfigurationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoConfigurationBuilder")
            .field("properties", &self.snapshot.len())
            .field("region_source", &self.region_source)
            .field("region_strategies", &self.region_strategies)
            .field("configurers", &self.configurers)
            .finish()
    }
}

/// The RDS half of the startup result, present only when RDS is enabled.
pub struct RdsAutoConfiguration {
    properties: RdsConfigProperties,
    endpoint: Option<EndpointConfiguration>,
    data_sources: DataSourceRegistry,
    client: OnceCell<Arc<dyn RdsInstanceLookup>>,
}

impl RdsAutoConfiguration {
    pub fn properties(&self) -> &RdsConfigProperties {
        &self.properties
    }

    pub fn endpoint(&self) -> Option<&EndpointConfiguration> {
        self.endpoint.as_ref()
    }

    pub fn data_sources(&self) -> &DataSourceRegistry {
        &self.data_sources
    }
}

impl fmt::Debug for RdsAutoConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RdsAutoConfiguration")
            .field("properties", &self.properties)
            .field("endpoint", &self.endpoint)
            .field("data_sources", &self.data_sources)
            .field("client_initialized", &self.client.initialized())
            .finish()
    }
}

/// Everything resolved at startup.
#[derive(Debug)]
pub struct AutoConfiguration {
    region_source: RegionSource,
    credentials: CredentialsSource,
    rds: Option<RdsAutoConfiguration>,
}

impl AutoConfiguration {
    pub fn builder(snapshot: ConfigSnapshot) -> AutoConfigurationBuilder {
        AutoConfigurationBuilder {
            snapshot,
            region_source: None,
            region_strategies: None,
            configurers: Vec::new(),
        }
    }

    pub fn region_source(&self) -> &RegionSource {
        &self.region_source
    }

    pub fn credentials(&self) -> &CredentialsSource {
        &self.credentials
    }

    /// `None` when RDS support is disabled.
    pub fn rds(&self) -> Option<&RdsAutoConfiguration> {
        self.rds.as_ref()
    }

    /// The RDS client, built by `factory` on first use and shared afterwards.
    ///
    /// The endpoint override's region is used when present, otherwise the
    /// region source is asked.
    pub async fn rds_client(&self, factory: &dyn RdsClientFactory) -> Result<Arc<dyn RdsInstanceLookup>> {
        let rds = self.enabled_rds()?;

        let client = rds
            .client
            .get_or_try_init(|| async {
                let region = match &rds.endpoint {
                    Some(endpoint) => endpoint.region.clone(),
                    None => self.region_source.region().await?,
                };
                factory
                    .build_client(&region, &self.credentials, rds.endpoint.as_ref())
                    .await
            })
            .await?;

        Ok(Arc::clone(client))
    }

    /// Instantiate the registered datasource for `identifier`.
    pub async fn data_source(&self, identifier: &str, factory: &dyn RdsClientFactory) -> Result<RdsDataSource> {
        let descriptor = self
            .enabled_rds()?
            .data_sources
            .get(identifier)
            .ok_or_else(|| AwsError::InstanceNotFound(identifier.to_string()))?;

        let client = self.rds_client(factory).await?;
        descriptor.instantiate(client.as_ref()).await
    }

    fn enabled_rds(&self) -> Result<&RdsAutoConfiguration> {
        self.rds
            .as_ref()
            .ok_or_else(|| AwsError::Config("RDS support is disabled".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armature_aws::DataSourceFactoryKind;

    #[tokio::test]
    async fn test_static_region_and_defaults() {
        let snapshot = ConfigSnapshot::new().with("cloud.aws.region.static", "eu-west-1");
        let config = AutoConfiguration::builder(snapshot).build().await.unwrap();

        assert!(config.region_source().is_static());
        assert_eq!(config.credentials(), &CredentialsSource::Auto);

        let rds = config.rds().unwrap();
        assert!(rds.properties().enabled);
        assert!(rds.endpoint().is_none());
        assert!(rds.data_sources().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_rds_skips_registration() {
        let snapshot = ConfigSnapshot::new()
            .with("cloud.aws.region.static", "eu-west-1")
            .with("cloud.aws.rds-config.enabled", "false")
            .with("cloud.aws.rds.orders", "not-a-map");

        let config = AutoConfiguration::builder(snapshot).build().await.unwrap();
        assert!(config.rds().is_none());
    }

    #[tokio::test]
    async fn test_registers_instances() {
        let snapshot = ConfigSnapshot::new()
            .with("cloud.aws.region.static", "eu-west-1")
            .with("cloud.aws.rds.orders.readReplicaSupport", "true");

        let config = AutoConfiguration::builder(snapshot).build().await.unwrap();
        let registry = config.rds().unwrap().data_sources();
        assert_eq!(
            registry.get("orders").map(|d| d.kind()),
            Some(DataSourceFactoryKind::ReadReplicaAware)
        );
    }

    #[tokio::test]
    async fn test_client_requires_enabled_rds() {
        let snapshot = ConfigSnapshot::new()
            .with("cloud.aws.region.static", "eu-west-1")
            .with("cloud.aws.rds-config.enabled", "false");
        let config = AutoConfiguration::builder(snapshot).build().await.unwrap();

        let result = config
            .rds_client(&armature_aws::SdkRdsClientFactory)
            .await;
        assert!(matches!(result, Err(AwsError::Config(_))));
    }
}
