//! # Armature AWS
//!
//! AWS region resolution and RDS datasource registration driven by a
//! configuration snapshot.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use armature_aws::{DatabaseInstanceRegistrar, RegionResolver};
//! use armature_config::ConfigSnapshot;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let snapshot = ConfigSnapshot::new()
//!         .with("cloud.aws.region.static", "eu-west-1")
//!         .with("cloud.aws.rds.orders.username", "alice")
//!         .with("cloud.aws.rds.orders.readReplicaSupport", "true");
//!
//!     let region = RegionResolver::new().resolve(&snapshot).region().await?;
//!     let registry = DatabaseInstanceRegistrar::new().register(&snapshot, &[])?;
//!
//!     for identifier in registry.identifiers() {
//!         println!("{identifier} in {region}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Datasource Factory
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use armature_aws::{DataSourceFactory, RdsInstanceConfigurer, UrlDataSourceFactory};
//!
//! #[derive(Debug)]
//! struct PooledConfigurer;
//!
//! impl RdsInstanceConfigurer for PooledConfigurer {
//!     fn data_source_factory(&self) -> Arc<dyn DataSourceFactory> {
//!         Arc::new(UrlDataSourceFactory::new().with_property("maxConnections", "20"))
//!     }
//! }
//! ```

mod config;
mod endpoint;
mod error;
pub mod rds;
mod region;

pub use config::{
    CREDENTIALS_PREFIX, CredentialsProperties, CredentialsSource, RDS_CONFIG_PREFIX,
    RDS_INSTANCES_PREFIX, STATIC_REGION_KEY,
};
pub use endpoint::{EndpointConfiguration, EndpointConfigurationResolver, EndpointProperties};
pub use error::{AwsError, Result};
pub use rds::{
    DataSource, DataSourceDescriptor, DataSourceFactory, DataSourceFactoryKind,
    DataSourceInformation, DataSourceRegistry, DatabaseInstanceRegistrar, DatabaseType,
    DbInstanceInfo, RdsClientFactory, RdsConfigProperties, RdsDataSource, RdsInstanceConfigurer,
    RdsInstanceLookup, RdsInstanceProperties, SdkRdsClientFactory, UrlDataSourceFactory,
    select_configurer,
};
pub use region::{
    ChainRegionSource, RegionProperties, RegionResolver, RegionSource, RegionStrategy,
    SdkRegionStrategy, StaticRegionSource,
};

// Re-export AWS types for convenience
pub use aws_config;
pub use aws_credential_types;
pub use aws_sdk_rds;
pub use aws_types;
