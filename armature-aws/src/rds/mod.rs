//! RDS database instances configured under `cloud.aws.rds`.
//!
//! ```toml
//! [cloud.aws.rds.orders]
//! username = "alice"
//! password = "secret"
//! databaseName = "orders"
//! readReplicaSupport = "true"
//!
//! [cloud.aws.rds-config.endpoint]
//! url = "http://localhost:4566"
//! ```

mod client;
mod configurer;
mod datasource;
mod properties;
mod registrar;

pub use client::{DbInstanceInfo, RdsClientFactory, RdsInstanceLookup, SdkRdsClientFactory};
pub use configurer::{RdsInstanceConfigurer, select_configurer};
pub use datasource::{
    DataSource, DataSourceDescriptor, DataSourceFactory, DataSourceFactoryKind,
    DataSourceInformation, DatabaseType, RdsDataSource, UrlDataSourceFactory,
};
pub use properties::{RdsConfigProperties, RdsInstanceProperties};
pub use registrar::{DataSourceRegistry, DatabaseInstanceRegistrar};
