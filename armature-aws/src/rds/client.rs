//! RDS client construction and instance lookup.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_rds::error::DisplayErrorContext;
use aws_sdk_rds::types::DbInstance;
use aws_types::region::Region;
use tracing::info;

use crate::{AwsError, CredentialsSource, EndpointConfiguration, Result};

/// What RDS reports about a database instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbInstanceInfo {
    pub identifier: String,
    pub engine: String,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub master_username: Option<String>,
    pub db_name: Option<String>,
    pub read_replica_identifiers: Vec<String>,
}

/// The one RDS operation datasource creation needs.
#[async_trait]
pub trait RdsInstanceLookup: Send + Sync {
    async fn describe_instance(&self, identifier: &str) -> Result<DbInstanceInfo>;
}

#[async_trait]
impl RdsInstanceLookup for aws_sdk_rds::Client {
    async fn describe_instance(&self, identifier: &str) -> Result<DbInstanceInfo> {
        let resp = self
            .describe_db_instances()
            .db_instance_identifier(identifier)
            .send()
            .await
            .map_err(|e| {
                let not_found = e
                    .as_service_error()
                    .is_some_and(|e| e.is_db_instance_not_found_fault());
                if not_found {
                    AwsError::InstanceNotFound(identifier.to_string())
                } else {
                    AwsError::Service(DisplayErrorContext(&e).to_string())
                }
            })?;

        let instance = resp
            .db_instances()
            .first()
            .ok_or_else(|| AwsError::InstanceNotFound(identifier.to_string()))?;

        Ok(map_db_instance(identifier, instance))
    }
}

fn map_db_instance(identifier: &str, db_instance: &DbInstance) -> DbInstanceInfo {
    let endpoint = db_instance.endpoint();

    DbInstanceInfo {
        identifier: db_instance
            .db_instance_identifier()
            .unwrap_or(identifier)
            .to_string(),
        engine: db_instance.engine().unwrap_or_default().to_string(),
        address: endpoint.and_then(|e| e.address()).map(str::to_string),
        port: endpoint
            .and_then(|e| e.port())
            .and_then(|port| u16::try_from(port).ok()),
        master_username: db_instance.master_username().map(str::to_string),
        db_name: db_instance.db_name().map(str::to_string),
        read_replica_identifiers: db_instance.read_replica_db_instance_identifiers().to_vec(),
    }
}

/// Builds RDS clients.
#[async_trait]
pub trait RdsClientFactory: Send + Sync {
    /// When an endpoint override is given, its URL and region replace the
    /// default endpoint derivation and `region`.
    async fn build_client(
        &self,
        region: &str,
        credentials: &CredentialsSource,
        endpoint: Option<&EndpointConfiguration>,
    ) -> Result<Arc<dyn RdsInstanceLookup>>;
}

/// Builds `aws_sdk_rds::Client`s through the shared `aws-config` loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkRdsClientFactory;

impl SdkRdsClientFactory {
    /// Build AWS SDK configuration.
    pub async fn sdk_config(
        region: &str,
        credentials: &CredentialsSource,
        endpoint: Option<&EndpointConfiguration>,
    ) -> aws_config::SdkConfig {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        let region = endpoint.map_or(region, |endpoint| endpoint.region.as_str());
        loader = loader.region(Region::new(region.to_string()));

        match credentials {
            CredentialsSource::Profile(profile) => {
                loader = loader.profile_name(profile);
            }
            CredentialsSource::Explicit {
                access_key_id,
                secret_access_key,
                session_token,
            } => {
                let creds = aws_credential_types::Credentials::new(
                    access_key_id,
                    secret_access_key,
                    session_token.clone(),
                    None,
                    "explicit",
                );
                loader = loader.credentials_provider(creds);
            }
            CredentialsSource::IamRole => {
                let imds = aws_config::imds::credentials::ImdsCredentialsProvider::builder().build();
                loader = loader.credentials_provider(imds);
            }
            CredentialsSource::Auto => {
                // Use default credential chain
            }
        }

        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(&endpoint.url);
        }

        loader.load().await
    }
}

#[async_trait]
impl RdsClientFactory for SdkRdsClientFactory {
    async fn build_client(
        &self,
        region: &str,
        credentials: &CredentialsSource,
        endpoint: Option<&EndpointConfiguration>,
    ) -> Result<Arc<dyn RdsInstanceLookup>> {
        let sdk_config = Self::sdk_config(region, credentials, endpoint).await;

        info!(
            region = ?sdk_config.region(),
            endpoint = ?endpoint.map(|e| e.url.as_str()),
            "RDS client initialized"
        );

        Ok(Arc::new(aws_sdk_rds::Client::new(&sdk_config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sdk_config_uses_region() {
        let config = SdkRdsClientFactory::sdk_config(
            "eu-west-1",
            &CredentialsSource::Explicit {
                access_key_id: "AKIA".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: None,
            },
            None,
        )
        .await;

        assert_eq!(config.region().map(|r| r.as_ref()), Some("eu-west-1"));
        assert_eq!(config.endpoint_url(), None);
    }

    #[tokio::test]
    async fn test_sdk_config_endpoint_override() {
        let endpoint = EndpointConfiguration {
            url: "http://localhost:4566".to_string(),
            region: "us-east-1".to_string(),
        };
        let config = SdkRdsClientFactory::sdk_config(
            "eu-west-1",
            &CredentialsSource::Explicit {
                access_key_id: "AKIA".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: None,
            },
            Some(&endpoint),
        )
        .await;

        assert_eq!(config.region().map(|r| r.as_ref()), Some("us-east-1"));
        assert_eq!(config.endpoint_url(), Some("http://localhost:4566"));
    }
}
