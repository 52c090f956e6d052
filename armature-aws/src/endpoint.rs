//! Endpoint overrides for AWS clients.

use armature_config::{ConfigValidator, FromProperties, PropertyTable, Validate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{RegionSource, Result};

/// A configured replacement for a client's default endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointProperties {
    pub url: String,
    /// Signing region; inherits the resolved region when absent.
    pub region: Option<String>,
}

impl EndpointProperties {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            region: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

impl FromProperties for EndpointProperties {
    fn from_properties(table: &PropertyTable) -> armature_config::Result<Self> {
        Ok(Self {
            url: table.string("url")?.unwrap_or_default(),
            region: table
                .string("region")?
                .filter(|region| !region.trim().is_empty()),
        })
    }
}

impl Validate for EndpointProperties {
    fn validate(&self) -> armature_config::Result<()> {
        ConfigValidator::not_empty(&self.url, "endpoint.url")?;
        ConfigValidator::is_url(&self.url, "endpoint.url")
    }
}

/// The endpoint a client is built against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfiguration {
    pub url: String,
    pub region: String,
}

/// Turns an optional override into a concrete endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointConfigurationResolver;

impl EndpointConfigurationResolver {
    /// `None` without an override. Otherwise the override's region, or the
    /// region source's answer at the time of the call.
    pub async fn resolve(
        endpoint: Option<&EndpointProperties>,
        region_source: &RegionSource,
    ) -> Result<Option<EndpointConfiguration>> {
        let Some(endpoint) = endpoint else {
            return Ok(None);
        };

        let region = match &endpoint.region {
            Some(region) => region.clone(),
            None => region_source.region().await?,
        };

        debug!(url = %endpoint.url, region = %region, "Endpoint override resolved");
        Ok(Some(EndpointConfiguration {
            url: endpoint.url.clone(),
            region,
        }))
    }
}
