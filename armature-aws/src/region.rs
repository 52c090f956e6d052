//! Region resolution.
//!
//! A process uses exactly one region strategy: either the static region from
//! `cloud.aws.region.static`, or a chain of providers asked in order every
//! time a region is needed.

use std::fmt;
use std::sync::Arc;

use armature_config::{ConfigSnapshot, has_text};
use async_trait::async_trait;
use aws_config::environment::EnvironmentVariableRegionProvider;
use aws_config::imds::region::ImdsRegionProvider;
use aws_config::meta::region::ProvideRegion;
use aws_config::profile::ProfileFileRegionProvider;
use tracing::{debug, info};

use crate::config::STATIC_REGION_KEY;
use crate::{AwsError, Result};

/// Region settings bound from `cloud.aws.region`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionProperties {
    /// Explicit region code; wins over any provider chain when non-blank.
    pub static_region: Option<String>,
}

impl RegionProperties {
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Self {
        Self {
            static_region: snapshot
                .get(STATIC_REGION_KEY)
                .filter(|region| has_text(Some(*region)))
                .map(str::to_string),
        }
    }
}

/// One way of discovering a region.
#[async_trait]
pub trait RegionStrategy: Send + Sync + fmt::Debug {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// The discovered region, `None` when this strategy has nothing.
    async fn region(&self) -> Option<String>;
}

/// Adapts an `aws-config` region provider.
#[derive(Debug)]
pub struct SdkRegionStrategy<P> {
    name: &'static str,
    provider: P,
}

impl<P: ProvideRegion> SdkRegionStrategy<P> {
    pub fn new(name: &'static str, provider: P) -> Self {
        Self { name, provider }
    }
}

#[async_trait]
impl<P: ProvideRegion + fmt::Debug + 'static> RegionStrategy for SdkRegionStrategy<P> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn region(&self) -> Option<String> {
        self.provider
            .region()
            .await
            .map(|region| region.as_ref().to_string())
    }
}

/// A region fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRegionSource {
    region: String,
}

impl StaticRegionSource {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Asks its strategies in order and returns the first non-empty answer.
///
/// Nothing is cached: two calls may see different regions if the underlying
/// environment changed in between.
#[derive(Clone)]
pub struct ChainRegionSource {
    strategies: Vec<Arc<dyn RegionStrategy>>,
}

impl ChainRegionSource {
    pub fn new(strategies: Vec<Arc<dyn RegionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Environment variables, then the shared profile file, then EC2 instance metadata.
    pub fn default_chain() -> Self {
        let environment: Arc<dyn RegionStrategy> = Arc::new(SdkRegionStrategy::new(
            "environment",
            EnvironmentVariableRegionProvider::new(),
        ));
        let profile: Arc<dyn RegionStrategy> = Arc::new(SdkRegionStrategy::new(
            "profile",
            ProfileFileRegionProvider::new(),
        ));
        let metadata: Arc<dyn RegionStrategy> = Arc::new(SdkRegionStrategy::new(
            "instance-metadata",
            ImdsRegionProvider::builder().build(),
        ));

        Self::new(vec![environment, profile, metadata])
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn region(&self) -> Result<String> {
        for strategy in &self.strategies {
            match strategy.region().await {
                Some(region) if has_text(Some(region.as_str())) => {
                    debug!(strategy = strategy.name(), region = %region, "Region resolved");
                    return Ok(region);
                }
                _ => debug!(strategy = strategy.name(), "No region from strategy"),
            }
        }

        Err(AwsError::RegionUnresolved(self.strategy_names()))
    }
}

impl fmt::Debug for ChainRegionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainRegionSource")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

/// Where a client's region comes from.
#[derive(Debug, Clone)]
pub enum RegionSource {
    Static(StaticRegionSource),
    Chain(ChainRegionSource),
}

impl RegionSource {
    /// Shorthand for a static source.
    pub fn fixed(region: impl Into<String>) -> Self {
        Self::Static(StaticRegionSource::new(region))
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }

    /// Produce a region code.
    pub async fn region(&self) -> Result<String> {
        match self {
            Self::Static(source) => Ok(source.region().to_string()),
            Self::Chain(chain) => chain.region().await,
        }
    }
}

/// Picks the region strategy for the process.
#[derive(Debug, Clone, Default)]
pub struct RegionResolver {
    strategies: Option<Vec<Arc<dyn RegionStrategy>>>,
}

impl RegionResolver {
    /// Resolver falling back to [`ChainRegionSource::default_chain`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver falling back to the given strategies instead of the default chain.
    pub fn with_strategies(strategies: Vec<Arc<dyn RegionStrategy>>) -> Self {
        Self {
            strategies: Some(strategies),
        }
    }

    /// A static source when `cloud.aws.region.static` has text, the chain otherwise.
    pub fn resolve(&self, snapshot: &ConfigSnapshot) -> RegionSource {
        if let Some(region) = RegionProperties::from_snapshot(snapshot).static_region {
            info!(region = %region, "Using static AWS region");
            return RegionSource::fixed(region);
        }

        let chain = match &self.strategies {
            Some(strategies) => ChainRegionSource::new(strategies.clone()),
            None => ChainRegionSource::default_chain(),
        };
        info!(strategies = ?chain.strategy_names(), "Using AWS region provider chain");
        RegionSource::Chain(chain)
    }
}
