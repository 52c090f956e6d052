// Armature Cloud AWS - configuration-driven AWS region and RDS setup
//
// Resolves the AWS region strategy, the RDS endpoint override and the
// configured database instances from a single configuration snapshot.

mod autoconfigure;

pub use autoconfigure::{AutoConfiguration, AutoConfigurationBuilder, RdsAutoConfiguration};

// Re-export member crates
pub use armature_aws;
pub use armature_config;

pub use armature_aws::{AwsError, Result};
pub use armature_config::{ConfigSnapshot, SnapshotBuilder};
