//! AWS configuration keys and credentials.

use armature_config::{ConfigSnapshot, FromProperties, PropertyTable, has_text};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Key of the static region.
pub const STATIC_REGION_KEY: &str = "cloud.aws.region.static";

/// Prefix for credentials settings.
pub const CREDENTIALS_PREFIX: &str = "cloud.aws.credentials";

/// Prefix under which named RDS instances are configured.
pub const RDS_INSTANCES_PREFIX: &str = "cloud.aws.rds";

/// Prefix for the RDS client settings.
pub const RDS_CONFIG_PREFIX: &str = "cloud.aws.rds-config";

/// Credentials source for AWS authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialsSource {
    /// Use AWS profile from ~/.aws/credentials.
    Profile(String),
    /// Use IAM role (for EC2, ECS, Lambda).
    IamRole,
    /// Use explicit credentials.
    Explicit {
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
    },
    /// Auto-detect credentials (default AWS SDK behavior).
    #[default]
    Auto,
}

/// Credentials settings bound from `cloud.aws.credentials`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialsProperties {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub session_token: Option<String>,
    pub profile_name: Option<String>,
    pub instance_profile: bool,
}

impl CredentialsProperties {
    /// Bind from a snapshot.
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Result<Self> {
        Ok(snapshot.bind(CREDENTIALS_PREFIX)?)
    }

    /// Pick the credentials source.
    ///
    /// An access/secret key pair wins, then a named profile, then the
    /// instance profile; otherwise the SDK default chain is used.
    pub fn source(&self) -> CredentialsSource {
        let text = |value: &Option<String>| value.clone().filter(|v| has_text(Some(v.as_str())));

        if let (Some(access_key_id), Some(secret_access_key)) =
            (text(&self.access_key), text(&self.secret_key))
        {
            return CredentialsSource::Explicit {
                access_key_id,
                secret_access_key,
                session_token: text(&self.session_token),
            };
        }

        if let Some(profile) = text(&self.profile_name) {
            return CredentialsSource::Profile(profile);
        }

        if self.instance_profile {
            return CredentialsSource::IamRole;
        }

        CredentialsSource::Auto
    }
}

impl FromProperties for CredentialsProperties {
    fn from_properties(table: &PropertyTable) -> armature_config::Result<Self> {
        Ok(Self {
            access_key: table.string("access-key")?,
            secret_key: table.string("secret-key")?,
            session_token: table.string("session-token")?,
            profile_name: table.string("profile-name")?,
            instance_profile: table.strict_bool("instance-profile")?.unwrap_or(false),
        })
    }
}
