// Environment variable loading

use std::collections::BTreeMap;
use std::env;

/// Maps environment variables onto dotted property names.
///
/// `CLOUD_AWS_REGION_STATIC` becomes `cloud.aws.region.static`. With a prefix,
/// only variables starting with it are read and the prefix is dropped, so
/// `APP_CLOUD_AWS_REGION_STATIC` maps to the same property. A double
/// underscore stands for a hyphen: `CLOUD_AWS_RDS__CONFIG_ENABLED` is
/// `cloud.aws.rds-config.enabled`.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all matching environment variables as properties
    pub fn load(&self) -> BTreeMap<String, String> {
        let mut config = BTreeMap::new();

        for (key, value) in env::vars() {
            if let Some(name) = self.property_name(&key) {
                config.insert(name, value);
            }
        }

        config
    }

    /// Property name for a variable, `None` if the prefix does not match
    pub fn property_name(&self, var: &str) -> Option<String> {
        let name = match self.prefix {
            Some(ref prefix) => {
                let rest = var.strip_prefix(prefix.as_str())?;
                if !rest.is_empty() && !rest.starts_with('_') {
                    return None;
                }
                rest.trim_start_matches('_')
            }
            None => var,
        };

        if name.is_empty() {
            return None;
        }

        let segments: Vec<String> = name
            .to_lowercase()
            .split("__")
            .map(|segment| segment.replace('_', "."))
            .collect();

        Some(segments.join("-"))
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}
