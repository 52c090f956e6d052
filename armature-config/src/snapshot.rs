// Configuration snapshot keyed by dotted property names

use crate::binding::{FromProperties, PropertyTable, relaxed};
use crate::validation::Validate;
use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Ordered, read-only view of the application's configuration.
///
/// Values are either strings or nested maps. Nested maps are flattened into
/// dotted keys when inserted, so `{"cloud": {"aws": {"region": {"static": "eu-west-1"}}}}`
/// and `cloud.aws.region.static = "eu-west-1"` produce the same snapshot.
/// Empty maps are kept as-is because an empty entry is still an entry.
///
/// A property replaces any sibling whose last segment has the same relaxed
/// form, so `databasename` set from the environment replaces a
/// `databaseName` read from a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSnapshot {
    properties: BTreeMap<String, Value>,
}

impl ConfigSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from a parsed document whose root is a map
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(root) = value else {
            return Err(ConfigError::structure("<root>", "a map"));
        };

        let mut snapshot = Self::new();
        for (key, value) in root {
            snapshot.set(key, value);
        }
        Ok(snapshot)
    }

    /// Build a snapshot from `(key, value)` pairs
    pub fn from_properties<K, V, I>(properties: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut snapshot = Self::new();
        for (key, value) in properties {
            snapshot.set(key, value);
        }
        snapshot
    }

    /// Set a property, flattening nested maps into dotted keys
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        flatten_into(&mut self.properties, key.into(), value.into());
    }

    /// Builder-style variant of [`ConfigSnapshot::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Overlay another snapshot on top of this one; its values win
    pub fn merge(&mut self, other: ConfigSnapshot) {
        for (key, value) in other.properties {
            insert_property(&mut self.properties, key, value);
        }
    }

    /// Get a plain string property
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Check whether a property holds at least one non-whitespace character
    pub fn has_text(&self, key: &str) -> bool {
        crate::binding::has_text(self.get(key))
    }

    /// Check if a key exists
    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// All property names in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Rebuild the nested tree rooted at `prefix`.
    ///
    /// Returns `None` when nothing is configured under the prefix. Fails when a
    /// key is both a plain value and the parent of other keys.
    pub fn sub_tree(&self, prefix: &str) -> Result<Option<Value>> {
        let nested = format!("{prefix}.");
        let mut root = None;

        for (key, value) in &self.properties {
            let path: Vec<&str> = if key == prefix {
                Vec::new()
            } else if let Some(rest) = key.strip_prefix(&nested) {
                rest.split('.').collect()
            } else {
                continue;
            };

            place(&mut root, &path, value.clone(), prefix.to_string())?;
        }

        Ok(root)
    }

    /// Bind the properties under `prefix` to a typed value.
    ///
    /// A missing sub-tree binds to `T::default()`.
    pub fn bind<T: FromProperties + Default>(&self, prefix: &str) -> Result<T> {
        match self.sub_tree(prefix)? {
            None => Ok(T::default()),
            Some(Value::Object(entries)) => T::from_properties(&PropertyTable::new(prefix, entries)),
            Some(_) => Err(ConfigError::structure(prefix, "a map of properties")),
        }
    }

    /// Bind and validate in a single step
    pub fn bind_validated<T: FromProperties + Default + Validate>(&self, prefix: &str) -> Result<T> {
        let bound: T = self.bind(prefix)?;
        bound.validate()?;
        Ok(bound)
    }
}

fn flatten_into(properties: &mut BTreeMap<String, Value>, key: String, value: Value) {
    match value {
        Value::Null => {}
        Value::Object(map) if map.is_empty() => {
            insert_property(properties, key, Value::Object(map));
        }
        Value::Object(map) => {
            for (child, value) in map {
                flatten_into(properties, format!("{key}.{child}"), value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.into_iter().enumerate() {
                flatten_into(properties, format!("{key}[{index}]"), value);
            }
        }
        Value::String(text) => {
            insert_property(properties, key, Value::String(text));
        }
        scalar => {
            insert_property(properties, key, Value::String(scalar.to_string()));
        }
    }
}

fn insert_property(properties: &mut BTreeMap<String, Value>, key: String, value: Value) {
    let (parent, name) = split_last(&key);
    let wanted = relaxed(name);

    properties.retain(|existing, _| {
        if *existing == key {
            return true;
        }
        let (existing_parent, existing_name) = split_last(existing);
        existing_parent != parent || relaxed(existing_name) != wanted
    });
    properties.insert(key, value);
}

fn split_last(key: &str) -> (&str, &str) {
    key.rsplit_once('.').unwrap_or(("", key))
}

fn place(slot: &mut Option<Value>, path: &[&str], value: Value, at: String) -> Result<()> {
    let Some((head, tail)) = path.split_first() else {
        if slot.is_none() {
            *slot = Some(value);
            return Ok(());
        }
        // an empty map adds nothing to an existing map
        let both_maps = slot.as_ref().is_some_and(Value::is_object) && value.is_object();
        return if both_maps {
            Ok(())
        } else {
            Err(ConfigError::structure(at, "a map"))
        };
    };

    let node = slot.get_or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(children) = node else {
        return Err(ConfigError::structure(at, "a map"));
    };

    let mut child = children.remove(*head);
    place(&mut child, tail, value, format!("{at}.{head}"))?;
    if let Some(child) = child {
        children.insert((*head).to_string(), child);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_and_dotted_are_equivalent() {
        let nested = ConfigSnapshot::from_value(json!({
            "cloud": { "aws": { "region": { "static": "eu-west-1" } } }
        }))
        .unwrap();
        let dotted = ConfigSnapshot::new().with("cloud.aws.region.static", "eu-west-1");

        assert_eq!(nested, dotted);
        assert_eq!(nested.get("cloud.aws.region.static"), Some("eu-west-1"));
    }

    #[test]
    fn test_scalars_are_stored_as_text() {
        let snapshot = ConfigSnapshot::from_value(json!({
            "enabled": false,
            "port": 5432,
            "missing": null
        }))
        .unwrap();

        assert_eq!(snapshot.get("enabled"), Some("false"));
        assert_eq!(snapshot.get("port"), Some("5432"));
        assert!(!snapshot.contains("missing"));
    }

    #[test]
    fn test_root_must_be_a_map() {
        let result = ConfigSnapshot::from_value(json!("eu-west-1"));
        assert!(matches!(result, Err(ConfigError::InvalidStructure { .. })));
    }

    #[test]
    fn test_has_text() {
        let snapshot = ConfigSnapshot::new().with("blank", "   ").with("set", "x");

        assert!(snapshot.has_text("set"));
        assert!(!snapshot.has_text("blank"));
        assert!(!snapshot.has_text("absent"));
    }

    #[test]
    fn test_sub_tree_rebuilds_nesting() {
        let snapshot = ConfigSnapshot::new()
            .with("cloud.aws.rds.orders.username", "alice")
            .with("cloud.aws.rds.orders.password", "secret")
            .with("cloud.aws.rds.users.username", "bob")
            .with("cloud.aws.rds-config.enabled", "true");

        let tree = snapshot.sub_tree("cloud.aws.rds").unwrap().unwrap();
        assert_eq!(
            tree,
            json!({
                "orders": { "username": "alice", "password": "secret" },
                "users": { "username": "bob" }
            })
        );
    }

    #[test]
    fn test_sub_tree_missing() {
        let snapshot = ConfigSnapshot::new().with("cloud.aws.region.static", "eu-west-1");
        assert!(snapshot.sub_tree("cloud.aws.rds").unwrap().is_none());
    }

    #[test]
    fn test_sub_tree_keeps_empty_entries() {
        let snapshot = ConfigSnapshot::from_value(json!({
            "cloud.aws.rds": { "orders": {} }
        }))
        .unwrap();

        let tree = snapshot.sub_tree("cloud.aws.rds").unwrap().unwrap();
        assert_eq!(tree, json!({ "orders": {} }));
    }

    #[test]
    fn test_sub_tree_rejects_value_with_children() {
        let snapshot = ConfigSnapshot::new()
            .with("cloud.aws.rds.orders", "oops")
            .with("cloud.aws.rds.orders.username", "alice");

        let err = snapshot.sub_tree("cloud.aws.rds").unwrap_err();
        match err {
            ConfigError::InvalidStructure { key, .. } => assert_eq!(key, "cloud.aws.rds.orders"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = ConfigSnapshot::new().with("a", "1").with("b", "2");
        base.merge(ConfigSnapshot::new().with("b", "3"));

        assert_eq!(base.get("a"), Some("1"));
        assert_eq!(base.get("b"), Some("3"));
    }

    #[test]
    fn test_later_value_replaces_relaxed_sibling() {
        let mut base = ConfigSnapshot::new()
            .with("cloud.aws.rds.orders.databaseName", "filedb")
            .with("cloud.aws.rds.billing.databaseName", "billing");
        base.merge(ConfigSnapshot::new().with("cloud.aws.rds.orders.databasename", "envdb"));
        base.set("cloud.aws.rds.orders.read-replica-support", "true");
        base.set("cloud.aws.rds.orders.readReplicaSupport", "false");

        assert_eq!(base.get("cloud.aws.rds.orders.databasename"), Some("envdb"));
        assert!(!base.contains("cloud.aws.rds.orders.databaseName"));
        assert_eq!(base.get("cloud.aws.rds.billing.databaseName"), Some("billing"));
        assert_eq!(base.get("cloud.aws.rds.orders.readReplicaSupport"), Some("false"));
        assert!(!base.contains("cloud.aws.rds.orders.read-replica-support"));
    }
}
