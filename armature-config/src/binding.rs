// Property binding helpers

use crate::{ConfigError, ConfigSnapshot, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Types that can be bound from a table of properties.
pub trait FromProperties: Sized {
    fn from_properties(table: &PropertyTable) -> Result<Self>;
}

/// A map of properties found under a single key.
///
/// Lookups try the exact name first and then a relaxed form that ignores
/// case, `-` and `_`, so `databaseName`, `database-name` and `databasename`
/// all find the same entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyTable {
    key: String,
    entries: Map<String, Value>,
}

impl PropertyTable {
    pub fn new(key: impl Into<String>, entries: Map<String, Value>) -> Self {
        Self {
            key: key.into(),
            entries,
        }
    }

    /// Full dotted key of this table
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a plain value; a nested map in its place is an error
    pub fn text(&self, name: &str) -> Result<Option<&str>> {
        match self.lookup(name) {
            None => Ok(None),
            Some((_, Value::String(text))) => Ok(Some(text)),
            Some((found, _)) => Err(ConfigError::structure(
                format!("{}.{}", self.key, found),
                "a plain value",
            )),
        }
    }

    /// Read an owned plain value
    pub fn string(&self, name: &str) -> Result<Option<String>> {
        Ok(self.text(name)?.map(str::to_string))
    }

    /// Read a flag with the lenient parse, see [`parse_lenient_bool`]
    pub fn lenient_bool(&self, name: &str) -> Result<bool> {
        Ok(parse_lenient_bool(self.text(name)?))
    }

    /// Read a flag that must be `true` or `false` when present
    pub fn strict_bool(&self, name: &str) -> Result<Option<bool>> {
        self.text(name)?
            .map(|value| parse_strict_bool(&format!("{}.{}", self.key, name), value))
            .transpose()
    }

    /// Read a nested table
    pub fn table(&self, name: &str) -> Result<Option<PropertyTable>> {
        match self.lookup(name) {
            None => Ok(None),
            Some((found, Value::Object(entries))) => Ok(Some(PropertyTable::new(
                format!("{}.{}", self.key, found),
                entries.clone(),
            ))),
            Some((found, _)) => Err(ConfigError::structure(
                format!("{}.{}", self.key, found),
                "a map of properties",
            )),
        }
    }

    fn lookup(&self, name: &str) -> Option<(&String, &Value)> {
        self.entries.get_key_value(name).or_else(|| {
            let wanted = relaxed(name);
            self.entries.iter().find(|(key, _)| relaxed(key) == wanted)
        })
    }
}

/// Bind every named entry under `prefix` to its own table.
///
/// `cloud.aws.rds.orders.username = alice` binds to `{"orders": {"username": "alice"}}`.
/// Nothing under the prefix binds to an empty map.
pub fn bind_tables(snapshot: &ConfigSnapshot, prefix: &str) -> Result<BTreeMap<String, PropertyTable>> {
    let entries = match snapshot.sub_tree(prefix)? {
        None => return Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => entries,
        Some(_) => return Err(ConfigError::structure(prefix, "a map of named entries")),
    };

    entries
        .into_iter()
        .map(|(name, value)| match value {
            Value::Object(properties) => {
                let table = PropertyTable::new(format!("{prefix}.{name}"), properties);
                Ok((name, table))
            }
            _ => Err(ConfigError::structure(
                format!("{prefix}.{name}"),
                "a map of properties",
            )),
        })
        .collect()
}

/// `true` only for a case-insensitive `"true"`.
///
/// Anything else, malformed input and absence included, is `false`.
pub fn parse_lenient_bool(value: Option<&str>) -> bool {
    value.is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

/// `true` or `false` in any case; anything else fails.
pub fn parse_strict_bool(key: &str, value: &str) -> Result<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ConfigError::ParseError(format!(
            "{key}: expected 'true' or 'false', got '{value}'"
        )))
    }
}

/// Present and not only whitespace
pub fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty())
}

pub(crate) fn relaxed(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
