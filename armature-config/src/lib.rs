// Configuration snapshots and property binding for Armature
//
// A snapshot is read once at startup and never mutated afterwards; typed
// settings are bound from it in a single validating step.

pub mod binding;
pub mod builder;
pub mod env;
pub mod error;
pub mod loader;
pub mod snapshot;
pub mod validation;

pub use binding::{FromProperties, PropertyTable, bind_tables, has_text, parse_lenient_bool};
pub use builder::SnapshotBuilder;
pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use snapshot::ConfigSnapshot;
pub use validation::{ConfigValidator, Validate};
