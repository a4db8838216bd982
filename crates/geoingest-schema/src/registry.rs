//! File-backed schema registry

use geoingest_core::{Config, ConfigError};
use serde_json::Value;

/// Errors raised while resolving or compiling a schema
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown schema '{0}'")]
    Unknown(String),

    #[error("failed to read schema '{name}': {reason}")]
    Io { name: String, reason: String },

    #[error("schema '{name}' is not valid: {reason}")]
    Definition { name: String, reason: String },
}

/// Resolves configured schema names to JSON Schema documents.
///
/// A pure lookup: reads the file named in the `[schemas]` config table,
/// relative paths anchored at the config's project root.
pub struct SchemaRegistry<'a> {
    config: &'a Config,
}

impl<'a> SchemaRegistry<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn resolve(&self, name: &str) -> Result<Value, SchemaError> {
        let path = self.config.schema_file(name).map_err(|err| match err {
            ConfigError::UnknownSchema(name) => SchemaError::Unknown(name),
            other => SchemaError::Io {
                name: name.to_string(),
                reason: other.to_string(),
            },
        })?;

        let raw = std::fs::read_to_string(&path).map_err(|e| SchemaError::Io {
            name: name.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;

        serde_json::from_str(&raw).map_err(|e| SchemaError::Definition {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }
}
