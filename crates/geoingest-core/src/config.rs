//! Configuration schema (geoingest.toml)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Connection settings for one index instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Base URL of the index core, e.g. `http://localhost:8983/solr/geodata`
    pub url: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

/// Per-rule configuration: a plain on/off toggle, or the field list for the
/// required-non-empty rule. Absent rules default to disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSetting {
    Enabled(bool),
    Fields(Vec<String>),
}

impl RuleSetting {
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Enabled(enabled) => *enabled,
            Self::Fields(fields) => !fields.is_empty(),
        }
    }

    pub fn fields(&self) -> &[String] {
        match self {
            Self::Enabled(_) => &[],
            Self::Fields(fields) => fields,
        }
    }
}

fn default_max_query_size() -> usize {
    // Keeps chunked filter queries inside a conservative URI length budget
    7168
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Index instances by name
    #[serde(default)]
    pub instances: HashMap<String, InstanceConfig>,

    /// Schema registry: schema name to JSON Schema file path
    /// (relative paths resolve against `project_root`)
    #[serde(default)]
    pub schemas: HashMap<String, String>,

    /// Rule configuration by rule name
    #[serde(default)]
    pub checks: HashMap<String, RuleSetting>,

    /// Transport size limit for chunked identifier queries
    #[serde(default = "default_max_query_size")]
    pub max_query_size: usize,

    /// Directory the config file was loaded from
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instances: HashMap::new(),
            schemas: HashMap::new(),
            checks: HashMap::new(),
            max_query_size: default_max_query_size(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Look up an index instance by name
    pub fn instance(&self, name: &str) -> Result<&InstanceConfig, ConfigError> {
        self.instances
            .get(name)
            .ok_or_else(|| ConfigError::UnknownInstance(name.to_string()))
    }

    /// Rule setting by name; absent entries mean disabled
    pub fn check(&self, name: &str) -> Option<&RuleSetting> {
        self.checks.get(name)
    }

    pub fn is_check_enabled(&self, name: &str) -> bool {
        self.checks.get(name).map(RuleSetting::is_enabled).unwrap_or(false)
    }

    /// Resolve a schema name to its document path
    pub fn schema_file(&self, name: &str) -> Result<PathBuf, ConfigError> {
        let raw = self
            .schemas
            .get(name)
            .ok_or_else(|| ConfigError::UnknownSchema(name.to_string()))?;

        let path = PathBuf::from(raw);
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(self.project_root.join(path))
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("unknown index instance '{0}'")]
    UnknownInstance(String),

    #[error("unknown schema '{0}'")]
    UnknownSchema(String),
}
