//! Configuration types for the writeback engine.
//!
//! Configuration is loaded from a single YAML file:
//!
//! ```yaml
//! settings:
//!   enable-actions: true
//! capabilities:
//!   mysql:
//!     bulk-actions: false
//! resources:
//!   - id: 2
//!     name: Sample
//!     engine: h2
//!     settings:
//!       database-enable-actions: true
//!     tables:
//!       - id: 29
//!         name: people
//!         fields: { 1: id, 2: name }
//!         rows:
//!           - { id: 1, name: Alice }
//! ```

pub mod settings;

use crate::connector::{ConnectorKind, Feature};
use crate::resource::Resource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

pub use settings::{
    DATABASE_ENABLE_ACTIONS, ENABLE_ACTIONS, ScopedSettings, Settings, SharedSettings,
};

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WritebackConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub settings: Settings,

    /// Capability declarations that override the built-in ones.
    #[serde(default)]
    pub capabilities: BTreeMap<ConnectorKind, BTreeMap<Feature, bool>>,

    /// Resources served by the in-memory store.
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

/// A resource entry, with optional seed tables for the in-memory connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub id: u64,

    #[serde(default)]
    pub name: String,

    pub engine: ConnectorKind,

    #[serde(default)]
    pub settings: Map<String, Value>,

    #[serde(default)]
    pub tables: Vec<TableSeed>,
}

impl ResourceConfig {
    /// The resource record this entry describes.
    pub fn to_resource(&self) -> Resource {
        Resource {
            id: self.id,
            name: self.name.clone(),
            engine: self.engine,
            settings: self.settings.clone(),
        }
    }
}

/// Initial contents of one in-memory table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSeed {
    /// Identifier referenced as `sourceTable`.
    pub id: u64,

    pub name: String,

    /// Column holding the auto-assigned row identifier.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Field id to column name, for filters that reference fields by id.
    #[serde(default)]
    pub fields: BTreeMap<u64, String>,

    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WritebackConfig {
    /// Load and validate configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot serve unambiguously.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut resource_ids = BTreeSet::new();
        for resource in &self.resources {
            if resource.id == 0 {
                return Err(ConfigError::Config(
                    "resource ids must be positive integers".to_string(),
                ));
            }
            if !resource_ids.insert(resource.id) {
                return Err(ConfigError::Config(format!(
                    "duplicate resource id {}",
                    resource.id
                )));
            }

            let mut table_ids = BTreeSet::new();
            for table in &resource.tables {
                if !table_ids.insert(table.id) {
                    return Err(ConfigError::Config(format!(
                        "duplicate table id {} in resource {}",
                        table.id, resource.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Look up a configured resource by id.
    pub fn resource(&self, id: u64) -> Option<&ResourceConfig> {
        self.resources.iter().find(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
settings:
  enable-actions: true
capabilities:
  mysql:
    bulk-actions: false
resources:
  - id: 2
    name: Sample
    engine: h2
    settings:
      database-enable-actions: true
    tables:
      - id: 29
        name: people
        fields: { 1: id, 2: name }
        rows:
          - { id: 1, name: Alice }
"#;

    #[test]
    fn parses_sample_configuration() {
        let config = WritebackConfig::from_yaml(SAMPLE).unwrap();

        assert!(config.settings.get_bool(ENABLE_ACTIONS));
        assert_eq!(
            config.capabilities[&ConnectorKind::MySql][&Feature::BulkActions],
            false
        );

        let resource = config.resource(2).unwrap().to_resource();
        assert_eq!(resource.engine, ConnectorKind::H2);
        assert_eq!(resource.settings[DATABASE_ENABLE_ACTIONS], Value::Bool(true));

        let table = &config.resource(2).unwrap().tables[0];
        assert_eq!(table.primary_key, "id");
        assert_eq!(table.fields[&2], "name");
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = WritebackConfig::from_yaml("{}").unwrap();
        assert!(config.resources.is_empty());
        assert!(config.settings.get_bool(ENABLE_ACTIONS));
    }

    #[test]
    fn rejects_duplicate_resource_ids() {
        let yaml = r#"
resources:
  - { id: 1, engine: h2 }
  - { id: 1, engine: postgres }
"#;
        let err = WritebackConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Config(msg) if msg.contains("duplicate resource id 1")));
    }

    #[test]
    fn rejects_unknown_engines() {
        let yaml = "resources:\n  - { id: 1, engine: oracle }\n";
        assert!(matches!(
            WritebackConfig::from_yaml(yaml),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = WritebackConfig::from_file(file.path()).unwrap();
        assert_eq!(config.resources.len(), 1);
    }
}
