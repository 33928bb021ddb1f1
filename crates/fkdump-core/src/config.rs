//! Configuration management for fkdump.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`FKDUMP__` prefix, `__` separator, e.g. `FKDUMP__DUMP__FORMAT=xml`)
//! 2. Config file (`fkdump.toml`, prefix selectable)
//! 3. Defaults

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::Result;

/// Alias used when no `--database` is given.
pub const DEFAULT_DB_ALIAS: &str = "default";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FkdumpConfig {
    /// Dataset per database alias.
    #[serde(default)]
    pub databases: BTreeMap<String, DatabaseConfig>,

    #[serde(default)]
    pub dump: DumpSettings,
}

/// Where the records for one database alias come from.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Dataset document (JSON or YAML, picked by extension).
    pub path: String,
}

/// Defaults for the dump command.
#[derive(Debug, Clone, Deserialize)]
pub struct DumpSettings {
    /// Output format when `--format` is not given.
    #[serde(default = "default_format")]
    pub format: String,

    /// Indent when `--indent` is not given; `None` means compact output.
    #[serde(default)]
    pub indent: Option<usize>,
}

fn default_format() -> String {
    "json".to_string()
}

fn default_dataset_path() -> String {
    "fixtures/dataset.json".to_string()
}

impl Default for DumpSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            indent: None,
        }
    }
}

impl Default for FkdumpConfig {
    fn default() -> Self {
        let mut config = Self {
            databases: BTreeMap::new(),
            dump: DumpSettings::default(),
        };
        config.ensure_default_database();
        config
    }
}

impl FkdumpConfig {
    /// Look up the dataset for a database alias.
    pub fn database(&self, alias: &str) -> Option<&DatabaseConfig> {
        self.databases.get(alias)
    }

    fn ensure_default_database(&mut self) {
        self.databases
            .entry(DEFAULT_DB_ALIAS.to_string())
            .or_insert_with(|| DatabaseConfig {
                path: default_dataset_path(),
            });
    }
}

/// Load configuration from `<file_prefix>.{toml,json,yaml}` (optional) and the environment.
pub fn load(file_prefix: &str) -> Result<FkdumpConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("FKDUMP")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut loaded: FkdumpConfig = cfg.try_deserialize()?;
    loaded.ensure_default_database();
    tracing::debug!(
        databases = loaded.databases.len(),
        format = %loaded.dump.format,
        "Loaded configuration"
    );
    Ok(loaded)
}
