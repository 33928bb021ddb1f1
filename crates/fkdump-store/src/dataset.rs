//! Dataset documents: model descriptors plus fixture records.
//!
//! ```yaml
//! models:
//!   - app_label: shop
//!     object_name: Order
//!     fields:
//!       - { name: customer, kind: foreign_key, to: shop.customer }
//!       - { name: tags, kind: many_to_many, to: shop.tag }
//! records:
//!   - { model: shop.order, pk: 1, fields: { customer: 5, tags: [a, b] } }
//! ```
//!
//! The `records` section is ordinary fixture data, so the output of a dump can
//! be fed back in as a dataset.

use std::path::Path;

use serde::Deserialize;

use fkdump_core::{EntityType, FieldDescriptor, Record};

use crate::memory::MemoryStore;
use crate::store::{Result, StoreError};

/// Serialized shape of a dataset document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub models: Vec<ModelSpec>,
    #[serde(default)]
    pub records: Vec<Record>,
}

/// One model declaration inside a dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSpec {
    pub app_label: String,
    pub object_name: String,
    #[serde(default)]
    pub proxy: bool,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl ModelSpec {
    fn into_entity(self) -> EntityType {
        let mut entity = EntityType::new(&self.app_label, &self.object_name);
        entity.proxy = self.proxy;
        entity.fields = self.fields;
        entity
    }
}

/// Document encodings a dataset can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Json,
    Yaml,
}

impl DatasetFormat {
    /// Pick the encoding from a file extension; anything unrecognized is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

impl Dataset {
    pub fn parse(text: &str, format: DatasetFormat) -> Result<Self> {
        let dataset = match format {
            DatasetFormat::Json => serde_json::from_str(text)?,
            DatasetFormat::Yaml => serde_yaml_ng::from_str(text)?,
        };
        Ok(dataset)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, DatasetFormat::from_path(path))
    }

    /// Build a validated store: all models first, then relation targets, then rows.
    pub fn into_store(self) -> Result<MemoryStore> {
        let mut store = MemoryStore::new();
        for spec in self.models {
            store.register(spec.into_entity())?;
        }
        store.validate()?;
        for record in self.records {
            store.insert(record)?;
        }
        Ok(store)
    }
}

impl MemoryStore {
    /// Load a dataset document from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let store = Dataset::load(path)
            .and_then(Dataset::into_store)
            .map_err(|e| match e {
                StoreError::Dataset(msg) => {
                    StoreError::Dataset(format!("{}: {msg}", path.display()))
                }
                other => other,
            })?;
        tracing::info!(
            path = %path.display(),
            models = store.model_count(),
            records = store.record_count(),
            "Loaded dataset"
        );
        Ok(store)
    }
}
