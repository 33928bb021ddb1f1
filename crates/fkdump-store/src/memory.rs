//! In-memory implementation of [`ModelStore`].
//!
//! Holds a registry of entity types and their rows. Foreign-key and
//! many-to-many values are read straight out of each record's fields, the same
//! way they appear in a fixture.

use std::collections::{BTreeMap, HashMap, HashSet};

use fkdump_core::{EntityType, FieldKind, ModelLabel, PrimaryKey, Record};

use crate::store::{ModelStore, Result, StoreError};

/// A model registry plus rows, keyed for primary-key lookups.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    models: BTreeMap<ModelLabel, EntityType>,
    rows: HashMap<ModelLabel, Vec<Record>>,
    /// `(model, PrimaryKey::lookup_key) → position in rows`. Text keys let `--id 7`
    /// match an integer key and a string key alike.
    index: HashMap<(ModelLabel, String), usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type. Labels must be unique and nameable as `app.Model`.
    pub fn register(&mut self, entity: EntityType) -> Result<()> {
        check_label(&entity.label)?;
        for field in &entity.fields {
            if field.kind.is_relation() && field.related.is_none() {
                return Err(StoreError::Dataset(format!(
                    "relation field {}.{} has no target model",
                    entity.label, field.name
                )));
            }
        }
        if self.models.contains_key(&entity.label) {
            return Err(StoreError::Dataset(format!(
                "model {} declared twice",
                entity.label
            )));
        }
        self.rows.entry(entity.label.clone()).or_default();
        self.models.insert(entity.label.clone(), entity);
        Ok(())
    }

    /// Add a row. Its model must be registered and its key unused.
    pub fn insert(&mut self, record: Record) -> Result<()> {
        if !self.models.contains_key(&record.model) {
            return Err(StoreError::UnknownModel {
                label: record.model.to_string(),
            });
        }
        let key = (record.model.clone(), record.pk.lookup_key());
        if self.index.contains_key(&key) {
            return Err(StoreError::Dataset(format!(
                "duplicate primary key {} for model {}",
                record.pk, record.model
            )));
        }
        let rows = self.rows.entry(record.model.clone()).or_default();
        self.index.insert(key, rows.len());
        rows.push(record);
        Ok(())
    }

    /// Check that every relation points at a registered model.
    pub fn validate(&self) -> Result<()> {
        for entity in self.models.values() {
            for field in &entity.fields {
                if let Some(target) = &field.related {
                    if !self.models.contains_key(target) {
                        return Err(StoreError::Dataset(format!(
                            "field {}.{} points at undeclared model {}",
                            entity.label, field.name, target
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn record_count(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    /// Registered labels in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &ModelLabel> {
        self.models.keys()
    }

    fn lookup(&self, label: &ModelLabel, pk: &PrimaryKey) -> Option<&Record> {
        let pos = self.index.get(&(label.clone(), pk.lookup_key()))?;
        self.rows.get(label).and_then(|rows| rows.get(*pos))
    }

    fn entity(&self, label: &ModelLabel) -> Result<&EntityType> {
        self.models.get(label).ok_or_else(|| StoreError::UnknownModel {
            label: label.to_string(),
        })
    }
}

/// A label must survive `ModelLabel::parse` unchanged and be safe to use as a
/// file name, since split output names files after it.
fn check_label(label: &ModelLabel) -> Result<()> {
    let text = label.to_string();
    let reject = |reason: &str| {
        Err(StoreError::Dataset(format!("invalid model label {text}: {reason}")))
    };
    if ModelLabel::parse(&text).ok().as_ref() != Some(label) {
        return reject("expected app_label.ModelName with exactly one dot");
    }
    if text
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
    {
        return reject("path separators and whitespace are not allowed");
    }
    Ok(())
}

impl ModelStore for MemoryStore {
    fn describe(&self, label: &ModelLabel) -> Result<EntityType> {
        self.entity(label).cloned()
    }

    fn fetch_all(&self, label: &ModelLabel) -> Result<Vec<Record>> {
        self.entity(label)?;
        Ok(self.rows.get(label).cloned().unwrap_or_default())
    }

    fn fetch_by_keys(&self, label: &ModelLabel, keys: &[PrimaryKey]) -> Result<Vec<Record>> {
        self.entity(label)?;
        let mut seen = HashSet::new();
        let found = keys
            .iter()
            .filter(|key| seen.insert(key.lookup_key()))
            .filter_map(|key| self.lookup(label, key).cloned())
            .collect();
        Ok(found)
    }

    fn fetch_related(&self, record: &Record, field: &str) -> Result<Vec<Record>> {
        let entity = self.entity(&record.model)?;
        let descriptor = entity.field(field).ok_or_else(|| StoreError::UnknownField {
            label: record.model.to_string(),
            field: field.to_string(),
        })?;
        let target = match (descriptor.kind, &descriptor.related) {
            (FieldKind::ManyToMany, Some(target)) => target,
            _ => {
                return Err(StoreError::NotARelation {
                    label: record.model.to_string(),
                    field: field.to_string(),
                })
            }
        };

        // The stored row is authoritative; a detached copy may be stale.
        let source = self.lookup(&record.model, &record.pk).unwrap_or(record);
        self.fetch_by_keys(target, &source.many_to_many(field))
    }
}
