//! The backing-store interface consumed by the traversal code.

use fkdump_core::{EntityType, ModelLabel, PrimaryKey, Record};

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unknown model: {label}")]
    UnknownModel { label: String },

    #[error("Unknown field {field} on model {label}")]
    UnknownField { label: String, field: String },

    #[error("Field {field} on model {label} is not a many-to-many relation")]
    NotARelation { label: String, field: String },

    #[error("Invalid dataset: {0}")]
    Dataset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Read-only access to a relational model graph.
///
/// All calls are blocking. Implementations return records of the requested
/// type only; callers rely on that when labelling edges.
pub trait ModelStore {
    /// Introspect a type: its fields, their kinds and related types.
    fn describe(&self, label: &ModelLabel) -> Result<EntityType>;

    /// Every record of a type.
    fn fetch_all(&self, label: &ModelLabel) -> Result<Vec<Record>>;

    /// Records of a type whose primary key is in `keys`. Unknown keys are skipped.
    fn fetch_by_keys(&self, label: &ModelLabel, keys: &[PrimaryKey]) -> Result<Vec<Record>>;

    /// The records a many-to-many field of `record` points at.
    fn fetch_related(&self, record: &Record, field: &str) -> Result<Vec<Record>>;
}

impl<S: ModelStore + ?Sized> ModelStore for &S {
    fn describe(&self, label: &ModelLabel) -> Result<EntityType> {
        (**self).describe(label)
    }

    fn fetch_all(&self, label: &ModelLabel) -> Result<Vec<Record>> {
        (**self).fetch_all(label)
    }

    fn fetch_by_keys(&self, label: &ModelLabel, keys: &[PrimaryKey]) -> Result<Vec<Record>> {
        (**self).fetch_by_keys(label, keys)
    }

    fn fetch_related(&self, record: &Record, field: &str) -> Result<Vec<Record>> {
        (**self).fetch_related(record, field)
    }
}
