//! Core domain types for fkdump.
//!
//! Records are kept in the same shape they are dumped in (a Django-style
//! fixture object), so a dataset can be loaded from fixtures and written back
//! out without an intermediate representation.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::FixtureError;

// ── Model Labels ──────────────────────────────────────────────────

/// Dotted `app_label.model_name` identifier of an entity type.
///
/// Both halves are stored lower-cased, so `shop.Order` and `shop.order`
/// name the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelLabel {
    app_label: String,
    model_name: String,
}

impl ModelLabel {
    pub fn new(app_label: &str, model_name: &str) -> Self {
        Self {
            app_label: app_label.to_lowercase(),
            model_name: model_name.to_lowercase(),
        }
    }

    /// Parse a `container.name` string. Exactly one dot is allowed.
    pub fn parse(raw: &str) -> Result<Self, FixtureError> {
        let invalid = || FixtureError::InvalidLabel {
            label: raw.to_string(),
        };
        let (app, model) = raw.trim().split_once('.').ok_or_else(invalid)?;
        if app.is_empty() || model.is_empty() || model.contains('.') {
            return Err(invalid());
        }
        Ok(Self::new(app, model))
    }

    pub fn app_label(&self) -> &str {
        &self.app_label
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl fmt::Display for ModelLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model_name)
    }
}

impl FromStr for ModelLabel {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ModelLabel {
    type Error = FixtureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ModelLabel> for String {
    fn from(label: ModelLabel) -> Self {
        label.to_string()
    }
}

// ── Primary Keys ──────────────────────────────────────────────────

/// Primary key of a record.
///
/// Serialized untagged: integers as JSON numbers, UUIDs in hyphenated form,
/// anything else as a plain string. Strings read from fixtures always stay
/// [`PrimaryKey::Text`] so their spelling survives a dump; the `Uuid` variant
/// only comes from code that builds keys directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged, from = "StoredKey")]
pub enum PrimaryKey {
    Int(i64),
    Uuid(Uuid),
    Text(String),
}

/// Wire shape of a key inside a fixture.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredKey {
    Int(i64),
    Text(String),
}

impl From<StoredKey> for PrimaryKey {
    fn from(key: StoredKey) -> Self {
        match key {
            StoredKey::Int(n) => Self::Int(n),
            StoredKey::Text(s) => Self::Text(s),
        }
    }
}

impl PrimaryKey {
    /// Parse a key given on the command line.
    ///
    /// Only the canonical spelling of an integer becomes [`PrimaryKey::Int`];
    /// `007` or `+7` stay text so a zero-padded string key can still be named.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => Self::Int(n),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// Read a key out of a field value. `null` and non-key values yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Uuid(u) => Value::String(u.to_string()),
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    /// Textual form used to match keys across representations.
    ///
    /// `7` and `"7"` share a lookup key, and any spelling of a UUID (simple,
    /// hyphenated, upper-case) maps to its hyphenated lower-case form. The key
    /// itself is never rewritten.
    pub fn lookup_key(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Uuid(u) => u.hyphenated().to_string(),
            Self::Text(s) => match Uuid::parse_str(s) {
                Ok(u) => u.hyphenated().to_string(),
                Err(_) => s.clone(),
            },
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PrimaryKey {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for PrimaryKey {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<Uuid> for PrimaryKey {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<&str> for PrimaryKey {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

// ── Entity Types ──────────────────────────────────────────────────

/// How a field relates its record to other records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Scalar,
    /// Single-valued, nullable reference holding the related primary key.
    ForeignKey,
    /// Multi-valued reference holding a list of related primary keys.
    ManyToMany,
}

impl FieldKind {
    pub fn is_relation(&self) -> bool {
        !matches!(self, Self::Scalar)
    }
}

/// One field of an entity type as reported by schema introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    /// Target type; present exactly when `kind` is a relation.
    #[serde(rename = "to", default, skip_serializing_if = "Option::is_none")]
    pub related: Option<ModelLabel>,
}

impl FieldDescriptor {
    pub fn scalar(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Scalar,
            related: None,
        }
    }

    pub fn foreign_key(name: &str, to: ModelLabel) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::ForeignKey,
            related: Some(to),
        }
    }

    pub fn many_to_many(name: &str, to: ModelLabel) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::ManyToMany,
            related: Some(to),
        }
    }
}

/// Schema descriptor for one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub label: ModelLabel,
    /// Display name as declared, e.g. `OrderLine`.
    pub object_name: String,
    /// Proxy types share their concrete type's rows and are never dumped directly.
    #[serde(default)]
    pub proxy: bool,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl EntityType {
    pub fn new(app_label: &str, object_name: &str) -> Self {
        Self {
            label: ModelLabel::new(app_label, object_name),
            object_name: object_name.to_string(),
            proxy: false,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Foreign-key fields paired with their target type.
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&FieldDescriptor, &ModelLabel)> {
        self.relations_of(FieldKind::ForeignKey)
    }

    /// Many-to-many fields paired with their target type.
    pub fn many_to_many(&self) -> impl Iterator<Item = (&FieldDescriptor, &ModelLabel)> {
        self.relations_of(FieldKind::ManyToMany)
    }

    fn relations_of(
        &self,
        kind: FieldKind,
    ) -> impl Iterator<Item = (&FieldDescriptor, &ModelLabel)> {
        self.fields
            .iter()
            .filter(move |f| f.kind == kind)
            .filter_map(|f| f.related.as_ref().map(|to| (f, to)))
    }
}

// ── Records ───────────────────────────────────────────────────────

/// An instance of an entity type, in fixture shape.
///
/// Identity is `(model, pk)`: two records with the same type and key are the
/// same record regardless of field contents, so sets of records deduplicate
/// the way ORM instances do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub model: ModelLabel,
    pub pk: PrimaryKey,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(model: ModelLabel, pk: impl Into<PrimaryKey>) -> Self {
        Self {
            model,
            pk: pk.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Value of a foreign-key field. Missing and `null` both mean "no reference".
    pub fn foreign_key(&self, name: &str) -> Option<PrimaryKey> {
        self.fields.get(name).and_then(PrimaryKey::from_value)
    }

    /// Keys held by a many-to-many field, in stored order.
    pub fn many_to_many(&self, name: &str) -> Vec<PrimaryKey> {
        match self.fields.get(name) {
            Some(Value::Array(items)) => items.iter().filter_map(PrimaryKey::from_value).collect(),
            _ => Vec::new(),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model && self.pk == other.pk
    }
}

impl Eq for Record {}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.model.hash(state);
        self.pk.hash(state);
    }
}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.model
            .cmp(&other.model)
            .then_with(|| self.pk.cmp(&other.pk))
    }
}
