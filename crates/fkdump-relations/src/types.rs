//! Request and report types for dump operations.

use serde::{Deserialize, Serialize};

use fkdump_core::ModelLabel;

/// Indent used for split-mode fixture files when none is requested.
pub const SPLIT_INDENT: usize = 2;

/// Request to dump a model and the records it relates to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpRequest {
    /// Dotted type name (`app_label.ModelName`).
    pub model: String,
    /// Output format identifier (default: json).
    #[serde(default = "default_format")]
    pub format: String,
    /// Pretty-print indent; `None` for compact output.
    #[serde(default)]
    pub indent: Option<usize>,
    /// Relation hops to follow from the seeds. 0 dumps the seeds only.
    #[serde(default)]
    pub max_depth: u32,
    /// Restrict seeds to these primary keys. Empty means every record of the type.
    #[serde(default)]
    pub ids: Vec<String>,
    /// Dotted type names never to follow.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_format() -> String {
    "json".to_string()
}

impl DumpRequest {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            format: default_format(),
            indent: None,
            max_depth: 0,
            ids: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = format.to_string();
        self
    }

    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_ids<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<I, T>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of writing per-type fixtures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PersistReport {
    /// Fixtures written, in write order.
    pub written: Vec<WrittenFixture>,
    /// The write that failed, if any. Nothing after it was attempted.
    pub failure: Option<PersistFailure>,
}

impl PersistReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WrittenFixture {
    pub model: ModelLabel,
    pub name: String,
    pub records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersistFailure {
    pub model: ModelLabel,
    pub name: String,
    pub reason: String,
}
