//! fkdump-codec: Fixture serializers.
//!
//! Turns a sequence of [`Record`]s into fixture text in one of the supported
//! formats. Every format carries the same three things per record: the model
//! label, the primary key and the field map.

pub mod error;
pub mod json;
pub mod xml;
pub mod yaml;

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use fkdump_core::Record;

pub use error::{CodecError, Result};

/// Supported fixture formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FixtureFormat {
    #[default]
    Json,
    Yaml,
    Xml,
}

impl FixtureFormat {
    /// Every format accepted on the command line.
    pub const ALL: [FixtureFormat; 3] = [Self::Json, Self::Yaml, Self::Xml];

    /// Resolve a format identifier (case-insensitive; `yml` is accepted for YAML).
    pub fn parse(identifier: &str) -> Result<Self> {
        match identifier.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "xml" => Ok(Self::Xml),
            _ => Err(CodecError::UnknownFormat {
                format: identifier.to_string(),
            }),
        }
    }

    /// Canonical identifier, also used as the file extension.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Xml => "xml",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.identifier()
    }
}

impl fmt::Display for FixtureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for FixtureFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Serialize `records` to `writer`.
///
/// `indent` of `None` produces compact output where the format allows it.
pub fn serialize<W: Write>(
    format: FixtureFormat,
    records: &[Record],
    indent: Option<usize>,
    writer: W,
) -> Result<()> {
    tracing::debug!(%format, records = records.len(), ?indent, "Serializing fixture");
    match format {
        FixtureFormat::Json => json::write(records, indent, writer),
        FixtureFormat::Yaml => yaml::write(records, writer),
        FixtureFormat::Xml => xml::write(records, indent, writer),
    }
}

/// Serialize into an owned buffer.
pub fn to_bytes(format: FixtureFormat, records: &[Record], indent: Option<usize>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    serialize(format, records, indent, &mut buf)?;
    Ok(buf)
}
