//! YAML fixtures: a sequence of fixture mappings. Indentation is fixed by the emitter.

use std::io::Write;

use fkdump_core::Record;

use crate::error::Result;

pub fn write<W: Write>(records: &[Record], writer: W) -> Result<()> {
    serde_yaml_ng::to_writer(writer, records)?;
    Ok(())
}
