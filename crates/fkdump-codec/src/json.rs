//! JSON fixtures: an array of `{"model", "pk", "fields"}` objects.

use std::io::Write;

use serde::Serialize;
use serde_json::ser::{CompactFormatter, PrettyFormatter, Serializer};

use fkdump_core::Record;

use crate::error::Result;

pub fn write<W: Write>(records: &[Record], indent: Option<usize>, writer: W) -> Result<()> {
    match indent {
        Some(width) => {
            let pad = vec![b' '; width];
            let mut ser = Serializer::with_formatter(writer, PrettyFormatter::with_indent(&pad));
            records.serialize(&mut ser)?;
        }
        None => {
            let mut ser = Serializer::with_formatter(writer, CompactFormatter);
            records.serialize(&mut ser)?;
        }
    }
    Ok(())
}
