//! XML fixtures in the `django-objects` layout.
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <django-objects version="1.0">
//!   <object model="shop.order" pk="1">
//!     <field name="customer">5</field>
//!     <field name="coupon"><None/></field>
//!     <field name="tags"><object pk="a"/><object pk="b"/></field>
//!   </object>
//! </django-objects>
//! ```
//!
//! The writer sees records only, not their schema. Any array made entirely of
//! key-shaped values (integers or strings) is therefore rendered as
//! many-to-many `<object pk/>` children, including a scalar list field such as
//! `["x", "y"]`. Arrays holding anything else fall back to their JSON text.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;

use fkdump_core::{PrimaryKey, Record};

use crate::error::Result;

const ROOT: &str = "django-objects";

pub fn write<W: Write>(records: &[Record], indent: Option<usize>, writer: W) -> Result<()> {
    match indent {
        Some(width) if width > 0 => {
            write_document(&mut Writer::new_with_indent(writer, b' ', width), records)
        }
        _ => write_document(&mut Writer::new(writer), records),
    }
}

fn write_document<W: Write>(writer: &mut Writer<W>, records: &[Record]) -> Result<()> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut root = BytesStart::new(ROOT);
    root.push_attribute(("version", "1.0"));
    writer.write_event(Event::Start(root))?;

    for record in records {
        let model = record.model.to_string();
        let pk = record.pk.to_string();
        let mut object = BytesStart::new("object");
        object.push_attribute(("model", model.as_str()));
        object.push_attribute(("pk", pk.as_str()));
        writer.write_event(Event::Start(object))?;

        for (name, value) in &record.fields {
            write_field(writer, name, value)?;
        }

        writer.write_event(Event::End(BytesEnd::new("object")))?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT)))?;
    Ok(())
}

fn write_field<W: Write>(writer: &mut Writer<W>, name: &str, value: &Value) -> Result<()> {
    let mut field = BytesStart::new("field");
    field.push_attribute(("name", name));
    writer.write_event(Event::Start(field))?;

    match value {
        Value::Null => {
            writer.write_event(Event::Empty(BytesStart::new("None")))?;
        }
        Value::Array(items) if items.iter().all(is_key) => {
            // Many-to-many values: one empty <object pk="..."/> per related key.
            for item in items.iter().filter_map(PrimaryKey::from_value) {
                let pk = item.to_string();
                let mut object = BytesStart::new("object");
                object.push_attribute(("pk", pk.as_str()));
                writer.write_event(Event::Empty(object))?;
            }
        }
        Value::String(s) => {
            writer.write_event(Event::Text(BytesText::new(s)))?;
        }
        other => {
            let text = other.to_string();
            writer.write_event(Event::Text(BytesText::new(&text)))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("field")))?;
    Ok(())
}

fn is_key(value: &Value) -> bool {
    PrimaryKey::from_value(value).is_some()
}
