// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Rendering of headers, schema sections and decoded values.

use colored::*;
use graphser::schema::{RemoteSchema, TypeNotation};
use graphser::wire::Header;
use graphser::{ObjectRef, Value};
use serde_json::{json, Map};
use std::collections::HashMap;
use std::sync::Arc;

/// Assigns `@id`s to shared objects so repeats render as references.
#[derive(Default)]
pub struct Identities {
    seen: HashMap<usize, usize>,
}

impl Identities {
    /// `Ok(id)` for a first sighting, `Err(id)` for a repeat.
    fn visit(&mut self, object: &ObjectRef) -> Result<usize, usize> {
        let key = Arc::as_ptr(object) as *const () as usize;
        let next = self.seen.len();
        match self.seen.get(&key) {
            Some(&id) => Err(id),
            None => {
                self.seen.insert(key, next);
                Ok(next)
            }
        }
    }
}

// ============================================================================
// JSON
// ============================================================================

pub fn header_json(header: &Header, size: usize) -> serde_json::Value {
    json!({
        "version": header.version,
        "encoding": header.encoding.to_string(),
        "size": size,
    })
}

pub fn schema_json(schema: &RemoteSchema) -> serde_json::Value {
    let notations: Vec<serde_json::Value> = schema
        .notations()
        .iter()
        .enumerate()
        .map(|(index, notation)| notation_json(index, notation))
        .collect();
    serde_json::Value::Array(notations)
}

fn notation_json(index: usize, notation: &TypeNotation) -> serde_json::Value {
    match notation {
        TypeNotation::Composite(c) => json!({
            "index": index,
            "kind": "composite",
            "name": c.name.as_ref(),
            "fingerprint": c.descriptor.to_hex(),
            "interfaces": c.interfaces.iter().map(|i| i.as_ref()).collect::<Vec<_>>(),
            "fields": c.fields.iter().map(|f| json!({
                "name": f.name.as_ref(),
                "type": f.type_ref.to_string(),
                "mandatory": f.mandatory,
            })).collect::<Vec<_>>(),
        }),
        TypeNotation::Restricted(r) => json!({
            "index": index,
            "kind": r.kind.to_string(),
            "name": r.name.as_ref(),
            "fingerprint": r.descriptor.to_hex(),
            "element_types": r.element_types.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
            "choices": r.choices,
        }),
    }
}

/// Structural JSON view of a decoded value.
///
/// Records become objects with an `@type` key. Shared records carry an `@id`
/// on first sight and render as `{"@ref": id}` afterwards.
pub fn value_json(value: &Value, ids: &mut Identities) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Long(l) => json!(l),
        Value::Double(d) => json!(d),
        Value::String(s) => json!(s),
        Value::Binary(bytes) => json!({ "@binary": hex(bytes) }),
        Value::List(items) => {
            serde_json::Value::Array(items.iter().map(|v| value_json(v, ids)).collect())
        }
        Value::Map(entries) => serde_json::Value::Array(
            entries
                .iter()
                .map(|(k, v)| json!({ "key": value_json(k, ids), "value": value_json(v, ids) }))
                .collect(),
        ),
        Value::Enum {
            type_name,
            constant,
        } => json!({ "@enum": type_name.as_ref(), "constant": constant }),
        Value::Object(object) => match ids.visit(object) {
            Err(id) => json!({ "@ref": id }),
            Ok(id) => {
                let mut fields = Map::new();
                fields.insert("@id".into(), json!(id));
                match value.as_record() {
                    Some(record) => {
                        fields.insert("@type".into(), json!(record.type_name()));
                        for (name, field) in record.fields() {
                            fields.insert(name.to_string(), value_json(field, ids));
                        }
                    }
                    None => {
                        fields.insert("@type".into(), json!("<native>"));
                    }
                }
                serde_json::Value::Object(fields)
            }
        },
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ============================================================================
// Pretty
// ============================================================================

pub fn print_header(header: &Header, size: usize) {
    println!("{}", "Header".bold());
    println!("  version   {}", header.version);
    println!("  encoding  {}", header.encoding.to_string().cyan());
    println!("  size      {} bytes", size);
}

pub fn print_schema(schema: &RemoteSchema) {
    println!();
    println!("{} ({} notations)", "Schema".bold(), schema.len());
    for (index, notation) in schema.notations().iter().enumerate() {
        let fingerprint = notation.descriptor().to_hex();
        match notation.as_ref() {
            TypeNotation::Composite(c) => {
                println!(
                    "  [{}] {} {}  {}",
                    index,
                    "composite".green(),
                    c.name.as_ref().bold(),
                    fingerprint[..16].dimmed()
                );
                if !c.interfaces.is_empty() {
                    let names: Vec<&str> = c.interfaces.iter().map(|i| i.as_ref()).collect();
                    println!("      implements {}", names.join(", "));
                }
                for field in &c.fields {
                    let marker = if field.mandatory { "" } else { "?" };
                    println!("      {}{}: {}", field.name, marker, field.type_ref);
                }
            }
            TypeNotation::Restricted(r) => {
                println!(
                    "  [{}] {} {}  {}",
                    index,
                    r.kind.to_string().yellow(),
                    r.name.as_ref().bold(),
                    fingerprint[..16].dimmed()
                );
                if !r.element_types.is_empty() {
                    let types: Vec<String> = r.element_types.iter().map(|t| t.to_string()).collect();
                    println!("      of {}", types.join(", "));
                }
                if !r.choices.is_empty() {
                    println!("      {{ {} }}", r.choices.join(" | "));
                }
            }
        }
    }
}

pub fn print_value(value: &Value, ids: &mut Identities, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        Value::List(items) => {
            println!("list[{}]", items.len());
            for item in items {
                print!("{}  - ", pad);
                print_value(item, ids, indent + 2);
            }
        }
        Value::Map(entries) => {
            println!("map[{}]", entries.len());
            for (key, item) in entries {
                print!("{}  {} => ", pad, scalar(key));
                print_value(item, ids, indent + 2);
            }
        }
        Value::Object(object) => match ids.visit(object) {
            Err(id) => println!("{}", format!("-> @{}", id).dimmed()),
            Ok(id) => match value.as_record() {
                Some(record) => {
                    println!("{} {}", record.type_name().bold(), format!("@{}", id).dimmed());
                    for (name, field) in record.fields() {
                        print!("{}  {}: ", pad, name.cyan());
                        print_value(field, ids, indent + 1);
                    }
                }
                None => println!("<native> {}", format!("@{}", id).dimmed()),
            },
        },
        other => println!("{}", scalar(other)),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".dimmed().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Long(l) => format!("{}L", l),
        Value::Double(d) => d.to_string(),
        Value::String(s) => format!("{:?}", s).green().to_string(),
        Value::Binary(bytes) => format!("0x{}", hex(bytes)),
        Value::Enum {
            type_name,
            constant,
        } => format!("{}.{}", type_name, constant).yellow().to_string(),
        Value::List(items) => format!("list[{}]", items.len()),
        Value::Map(entries) => format!("map[{}]", entries.len()),
        Value::Object(_) => "object".to_string(),
    }
}
