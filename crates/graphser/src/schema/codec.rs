// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary form of the schema section.
//!
//! ```text
//! u32 count
//! per notation: u8 kind (0 composite, 1 restricted)
//!   composite:  name, descriptor[32], u32 n + interface names,
//!               u32 n + fields { name, type, u8 mandatory }
//!   restricted: name, u8 restricted kind, descriptor[32],
//!               u32 n + element types, u32 n + choices
//! ```

use super::notation::{CompositeNotation, RestrictedKind, RestrictedNotation, TypeNotation};
use crate::config::FINGERPRINT_LEN;
use crate::error::{Result, SerializationError};
use crate::types::{FieldShape, Fingerprint, TypeRef};
use crate::wire::{Cursor, Writer};
use std::sync::Arc;

const KIND_COMPOSITE: u8 = 0;
const KIND_RESTRICTED: u8 = 1;

/// Smallest encoded notation: kind byte, empty name, descriptor, two counts.
const MIN_NOTATION_LEN: usize = 1 + 4 + FINGERPRINT_LEN + 8;

pub fn write_schema(writer: &mut Writer, notations: &[Arc<TypeNotation>]) -> Result<()> {
    writer.write_len(notations.len())?;
    for notation in notations {
        write_notation(writer, notation)?;
    }
    Ok(())
}

fn write_notation(writer: &mut Writer, notation: &TypeNotation) -> Result<()> {
    match notation {
        TypeNotation::Composite(c) => {
            writer.write_u8(KIND_COMPOSITE);
            writer.write_str(&c.name)?;
            writer.write_bytes(c.descriptor.as_bytes());
            writer.write_len(c.interfaces.len())?;
            for interface in &c.interfaces {
                writer.write_str(interface)?;
            }
            writer.write_len(c.fields.len())?;
            for field in &c.fields {
                writer.write_str(&field.name)?;
                writer.write_str(&field.type_ref.to_string())?;
                writer.write_bool(field.mandatory);
            }
        }
        TypeNotation::Restricted(r) => {
            writer.write_u8(KIND_RESTRICTED);
            writer.write_str(&r.name)?;
            writer.write_u8(r.kind.to_u8());
            writer.write_bytes(r.descriptor.as_bytes());
            writer.write_len(r.element_types.len())?;
            for element in &r.element_types {
                writer.write_str(&element.to_string())?;
            }
            writer.write_len(r.choices.len())?;
            for choice in &r.choices {
                writer.write_str(choice)?;
            }
        }
    }
    Ok(())
}

/// Read the schema section. Structural checks live in [`super::RemoteSchema`].
pub fn read_schema(cursor: &mut Cursor<'_>) -> Result<Vec<TypeNotation>> {
    let count = cursor.read_len(MIN_NOTATION_LEN)?;
    let mut notations = Vec::with_capacity(count);
    for _ in 0..count {
        notations.push(read_notation(cursor)?);
    }
    Ok(notations)
}

fn read_notation(cursor: &mut Cursor<'_>) -> Result<TypeNotation> {
    match cursor.read_u8()? {
        KIND_COMPOSITE => {
            let name = read_name(cursor)?;
            let descriptor = read_fingerprint(cursor)?;
            let interface_count = cursor.read_len(4)?;
            let mut interfaces = Vec::with_capacity(interface_count);
            for _ in 0..interface_count {
                interfaces.push(read_name(cursor)?);
            }
            // name + type + mandatory
            let field_count = cursor.read_len(4 + 4 + 1)?;
            let mut fields = Vec::with_capacity(field_count);
            for _ in 0..field_count {
                let name = Arc::from(cursor.read_str()?);
                let type_ref = TypeRef::parse(cursor.read_str()?)?;
                let mandatory = cursor.read_bool()?;
                fields.push(FieldShape {
                    name,
                    type_ref,
                    mandatory,
                });
            }
            Ok(TypeNotation::Composite(CompositeNotation {
                name,
                descriptor,
                interfaces,
                fields,
            }))
        }
        KIND_RESTRICTED => {
            let name: Arc<str> = Arc::from(cursor.read_str()?);
            let kind = RestrictedKind::from_u8(cursor.read_u8()?)?;
            let descriptor = read_fingerprint(cursor)?;
            let element_count = cursor.read_len(4)?;
            let mut element_types = Vec::with_capacity(element_count);
            for _ in 0..element_count {
                element_types.push(TypeRef::parse(cursor.read_str()?)?);
            }
            let choice_count = cursor.read_len(4)?;
            let mut choices = Vec::with_capacity(choice_count);
            for _ in 0..choice_count {
                choices.push(cursor.read_str()?.to_string());
            }
            Ok(TypeNotation::Restricted(RestrictedNotation {
                name,
                kind,
                descriptor,
                element_types,
                choices,
            }))
        }
        other => Err(SerializationError::malformed(format!(
            "unknown notation kind {} at offset {}",
            other,
            cursor.offset().saturating_sub(1)
        ))),
    }
}

fn read_name(cursor: &mut Cursor<'_>) -> Result<Arc<str>> {
    let name = cursor.read_str()?;
    crate::types::validate_type_name(name)
        .map_err(|_| SerializationError::malformed(format!("invalid type name {:?}", name)))?;
    Ok(Arc::from(name))
}

fn read_fingerprint(cursor: &mut Cursor<'_>) -> Result<Fingerprint> {
    let bytes = cursor.read_bytes(FINGERPRINT_LEN)?;
    let mut out = [0u8; FINGERPRINT_LEN];
    out.copy_from_slice(bytes);
    Ok(Fingerprint::from_bytes(out))
}
