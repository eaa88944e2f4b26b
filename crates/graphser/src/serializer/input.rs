// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Decoder: `header + schema + data` back to a [`Value`].
//!
//! Every value is read against the type the remote schema declared for it,
//! never the local one; reconciliation happens only when an instance is
//! constructed. Objects get their reference slot when their tag is read and
//! are stored once constructed, so a REFERENCE can only reach a completed
//! object. Admission runs immediately before each constructor call.
//!
//! Decode is all-or-nothing: any failure drops the partial graph.

use crate::carpenter::LocalTypes;
use crate::config::tags;
use crate::error::{Result, SerializationError};
use crate::scheme::SerializationContext;
use crate::schema::{read_schema, RemoteSchema, RestrictedKind, TypeNotation};
use crate::serializer::factory::{DecodeStrategy, SerializerFactory};
use crate::types::{ObjectRef, Record, TypeRef, TypeRegistration, Value};
use crate::whitelist::{admit, AdmissionRequest};
use crate::wire::{decode_body, Cursor, Header};
use std::sync::Arc;

/// Decode a complete message under `context`.
pub fn decode(factory: &SerializerFactory, bytes: &[u8], context: &SerializationContext) -> Result<Value> {
    let (header, body) = Header::parse(bytes)?;
    if !context.accepts_encoding(header.encoding) {
        return Err(SerializationError::UnsupportedEncoding {
            encoding: header.encoding.to_string(),
        });
    }
    let body = decode_body(header.encoding, body, factory.config().max_message_size)?;
    let mut cursor = Cursor::new(&body);
    let schema = RemoteSchema::new(read_schema(&mut cursor)?)?;

    let mut input = Input {
        factory,
        schema: &schema,
        objects: Vec::new(),
        depth: 0,
        synthesis: context.type_synthesis(),
    };
    let root = input.read_value(&mut cursor, &TypeRef::Any)?;
    if !cursor.is_eof() {
        return Err(SerializationError::malformed(format!(
            "{} trailing bytes after the root value",
            cursor.remaining()
        )));
    }
    log::debug!(
        "[input] decoded {} objects over {} notations",
        input.objects.len(),
        schema.len()
    );
    Ok(root)
}

/// Header and validated schema section of a message, without its data.
pub fn read_schema_section(bytes: &[u8], max_message_size: usize) -> Result<(Header, RemoteSchema)> {
    let (header, body) = Header::parse(bytes)?;
    let body = decode_body(header.encoding, body, max_message_size)?;
    let mut cursor = Cursor::new(&body);
    let schema = RemoteSchema::new(read_schema(&mut cursor)?)?;
    Ok((header, schema))
}

struct Input<'a> {
    factory: &'a SerializerFactory,
    schema: &'a RemoteSchema,
    /// Reference table; `None` while the object is being read.
    objects: Vec<Option<ObjectRef>>,
    depth: usize,
    synthesis: bool,
}

impl Input<'_> {
    fn read_value(&mut self, cursor: &mut Cursor<'_>, declared: &TypeRef) -> Result<Value> {
        let max_depth = self.factory.config().max_depth;
        if self.depth >= max_depth {
            return Err(SerializationError::malformed(format!(
                "nesting deeper than {}",
                max_depth
            )));
        }
        self.depth += 1;
        let value = self.read_tagged(cursor, declared);
        self.depth -= 1;
        value
    }

    fn read_tagged(&mut self, cursor: &mut Cursor<'_>, declared: &TypeRef) -> Result<Value> {
        let offset = cursor.offset();
        let tag = cursor.read_u8()?;
        if !tag_fits(tag, declared) {
            return Err(SerializationError::malformed(format!(
                "tag {:#04x} at offset {} does not match declared type {}",
                tag, offset, declared
            )));
        }
        let value = match tag {
            tags::NULL => Value::Null,
            tags::BOOL => Value::Bool(cursor.read_bool()?),
            tags::INT => Value::Int(cursor.read_i32_le()?),
            tags::LONG => Value::Long(cursor.read_i64_le()?),
            tags::DOUBLE => Value::Double(cursor.read_f64_le()?),
            tags::STRING => Value::String(cursor.read_str()?.to_string()),
            tags::BINARY => Value::Binary(cursor.read_blob()?.to_vec()),
            tags::LIST => {
                let element = match declared {
                    TypeRef::List(element) => element.as_ref().clone(),
                    _ => TypeRef::Any,
                };
                let len = self.collection_len(cursor, 1)?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.read_value(cursor, &element)?);
                }
                Value::List(items)
            }
            tags::MAP => {
                let (key_type, value_type) = match declared {
                    TypeRef::Map(k, v) => (k.as_ref().clone(), v.as_ref().clone()),
                    _ => (TypeRef::Any, TypeRef::Any),
                };
                let len = self.collection_len(cursor, 2)?;
                let mut entries = Vec::with_capacity(len);
                for _ in 0..len {
                    let key = self.read_value(cursor, &key_type)?;
                    let value = self.read_value(cursor, &value_type)?;
                    entries.push((key, value));
                }
                Value::Map(entries)
            }
            tags::ENUM => self.read_enum(cursor, declared)?,
            tags::OBJECT => self.read_object(cursor)?,
            tags::REFERENCE => self.read_reference(cursor)?,
            tags::CUSTOM => self.read_custom(cursor)?,
            other => {
                return Err(SerializationError::malformed(format!(
                    "unknown value tag {:#04x} at offset {}",
                    other, offset
                )))
            }
        };
        Ok(value)
    }

    fn collection_len(&self, cursor: &mut Cursor<'_>, min_element_size: usize) -> Result<usize> {
        let len = cursor.read_len(min_element_size)?;
        let limit = self.factory.config().max_collection_len;
        if len > limit {
            return Err(SerializationError::malformed(format!(
                "collection of {} elements exceeds limit {}",
                len, limit
            )));
        }
        Ok(len)
    }

    fn notation(&self, cursor: &mut Cursor<'_>) -> Result<Arc<TypeNotation>> {
        let index = cursor.read_u32_le()?;
        self.schema.at(index).map(Arc::clone)
    }

    fn resolve(&self, notation: &Arc<TypeNotation>) -> Result<Arc<DecodeStrategy>> {
        if !self.synthesis && !self.factory.resolves_locally(notation.name()) {
            return Err(SerializationError::unknown(
                notation.name(),
                "no local type and type synthesis is disabled for this context",
            ));
        }
        self.factory.reader_for(self.schema, notation)
    }

    fn reserve(&mut self) -> usize {
        self.objects.push(None);
        self.objects.len() - 1
    }

    fn read_enum(&mut self, cursor: &mut Cursor<'_>, declared: &TypeRef) -> Result<Value> {
        let notation = self.notation(cursor)?;
        let choices = match notation.as_restricted() {
            Some(r) if r.kind == RestrictedKind::Enum => &r.choices,
            _ => {
                return Err(SerializationError::malformed(format!(
                    "ENUM value described by non-enum notation {}",
                    notation.name()
                )))
            }
        };
        if let TypeRef::Named(name) = declared {
            if name.as_ref() != notation.name() {
                return Err(SerializationError::malformed(format!(
                    "enum {} where {} is declared",
                    notation.name(),
                    name
                )));
            }
        }
        let constant = cursor.read_str()?;
        if !choices.iter().any(|c| c == constant) {
            return Err(SerializationError::malformed(format!(
                "constant `{}` is not listed by {}",
                constant,
                notation.name()
            )));
        }

        match self.resolve(&notation)?.as_ref() {
            DecodeStrategy::Enum(registration) => Ok(Value::enum_constant(
                registration.name(),
                registration.resolve(constant)?,
            )),
            DecodeStrategy::SyntheticEnum(synthetic) => {
                Ok(Value::enum_constant(synthetic.name(), constant))
            }
            other => Err(SerializationError::malformed(format!(
                "enum {} resolved to a {} strategy",
                notation.name(),
                other.label()
            ))),
        }
    }

    fn read_object(&mut self, cursor: &mut Cursor<'_>) -> Result<Value> {
        let notation = self.notation(cursor)?;
        let Some(composite) = notation.as_composite() else {
            return Err(SerializationError::malformed(format!(
                "OBJECT value described by restricted notation {}",
                notation.name()
            )));
        };
        if self.schema.is_interface(notation.name()) {
            return Err(SerializationError::malformed(format!(
                "abstract type {} sent as an instance",
                notation.name()
            )));
        }
        let count = cursor.read_u32_le()? as usize;
        if count != composite.fields.len() {
            return Err(SerializationError::malformed(format!(
                "{} carries {} values but its notation declares {} fields",
                notation.name(),
                count,
                composite.fields.len()
            )));
        }

        let strategy = self.resolve(&notation)?;
        let slot = self.reserve();
        let mut values = Vec::with_capacity(count);
        for field in &composite.fields {
            let value = self.read_value(cursor, &field.type_ref)?;
            if value.is_null() && field.mandatory {
                return Err(SerializationError::malformed(format!(
                    "null for mandatory field {}.{}",
                    notation.name(),
                    field.name
                )));
            }
            values.push(value);
        }

        let object = match strategy.as_ref() {
            DecodeStrategy::Object(serializer) => {
                let concrete = serializer.as_concrete()?;
                self.admit(concrete.registration())?;
                concrete.construct(values)?
            }
            DecodeStrategy::Evolution(evolution) => {
                self.admit(evolution.registration())?;
                evolution.construct(values)?
            }
            DecodeStrategy::Synthetic(synthetic) => {
                Arc::new(Record::new(Arc::clone(synthetic), values)?) as ObjectRef
            }
            other => {
                return Err(SerializationError::malformed(format!(
                    "composite {} resolved to a {} strategy",
                    notation.name(),
                    other.label()
                )))
            }
        };
        self.objects[slot] = Some(Arc::clone(&object));
        Ok(Value::Object(object))
    }

    fn read_custom(&mut self, cursor: &mut Cursor<'_>) -> Result<Value> {
        let notation = self.notation(cursor)?;
        let proxy_type = match notation.as_restricted() {
            Some(r) if r.kind == RestrictedKind::Proxy => r.element_types.first().cloned(),
            _ => None,
        }
        .ok_or_else(|| {
            SerializationError::malformed(format!(
                "CUSTOM value described by non-proxy notation {}",
                notation.name()
            ))
        })?;

        let custom = match self.resolve(&notation)?.as_ref() {
            DecodeStrategy::Custom(custom) => Arc::clone(custom),
            other => {
                return Err(SerializationError::malformed(format!(
                    "proxy {} resolved to a {} strategy",
                    notation.name(),
                    other.label()
                )))
            }
        };
        let slot = self.reserve();
        let proxy = self.read_value(cursor, &proxy_type)?;
        admit(
            self.factory.whitelist(),
            AdmissionRequest {
                type_name: notation.name(),
                inherently_safe: false,
                custom_serialized: true,
            },
        )?;
        let object = custom.from_proxy(proxy)?;
        self.objects[slot] = Some(Arc::clone(&object));
        Ok(Value::Object(object))
    }

    fn read_reference(&mut self, cursor: &mut Cursor<'_>) -> Result<Value> {
        let index = cursor.read_u32_le()? as usize;
        match self.objects.get(index) {
            Some(Some(object)) => Ok(Value::Object(Arc::clone(object))),
            Some(None) => Err(SerializationError::malformed(format!(
                "reference to object {} before it is complete",
                index
            ))),
            None => Err(SerializationError::malformed(format!(
                "reference to unknown object {} ({} read so far)",
                index,
                self.objects.len()
            ))),
        }
    }

    fn admit(&self, registration: &TypeRegistration) -> Result<()> {
        admit(
            self.factory.whitelist(),
            AdmissionRequest {
                type_name: registration.name(),
                inherently_safe: registration.is_inherently_safe(),
                custom_serialized: false,
            },
        )
    }
}

/// Whether a value tag may appear where `declared` is expected.
fn tag_fits(tag: u8, declared: &TypeRef) -> bool {
    if tag == tags::NULL {
        return true;
    }
    match declared {
        TypeRef::Any => true,
        TypeRef::Bool => tag == tags::BOOL,
        TypeRef::Int => tag == tags::INT,
        TypeRef::Long => tag == tags::LONG,
        TypeRef::Double => tag == tags::DOUBLE,
        TypeRef::String => tag == tags::STRING,
        TypeRef::Binary => tag == tags::BINARY,
        TypeRef::List(_) => tag == tags::LIST,
        TypeRef::Map(_, _) => tag == tags::MAP,
        TypeRef::Named(_) => matches!(
            tag,
            tags::ENUM | tags::OBJECT | tags::REFERENCE | tags::CUSTOM
        ),
    }
}
