// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encoder: object graph to `header + schema + data`.
//!
//! The data section is written first into its own buffer while the schema
//! section collects one notation per type the graph touches; both are then
//! framed behind the header. Composite instances are numbered in pre-order,
//! and a shared instance already written becomes a REFERENCE.

use crate::config::{tags, HEADER_LEN};
use crate::error::{Result, SerializationError};
use crate::schema::{write_schema, RestrictedKind, TypeNotation};
use crate::serializer::factory::SerializerFactory;
use crate::types::{ObjectRef, Record, ShapeSource, TypeRef, Value};
use crate::wire::{encode_body, Encoding, Header, Writer};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Root of an encode call.
#[derive(Clone, Copy)]
pub enum Root<'a> {
    /// A native instance (or [`Record`]) owned by the caller.
    Object(&'a (dyn Any + Send + Sync)),
    /// Any dynamic value.
    Value(&'a Value),
}

/// Encode `root` with `factory`, framing the body with `encoding`.
pub fn encode(factory: &SerializerFactory, root: Root<'_>, encoding: Encoding) -> Result<Vec<u8>> {
    let mut output = Output::new(factory);
    match root {
        Root::Object(object) => output.write_object(object, None)?,
        Root::Value(value) => output.write_value(value, &TypeRef::Any)?,
    }

    let mut body = Writer::with_capacity(output.data.len() + 64 * output.schema.len());
    write_schema(&mut body, &output.schema)?;
    body.write_bytes(output.data.as_bytes());
    log::debug!(
        "[output] {} notations, {} objects, {} data bytes",
        output.schema.len(),
        output.next_object,
        output.data.len()
    );

    let encoded = encode_body(encoding, body.into_bytes())?;
    let mut message = Vec::with_capacity(HEADER_LEN + encoded.len());
    message.extend_from_slice(&Header::current(encoding).to_bytes());
    message.extend_from_slice(&encoded);
    Ok(message)
}

#[derive(Clone, Copy)]
enum Written {
    InProgress,
    Done(u32),
}

struct Output<'f> {
    factory: &'f SerializerFactory,
    schema: Vec<Arc<TypeNotation>>,
    indices: HashMap<Arc<str>, u32>,
    objects: HashMap<usize, Written>,
    /// Holds every identity-tracked instance so its address is not reused.
    keepalive: Vec<ObjectRef>,
    next_object: u32,
    data: Writer,
    depth: usize,
}

impl<'f> Output<'f> {
    fn new(factory: &'f SerializerFactory) -> Self {
        Self {
            factory,
            schema: Vec::new(),
            indices: HashMap::new(),
            objects: HashMap::new(),
            keepalive: Vec::new(),
            next_object: 0,
            data: Writer::new(),
            depth: 0,
        }
    }

    // ========================================================================
    // Schema section
    // ========================================================================

    fn notation_index(&mut self, name: &str) -> Result<u32> {
        if let Some(&index) = self.indices.get(name) {
            return Ok(index);
        }
        let notation = self.factory.notation_for(name)?;
        self.push_notation(notation)
    }

    fn push_notation(&mut self, notation: Arc<TypeNotation>) -> Result<u32> {
        let index = u32::try_from(self.schema.len())
            .map_err(|_| SerializationError::not_serializable(notation.name(), "schema too large"))?;
        self.indices.insert(Arc::clone(notation.name_arc()), index);
        self.schema.push(Arc::clone(&notation));
        for dependency in notation.dependencies() {
            self.describe(&dependency)?;
        }
        Ok(index)
    }

    /// Make sure the schema describes `type_ref`; unknown names are skipped.
    fn describe(&mut self, type_ref: &TypeRef) -> Result<()> {
        match type_ref {
            TypeRef::Named(name) => {
                if !self.indices.contains_key(name) && self.factory.shape_of(name).is_some() {
                    self.notation_index(name)?;
                }
            }
            TypeRef::List(_) | TypeRef::Map(_, _) => {
                if !self.indices.contains_key(type_ref.to_string().as_str()) {
                    let notation = self.factory.collection_notation(type_ref)?;
                    self.push_notation(notation)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    // ========================================================================
    // Data section
    // ========================================================================

    fn write_value(&mut self, value: &Value, declared: &TypeRef) -> Result<()> {
        check_declared(value, declared)?;
        self.describe(declared)?;
        match value {
            Value::Null => self.data.write_u8(tags::NULL),
            Value::Bool(v) => {
                self.data.write_u8(tags::BOOL);
                self.data.write_bool(*v);
            }
            Value::Int(v) => {
                self.data.write_u8(tags::INT);
                self.data.write_i32_le(*v);
            }
            Value::Long(v) => {
                self.data.write_u8(tags::LONG);
                self.data.write_i64_le(*v);
            }
            Value::Double(v) => {
                self.data.write_u8(tags::DOUBLE);
                self.data.write_f64_le(*v);
            }
            Value::String(v) => {
                self.data.write_u8(tags::STRING);
                self.data.write_str(v)?;
            }
            Value::Binary(v) => {
                self.data.write_u8(tags::BINARY);
                self.data.write_blob(v)?;
            }
            Value::List(items) => {
                let element = match declared {
                    TypeRef::List(element) => element.as_ref().clone(),
                    _ => TypeRef::Any,
                };
                self.data.write_u8(tags::LIST);
                self.data.write_len(items.len())?;
                self.nested(|out| {
                    for item in items {
                        out.write_value(item, &element)?;
                    }
                    Ok(())
                })?;
            }
            Value::Map(entries) => {
                let (key_type, value_type) = match declared {
                    TypeRef::Map(k, v) => (k.as_ref().clone(), v.as_ref().clone()),
                    _ => (TypeRef::Any, TypeRef::Any),
                };
                self.data.write_u8(tags::MAP);
                self.data.write_len(entries.len())?;
                self.nested(|out| {
                    for (key, value) in entries {
                        out.write_value(key, &key_type)?;
                        out.write_value(value, &value_type)?;
                    }
                    Ok(())
                })?;
            }
            Value::Enum {
                type_name,
                constant,
            } => {
                let index = self.notation_index(type_name)?;
                let known = self.schema[index as usize]
                    .as_restricted()
                    .filter(|r| r.kind == RestrictedKind::Enum)
                    .map(|r| r.choices.iter().any(|c| c == constant));
                match known {
                    Some(true) => {}
                    Some(false) => {
                        return Err(SerializationError::not_serializable(
                            type_name.as_ref(),
                            format!("unknown enum constant `{}`", constant),
                        ))
                    }
                    None => {
                        return Err(SerializationError::not_serializable(
                            type_name.as_ref(),
                            "not an enum type",
                        ))
                    }
                }
                self.data.write_u8(tags::ENUM);
                self.data.write_u32_le(index);
                self.data.write_str(constant)?;
            }
            Value::Object(object) => {
                if let TypeRef::Named(declared_name) = declared {
                    let runtime = self.factory.type_name_of(&**object)?;
                    if !self.factory.is_assignable(&runtime, declared_name) {
                        return Err(SerializationError::not_serializable(
                            runtime.as_ref(),
                            format!("not assignable to declared type {}", declared_name),
                        ));
                    }
                }
                self.write_object(&**object, Some(object))?;
            }
        }
        Ok(())
    }

    fn nested<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        if self.depth >= self.factory.config().max_depth {
            return Err(SerializationError::not_serializable(
                "graph",
                format!("nesting deeper than {}", self.factory.config().max_depth),
            ));
        }
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        result
    }

    /// OBJECT, CUSTOM or REFERENCE for one instance.
    ///
    /// `shared` carries the `Arc` when the instance has an identity worth
    /// tracking; the root passed by reference does not.
    fn write_object(&mut self, object: &(dyn Any + Send + Sync), shared: Option<&ObjectRef>) -> Result<()> {
        let identity = shared.map(Value::identity);
        if let Some(id) = identity {
            match self.objects.get(&id) {
                Some(Written::Done(index)) => {
                    let index = *index;
                    self.data.write_u8(tags::REFERENCE);
                    self.data.write_u32_le(index);
                    return Ok(());
                }
                Some(Written::InProgress) => {
                    let name = self.factory.type_name_of(object)?;
                    return Err(SerializationError::not_serializable(
                        name.as_ref(),
                        "instance reachable from itself",
                    ));
                }
                None => {}
            }
        }

        let index = self.next_object;
        self.next_object = index.checked_add(1).ok_or_else(|| {
            SerializationError::not_serializable("graph", "too many objects")
        })?;
        if let (Some(id), Some(arc)) = (identity, shared) {
            self.objects.insert(id, Written::InProgress);
            self.keepalive.push(Arc::clone(arc));
        }

        let name = self.factory.type_name_of(object)?;
        if let Some(record) = object.downcast_ref::<Record>() {
            self.write_record(record)?;
        } else if let Some(custom) = self.factory.custom(&name).cloned() {
            let schema_index = self.notation_index(&name)?;
            let proxy = custom.to_proxy(object)?;
            self.data.write_u8(tags::CUSTOM);
            self.data.write_u32_le(schema_index);
            let proxy_type = custom.proxy_type();
            self.nested(|out| out.write_value(&proxy, &proxy_type))?;
        } else {
            let serializer = self.factory.serializer_for(&name)?;
            let concrete = serializer.as_concrete()?;
            let values = concrete.read_properties(object)?;
            let schema_index = self.notation_index(&name)?;
            self.data.write_u8(tags::OBJECT);
            self.data.write_u32_le(schema_index);
            self.data.write_len(values.len())?;
            let accessors = concrete.accessors();
            self.nested(|out| {
                for (accessor, value) in accessors.iter().zip(&values) {
                    if value.is_null() && !accessor.nullable {
                        return Err(SerializationError::not_serializable(
                            name.as_ref(),
                            format!("mandatory property `{}` is null", accessor.name),
                        ));
                    }
                    out.write_value(value, &accessor.type_ref)?;
                }
                Ok(())
            })?;
        }

        if let Some(id) = identity {
            self.objects.insert(id, Written::Done(index));
        }
        Ok(())
    }

    fn write_record(&mut self, record: &Record) -> Result<()> {
        let schema_index = self.notation_index(record.type_name())?;
        let fields = match self.schema[schema_index as usize].as_composite() {
            Some(composite) if composite.fields == record.synthetic_type().fields() => {
                composite.fields.clone()
            }
            _ => {
                return Err(SerializationError::not_serializable(
                    record.type_name(),
                    "record shape differs from the synthesized type",
                ))
            }
        };
        self.data.write_u8(tags::OBJECT);
        self.data.write_u32_le(schema_index);
        self.data.write_len(fields.len())?;
        self.nested(|out| {
            for (field, value) in fields.iter().zip(record.values()) {
                if value.is_null() && field.mandatory {
                    return Err(SerializationError::not_serializable(
                        record.type_name(),
                        format!("mandatory field `{}` is null", field.name),
                    ));
                }
                out.write_value(value, &field.type_ref)?;
            }
            Ok(())
        })
    }
}

/// Reject values whose kind cannot match the declared type.
fn check_declared(value: &Value, declared: &TypeRef) -> Result<()> {
    let fits = match (value, declared) {
        (Value::Null, _) | (_, TypeRef::Any) => true,
        (Value::Bool(_), TypeRef::Bool)
        | (Value::Int(_), TypeRef::Int)
        | (Value::Long(_), TypeRef::Long)
        | (Value::Double(_), TypeRef::Double)
        | (Value::String(_), TypeRef::String)
        | (Value::Binary(_), TypeRef::Binary)
        | (Value::List(_), TypeRef::List(_))
        | (Value::Map(_), TypeRef::Map(_, _))
        | (Value::Object(_), TypeRef::Named(_)) => true,
        (Value::Enum { type_name, .. }, TypeRef::Named(name)) => type_name == name,
        _ => false,
    };
    if fits {
        Ok(())
    } else {
        Err(SerializationError::not_serializable(
            declared.to_string(),
            format!("{} value does not match the declared type", value.kind()),
        ))
    }
}
