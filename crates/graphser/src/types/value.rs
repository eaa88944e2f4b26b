// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values flowing through property accessors and constructors.

use crate::error::{Result, SerializationError};
use crate::types::record::Record;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Shared, type-erased object instance (native type or [`Record`]).
pub type ObjectRef = Arc<dyn Any + Send + Sync>;

/// A dynamic value that can hold any property value of the object graph.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    List(Vec<Value>),
    /// Ordered key/value pairs.
    Map(Vec<(Value, Value)>),
    Enum {
        type_name: Arc<str>,
        constant: String,
    },
    /// Composite instance; identity (`Arc` pointer) drives back-references.
    Object(ObjectRef),
}

impl Value {
    /// Wrap a native instance.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Value::Object(Arc::new(value))
    }

    /// Wrap an already shared native instance, keeping its identity.
    pub fn shared<T: Any + Send + Sync>(value: &Arc<T>) -> Self {
        let object: ObjectRef = Arc::clone(value) as ObjectRef;
        Value::Object(object)
    }

    pub fn enum_constant(type_name: impl AsRef<str>, constant: impl Into<String>) -> Self {
        Value::Enum {
            type_name: Arc::from(type_name.as_ref()),
            constant: constant.into(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Enum { .. } => "enum",
            Value::Object(_) => "object",
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Constant name of an enum value.
    pub fn as_enum_constant(&self) -> Option<&str> {
        match self {
            Value::Enum { constant, .. } => Some(constant),
            _ => None,
        }
    }

    /// Borrow a synthesized record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Object(object) => object.downcast_ref::<Record>(),
            _ => None,
        }
    }

    /// Downcast a native object.
    pub fn downcast_object<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Value::Object(object) => Arc::clone(object).downcast::<T>().ok(),
            _ => None,
        }
    }

    pub(crate) fn identity(object: &ObjectRef) -> usize {
        Arc::as_ptr(object) as *const () as usize
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::Long(v) => write!(f, "Long({})", v),
            Value::Double(v) => write!(f, "Double({})", v),
            Value::String(v) => write!(f, "String({:?})", v),
            Value::Binary(v) => write!(f, "Binary({} bytes)", v.len()),
            Value::List(v) => f.debug_tuple("List").field(v).finish(),
            Value::Map(v) => f.debug_tuple("Map").field(v).finish(),
            Value::Enum {
                type_name,
                constant,
            } => write!(f, "Enum({}::{})", type_name, constant),
            Value::Object(object) => match object.downcast_ref::<Record>() {
                Some(record) => fmt::Debug::fmt(record, f),
                None => write!(f, "Object({:#x})", Value::identity(object)),
            },
        }
    }
}

impl PartialEq for Value {
    /// Records compare structurally, native objects by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (
                Value::Enum {
                    type_name: ta,
                    constant: ca,
                },
                Value::Enum {
                    type_name: tb,
                    constant: cb,
                },
            ) => ta == tb && ca == cb,
            (Value::Object(a), Value::Object(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                match (a.downcast_ref::<Record>(), b.downcast_ref::<Record>()) {
                    (Some(ra), Some(rb)) => ra == rb,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

// ============================================================================
// Conversions into Value
// ============================================================================

macro_rules! impl_from_primitive {
    ($type:ty, $variant:ident) => {
        impl From<$type> for Value {
            fn from(v: $type) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_from_primitive!(bool, Bool);
impl_from_primitive!(i32, Int);
impl_from_primitive!(i64, Long);
impl_from_primitive!(f64, Double);
impl_from_primitive!(String, String);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<Value>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(v: BTreeMap<K, V>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<T: Any + Send + Sync> From<Arc<T>> for Value {
    fn from(v: Arc<T>) -> Self {
        Value::shared(&v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::object(v)
    }
}

// ============================================================================
// Conversions out of Value
// ============================================================================

/// Conversion used by constructors and setters to pull typed arguments.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn conversion_error(expected: &str, value: &Value) -> SerializationError {
    SerializationError::malformed(format!("expected {}, found {}", expected, value.kind()))
}

macro_rules! impl_from_value {
    ($type:ty, $variant:ident, $label:expr) => {
        impl FromValue for $type {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(conversion_error($label, &other)),
                }
            }
        }
    };
}

impl_from_value!(bool, Bool, "bool");
impl_from_value!(i32, Int, "int");
impl_from_value!(i64, Long, "long");
impl_from_value!(f64, Double, "double");
impl_from_value!(String, String, "string");

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(conversion_error("list", &other)),
        }
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(conversion_error("map", &other)),
        }
    }
}

impl<K: FromValue + Eq + Hash, V: FromValue> FromValue for HashMap<K, V> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(conversion_error("map", &other)),
        }
    }
}

impl<T: Any + Send + Sync> FromValue for Arc<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(object) => object.downcast::<T>().map_err(|_| {
                SerializationError::malformed(format!(
                    "object is not a {}",
                    std::any::type_name::<T>()
                ))
            }),
            other => Err(conversion_error("object", &other)),
        }
    }
}

/// Binary payloads convert explicitly to avoid clashing with `Vec<T>`.
pub fn binary_from_value(value: Value) -> Result<Vec<u8>> {
    match value {
        Value::Binary(bytes) => Ok(bytes),
        other => Err(conversion_error("binary", &other)),
    }
}
