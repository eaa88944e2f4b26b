// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Custom (proxy) serializers.
//!
//! A custom serializer replaces a type's property walk with a conversion to
//! and from a proxy value of a declared proxy type. It is written as a
//! restricted `proxy` notation and admits its type for construction.

use crate::error::{Result, SerializationError};
use crate::types::{ObjectRef, TypeRef, Value};
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

pub trait CustomSerializer: Send + Sync {
    /// Wire name of the handled type.
    fn type_name(&self) -> &str;

    fn rust_type(&self) -> TypeId;

    /// Declared type of the proxy value.
    fn proxy_type(&self) -> TypeRef;

    fn to_proxy(&self, object: &dyn Any) -> Result<Value>;

    fn from_proxy(&self, proxy: Value) -> Result<ObjectRef>;
}

impl fmt::Debug for dyn CustomSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomSerializer({} as {})", self.type_name(), self.proxy_type())
    }
}

/// Closure-backed [`CustomSerializer`] for a Rust type `T`.
///
/// ```ignore
/// let uuid = ProxySerializer::new("acme.Uuid", TypeRef::String,
///     |id: &Uuid| Value::from(id.to_string()),
///     |v| Uuid::parse(&String::from_value(v)?));
/// ```
pub struct ProxySerializer<T, To, Back> {
    type_name: Arc<str>,
    proxy_type: TypeRef,
    to: To,
    from: Back,
    _marker: PhantomData<fn() -> T>,
}

impl<T, To, Back> ProxySerializer<T, To, Back>
where
    T: Any + Send + Sync,
    To: Fn(&T) -> Value + Send + Sync,
    Back: Fn(Value) -> Result<T> + Send + Sync,
{
    pub fn new(type_name: impl AsRef<str>, proxy_type: TypeRef, to: To, from: Back) -> Self {
        Self {
            type_name: Arc::from(type_name.as_ref()),
            proxy_type,
            to,
            from,
            _marker: PhantomData,
        }
    }
}

impl<T, To, Back> CustomSerializer for ProxySerializer<T, To, Back>
where
    T: Any + Send + Sync,
    To: Fn(&T) -> Value + Send + Sync,
    Back: Fn(Value) -> Result<T> + Send + Sync,
{
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn rust_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn proxy_type(&self) -> TypeRef {
        self.proxy_type.clone()
    }

    fn to_proxy(&self, object: &dyn Any) -> Result<Value> {
        object.downcast_ref::<T>().map(&self.to).ok_or_else(|| {
            SerializationError::not_serializable(
                self.type_name.as_ref(),
                "proxy conversion invoked on a foreign instance",
            )
        })
    }

    fn from_proxy(&self, proxy: Value) -> Result<ObjectRef> {
        (self.from)(proxy).map(|instance| Arc::new(instance) as ObjectRef)
    }
}
