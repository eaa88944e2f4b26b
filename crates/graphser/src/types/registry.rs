// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Immutable set of registered types, looked up by name or Rust type.

use crate::error::{Result, SerializationError};
use crate::types::registration::{EnumRegistration, TypeRegistration};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// A registered type.
#[derive(Debug, Clone)]
pub enum RegisteredType {
    Composite(Arc<TypeRegistration>),
    Enum(Arc<EnumRegistration>),
}

impl RegisteredType {
    pub fn name(&self) -> &str {
        match self {
            RegisteredType::Composite(r) => r.name(),
            RegisteredType::Enum(e) => e.name(),
        }
    }
}

impl From<TypeRegistration> for RegisteredType {
    fn from(registration: TypeRegistration) -> Self {
        RegisteredType::Composite(Arc::new(registration))
    }
}

impl From<EnumRegistration> for RegisteredType {
    fn from(registration: EnumRegistration) -> Self {
        RegisteredType::Enum(Arc::new(registration))
    }
}

/// Registered types of one process (or one loaded code scope).
///
/// Built up front, then shared read-only behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<Arc<str>, RegisteredType>,
    by_rust_type: HashMap<TypeId, Arc<str>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a composite or interface.
    pub fn register(&mut self, registration: TypeRegistration) -> Result<()> {
        self.insert(RegisteredType::from(registration))
    }

    pub fn register_enum(&mut self, registration: EnumRegistration) -> Result<()> {
        registration.validate()?;
        self.insert(RegisteredType::from(registration))
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, registration: TypeRegistration) -> Result<Self> {
        self.register(registration)?;
        Ok(self)
    }

    /// Builder-style [`register_enum`](Self::register_enum).
    pub fn with_enum(mut self, registration: EnumRegistration) -> Result<Self> {
        self.register_enum(registration)?;
        Ok(self)
    }

    pub fn insert(&mut self, registered: RegisteredType) -> Result<()> {
        let name: Arc<str> = match &registered {
            RegisteredType::Composite(r) => Arc::clone(r.name_arc()),
            RegisteredType::Enum(e) => Arc::clone(e.name_arc()),
        };
        if self.types.contains_key(&name) {
            return Err(SerializationError::not_serializable(
                name.as_ref(),
                "type registered twice",
            ));
        }
        if let RegisteredType::Composite(registration) = &registered {
            if let Some(rust_type) = registration.rust_type() {
                if let Some(existing) = self.by_rust_type.get(&rust_type) {
                    return Err(SerializationError::not_serializable(
                        name.as_ref(),
                        format!("Rust type already registered as {}", existing),
                    ));
                }
                self.by_rust_type.insert(rust_type, Arc::clone(&name));
            }
        }
        self.types.insert(name, registered);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredType> {
        self.types.get(name)
    }

    pub fn composite(&self, name: &str) -> Option<&Arc<TypeRegistration>> {
        match self.types.get(name) {
            Some(RegisteredType::Composite(r)) => Some(r),
            _ => None,
        }
    }

    pub fn enumeration(&self, name: &str) -> Option<&Arc<EnumRegistration>> {
        match self.types.get(name) {
            Some(RegisteredType::Enum(e)) => Some(e),
            _ => None,
        }
    }

    /// Registered name of a Rust type.
    pub fn name_of(&self, rust_type: TypeId) -> Option<&Arc<str>> {
        self.by_rust_type.get(&rust_type)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|k| k.as_ref())
    }

    /// This registry plus every type of `overlay` not already present.
    ///
    /// Base definitions win; a loaded scope cannot replace a local type.
    pub fn layered(&self, overlay: &TypeRegistry) -> TypeRegistry {
        let mut merged = self.clone();
        for (name, registered) in &overlay.types {
            if merged.types.contains_key(name) {
                log::debug!("[registry] scope type {} shadowed by local definition", name);
                continue;
            }
            if let Err(e) = merged.insert(registered.clone()) {
                log::warn!("[registry] skipping scope type {}: {}", name, e);
            }
        }
        merged
    }
}
