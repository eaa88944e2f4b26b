// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type object serializers.
//!
//! A concrete serializer pairs the canonical property list with the
//! registration's accessor closures and reconstruction strategy. An abstract
//! serializer exists for interfaces: it only carries the notation written to
//! the schema section and refuses to construct anything.

use crate::error::{Result, SerializationError};
use crate::schema::TypeNotation;
use crate::types::registration::{Getter, Setter};
use crate::types::{
    ConstructorArgs, LocalDefinition, LocalTypeInformation, ObjectRef, Reconstruction,
    TypeRegistration, TypeRef, Value,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// One property with its bound reader and (setter types only) writer.
#[derive(Clone)]
pub struct PropertyAccessor {
    pub name: Arc<str>,
    pub type_ref: TypeRef,
    pub nullable: bool,
    getter: Getter,
    setter: Option<Setter>,
}

impl PropertyAccessor {
    pub fn read(&self, object: &dyn Any) -> Result<Value> {
        (self.getter)(object)
    }
}

impl fmt::Debug for PropertyAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}{}", self.name, self.type_ref, if self.nullable { "?" } else { "" })
    }
}

/// Serializer of an instantiable registered type.
pub struct ConcreteSerializer {
    info: Arc<LocalTypeInformation>,
    registration: Arc<TypeRegistration>,
    accessors: Vec<PropertyAccessor>,
    notation: Arc<TypeNotation>,
}

/// Serializer of an interface; encode-side metadata only.
pub struct AbstractSerializer {
    info: Arc<LocalTypeInformation>,
    notation: Arc<TypeNotation>,
}

pub enum ObjectSerializer {
    Concrete(ConcreteSerializer),
    Abstract(AbstractSerializer),
}

impl ObjectSerializer {
    /// Bind a registered composite's accessors; `notation` is its schema entry.
    pub fn new(info: Arc<LocalTypeInformation>, notation: Arc<TypeNotation>) -> Result<Self> {
        let registration = match info.definition() {
            LocalDefinition::Composite(registration) => Arc::clone(registration),
            _ => {
                return Err(SerializationError::not_serializable(
                    info.name(),
                    "not a registered composite type",
                ))
            }
        };
        if registration.is_interface() {
            return Ok(ObjectSerializer::Abstract(AbstractSerializer { info, notation }));
        }

        let mut accessors = Vec::with_capacity(registration.properties().len());
        for property in registration.properties() {
            let getter = property.getter.clone().ok_or_else(|| {
                SerializationError::not_serializable(
                    registration.name(),
                    format!("property `{}` has no getter", property.name),
                )
            })?;
            accessors.push(PropertyAccessor {
                name: Arc::clone(&property.name),
                type_ref: property.type_ref.clone(),
                nullable: property.nullable,
                getter,
                setter: property.setter.clone(),
            });
        }
        Ok(ObjectSerializer::Concrete(ConcreteSerializer {
            info,
            registration,
            accessors,
            notation,
        }))
    }

    pub fn name(&self) -> &str {
        self.info().name()
    }

    pub fn info(&self) -> &Arc<LocalTypeInformation> {
        match self {
            ObjectSerializer::Concrete(c) => &c.info,
            ObjectSerializer::Abstract(a) => &a.info,
        }
    }

    pub fn notation(&self) -> &Arc<TypeNotation> {
        match self {
            ObjectSerializer::Concrete(c) => &c.notation,
            ObjectSerializer::Abstract(a) => &a.notation,
        }
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, ObjectSerializer::Abstract(_))
    }

    pub fn as_concrete(&self) -> Result<&ConcreteSerializer> {
        match self {
            ObjectSerializer::Concrete(c) => Ok(c),
            ObjectSerializer::Abstract(a) => Err(SerializationError::not_serializable(
                a.info.name(),
                "abstract type cannot be instantiated",
            )),
        }
    }
}

impl ConcreteSerializer {
    pub fn registration(&self) -> &Arc<TypeRegistration> {
        &self.registration
    }

    pub fn accessors(&self) -> &[PropertyAccessor] {
        &self.accessors
    }

    /// Property values of `object` in canonical order.
    pub fn read_properties(&self, object: &dyn Any) -> Result<Vec<Value>> {
        self.accessors.iter().map(|a| a.read(object)).collect()
    }

    /// Rebuild an instance from values in canonical order.
    ///
    /// Callers run admission first; this only invokes the constructor.
    pub fn construct(&self, values: Vec<Value>) -> Result<ObjectRef> {
        let name = self.registration.name();
        if values.len() != self.accessors.len() {
            return Err(SerializationError::malformed(format!(
                "{} expects {} values, stream holds {}",
                name,
                self.accessors.len(),
                values.len()
            )));
        }
        match self.registration.reconstruction() {
            Some(Reconstruction::ByOrderedConstructorArgs { primary, .. }) => {
                if primary.params.len() != values.len() {
                    return Err(SerializationError::not_serializable(
                        name,
                        format!(
                            "constructor takes {} parameters for {} properties",
                            primary.params.len(),
                            values.len()
                        ),
                    ));
                }
                let args = primary.params.iter().cloned().zip(values).collect();
                let mut args = ConstructorArgs::new(Arc::clone(self.registration.name_arc()), args);
                (primary.invoke)(&mut args)
            }
            Some(Reconstruction::ByEmptyConstructorThenSetters { create }) => {
                let mut instance = create();
                for (accessor, value) in self.accessors.iter().zip(values) {
                    let setter = accessor.setter.as_ref().ok_or_else(|| {
                        SerializationError::not_serializable(
                            name,
                            format!("property `{}` has no setter", accessor.name),
                        )
                    })?;
                    setter(&mut *instance, value)?;
                }
                Ok(Arc::from(instance))
            }
            None => Err(SerializationError::not_serializable(
                name,
                "abstract type cannot be instantiated",
            )),
        }
    }
}

impl fmt::Debug for ObjectSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectSerializer::Concrete(c) => f
                .debug_struct("ConcreteSerializer")
                .field("type", c.info.identifier())
                .field("accessors", &c.accessors)
                .finish(),
            ObjectSerializer::Abstract(a) => f
                .debug_struct("AbstractSerializer")
                .field("type", a.info.identifier())
                .finish(),
        }
    }
}
