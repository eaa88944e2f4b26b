// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type notations carried in the schema section.

use crate::error::{Result, SerializationError};
use crate::types::{FieldShape, Fingerprint, TypeIdentifier, TypeRef, TypeShape};
use std::fmt;
use std::sync::Arc;

/// Parametrized (non-composite) notation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestrictedKind {
    List,
    Map,
    Enum,
    /// Custom-serialized type; the single element type is the proxy type.
    Proxy,
}

impl RestrictedKind {
    pub const fn to_u8(self) -> u8 {
        match self {
            RestrictedKind::List => 0,
            RestrictedKind::Map => 1,
            RestrictedKind::Enum => 2,
            RestrictedKind::Proxy => 3,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(RestrictedKind::List),
            1 => Ok(RestrictedKind::Map),
            2 => Ok(RestrictedKind::Enum),
            3 => Ok(RestrictedKind::Proxy),
            other => Err(SerializationError::malformed(format!(
                "unknown restricted kind {}",
                other
            ))),
        }
    }
}

impl fmt::Display for RestrictedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RestrictedKind::List => "list",
            RestrictedKind::Map => "map",
            RestrictedKind::Enum => "enum",
            RestrictedKind::Proxy => "proxy",
        };
        f.write_str(label)
    }
}

/// Composite (or interface) notation: ordered fields plus interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeNotation {
    pub name: Arc<str>,
    pub descriptor: Fingerprint,
    pub interfaces: Vec<Arc<str>>,
    pub fields: Vec<FieldShape>,
}

/// Restricted notation: collection, enum or proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictedNotation {
    pub name: Arc<str>,
    pub kind: RestrictedKind,
    pub descriptor: Fingerprint,
    pub element_types: Vec<TypeRef>,
    /// Enum constants; empty for other kinds.
    pub choices: Vec<String>,
}

/// One entry of the schema section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeNotation {
    Composite(CompositeNotation),
    Restricted(RestrictedNotation),
}

impl TypeNotation {
    pub fn name(&self) -> &str {
        match self {
            TypeNotation::Composite(c) => &c.name,
            TypeNotation::Restricted(r) => &r.name,
        }
    }

    pub fn name_arc(&self) -> &Arc<str> {
        match self {
            TypeNotation::Composite(c) => &c.name,
            TypeNotation::Restricted(r) => &r.name,
        }
    }

    pub fn descriptor(&self) -> Fingerprint {
        match self {
            TypeNotation::Composite(c) => c.descriptor,
            TypeNotation::Restricted(r) => r.descriptor,
        }
    }

    pub fn identifier(&self) -> TypeIdentifier {
        TypeIdentifier {
            name: Arc::clone(self.name_arc()),
            fingerprint: self.descriptor(),
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeNotation> {
        match self {
            TypeNotation::Composite(c) => Some(c),
            TypeNotation::Restricted(_) => None,
        }
    }

    pub fn as_restricted(&self) -> Option<&RestrictedNotation> {
        match self {
            TypeNotation::Restricted(r) => Some(r),
            TypeNotation::Composite(_) => None,
        }
    }

    /// Every type this notation mentions (field/element types and interfaces).
    pub fn dependencies(&self) -> Vec<TypeRef> {
        match self {
            TypeNotation::Composite(c) => c
                .fields
                .iter()
                .map(|f| f.type_ref.clone())
                .chain(c.interfaces.iter().map(TypeRef::named))
                .collect(),
            TypeNotation::Restricted(r) => r.element_types.clone(),
        }
    }

    /// Fingerprint input for named notations; `None` for list/map.
    pub fn shape(&self) -> Option<TypeShape> {
        match self {
            TypeNotation::Composite(c) => Some(TypeShape::Composite {
                fields: c.fields.clone(),
                interfaces: c.interfaces.clone(),
            }),
            TypeNotation::Restricted(r) => match r.kind {
                RestrictedKind::Enum => Some(TypeShape::Enum {
                    constants: r.choices.clone(),
                }),
                RestrictedKind::Proxy => r
                    .element_types
                    .first()
                    .map(|proxy| TypeShape::Proxy {
                        proxy: proxy.clone(),
                    }),
                RestrictedKind::List | RestrictedKind::Map => None,
            },
        }
    }

    /// Collection type this restricted notation stands for.
    pub fn collection_type(&self) -> Option<TypeRef> {
        let restricted = self.as_restricted()?;
        match (restricted.kind, restricted.element_types.as_slice()) {
            (RestrictedKind::List, [element]) => Some(TypeRef::list(element.clone())),
            (RestrictedKind::Map, [key, value]) => Some(TypeRef::map(key.clone(), value.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for TypeNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNotation::Composite(c) => {
                write!(f, "composite {}", c.name)?;
                if !c.interfaces.is_empty() {
                    let names: Vec<&str> = c.interfaces.iter().map(|i| i.as_ref()).collect();
                    write!(f, " : {}", names.join(", "))?;
                }
                write!(f, " {{")?;
                for (i, field) in c.fields.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    let optional = if field.mandatory { "" } else { "?" };
                    write!(f, "{}{}: {}{}", sep, field.name, field.type_ref, optional)?;
                }
                write!(f, " }}")
            }
            TypeNotation::Restricted(r) => {
                write!(f, "{} {}", r.kind, r.name)?;
                if !r.choices.is_empty() {
                    write!(f, " [{}]", r.choices.join(", "))?;
                }
                if r.kind == RestrictedKind::Proxy {
                    if let Some(proxy) = r.element_types.first() {
                        write!(f, " as {}", proxy)?;
                    }
                }
                Ok(())
            }
        }
    }
}
