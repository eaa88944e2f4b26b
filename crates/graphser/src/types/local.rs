// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type identity and the local view of a type.

use crate::carpenter::SyntheticType;
use crate::serializer::CustomSerializer;
use crate::types::fingerprint::{Fingerprint, TypeShape};
use crate::types::registration::{EnumRegistration, Reconstruction, TypeRegistration};
use crate::types::TypeRef;
use std::fmt;
use std::sync::Arc;

/// One field of a shape: what fingerprints and notations are made of.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldShape {
    pub name: Arc<str>,
    pub type_ref: TypeRef,
    pub mandatory: bool,
}

impl FieldShape {
    pub fn new(name: impl AsRef<str>, type_ref: TypeRef, mandatory: bool) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            type_ref,
            mandatory,
        }
    }
}

/// Canonical name plus structural fingerprint. Cache and schema key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIdentifier {
    pub name: Arc<str>,
    pub fingerprint: Fingerprint,
}

impl TypeIdentifier {
    pub fn new(name: impl AsRef<str>, fingerprint: Fingerprint) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            fingerprint,
        }
    }
}

impl fmt::Debug for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, &self.fingerprint.to_hex()[..12])
    }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.fingerprint)
    }
}

/// Where a local type comes from.
#[derive(Clone)]
pub enum LocalDefinition {
    /// Registered composite or interface.
    Composite(Arc<TypeRegistration>),
    Enum(Arc<EnumRegistration>),
    /// Claimed by a custom serializer of the active context.
    Custom(Arc<dyn CustomSerializer>),
    /// Synthesized from a received schema.
    Synthetic(Arc<SyntheticType>),
}

/// A property as this process sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalProperty {
    pub shape: FieldShape,
    /// The declared type is handled by a custom serializer.
    pub custom_serialized: bool,
}

impl LocalProperty {
    pub fn nullable(&self) -> bool {
        !self.shape.mandatory
    }
}

/// Local description of a type, built once per factory.
#[derive(Clone)]
pub struct LocalTypeInformation {
    identifier: TypeIdentifier,
    properties: Vec<LocalProperty>,
    interfaces: Vec<Arc<str>>,
    definition: LocalDefinition,
}

impl LocalTypeInformation {
    pub(crate) fn new(
        identifier: TypeIdentifier,
        properties: Vec<LocalProperty>,
        interfaces: Vec<Arc<str>>,
        definition: LocalDefinition,
    ) -> Self {
        Self {
            identifier,
            properties,
            interfaces,
            definition,
        }
    }

    pub fn identifier(&self) -> &TypeIdentifier {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.identifier.name
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.identifier.fingerprint
    }

    /// Properties in canonical order (empty for enums and custom types).
    pub fn properties(&self) -> &[LocalProperty] {
        &self.properties
    }

    pub fn field_shapes(&self) -> Vec<FieldShape> {
        self.properties.iter().map(|p| p.shape.clone()).collect()
    }

    pub fn interfaces(&self) -> &[Arc<str>] {
        &self.interfaces
    }

    pub fn definition(&self) -> &LocalDefinition {
        &self.definition
    }

    pub fn is_interface(&self) -> bool {
        match &self.definition {
            LocalDefinition::Composite(registration) => registration.is_interface(),
            LocalDefinition::Synthetic(synthetic) => synthetic.is_interface(),
            LocalDefinition::Enum(_) | LocalDefinition::Custom(_) => false,
        }
    }

    pub fn reconstruction(&self) -> Option<&Reconstruction> {
        match &self.definition {
            LocalDefinition::Composite(registration) => registration.reconstruction(),
            _ => None,
        }
    }

    /// Shape fed to the fingerprinter.
    pub fn shape(&self) -> TypeShape {
        match &self.definition {
            LocalDefinition::Enum(registration) => TypeShape::Enum {
                constants: registration.constants().to_vec(),
            },
            LocalDefinition::Custom(custom) => TypeShape::Proxy {
                proxy: custom.proxy_type(),
            },
            LocalDefinition::Synthetic(synthetic) => synthetic.shape(),
            LocalDefinition::Composite(_) => TypeShape::Composite {
                fields: self.field_shapes(),
                interfaces: self.interfaces.clone(),
            },
        }
    }
}

impl fmt::Debug for LocalTypeInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.definition {
            LocalDefinition::Composite(r) if r.is_interface() => "interface",
            LocalDefinition::Composite(_) => "composite",
            LocalDefinition::Enum(_) => "enum",
            LocalDefinition::Custom(_) => "custom",
            LocalDefinition::Synthetic(_) => "synthetic",
        };
        f.debug_struct("LocalTypeInformation")
            .field("identifier", &self.identifier)
            .field("kind", &kind)
            .field("properties", &self.properties)
            .field("interfaces", &self.interfaces)
            .finish()
    }
}
