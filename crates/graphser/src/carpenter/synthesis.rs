// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Synthetic stand-in types built from remote notations.

use crate::types::{FieldShape, TypeIdentifier, TypeShape};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticKind {
    /// Instantiated as a [`crate::types::Record`].
    Record,
    /// Abstract; only names a property shape.
    Interface,
    /// Constants pass through as [`crate::types::Value::Enum`].
    Enum,
}

/// Minimal structural type exposing exactly the remote fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticType {
    identifier: TypeIdentifier,
    kind: SyntheticKind,
    fields: Vec<FieldShape>,
    interfaces: Vec<Arc<str>>,
    constants: Vec<String>,
}

impl SyntheticType {
    pub fn record(identifier: TypeIdentifier, fields: Vec<FieldShape>, interfaces: Vec<Arc<str>>) -> Self {
        Self {
            identifier,
            kind: SyntheticKind::Record,
            fields,
            interfaces,
            constants: Vec::new(),
        }
    }

    pub fn interface(
        identifier: TypeIdentifier,
        fields: Vec<FieldShape>,
        interfaces: Vec<Arc<str>>,
    ) -> Self {
        Self {
            kind: SyntheticKind::Interface,
            ..Self::record(identifier, fields, interfaces)
        }
    }

    pub fn enumeration(identifier: TypeIdentifier, constants: Vec<String>) -> Self {
        Self {
            identifier,
            kind: SyntheticKind::Enum,
            fields: Vec::new(),
            interfaces: Vec::new(),
            constants,
        }
    }

    pub fn name(&self) -> &str {
        &self.identifier.name
    }

    /// Identifier of the notation this type was synthesized from.
    pub fn identifier(&self) -> &TypeIdentifier {
        &self.identifier
    }

    pub fn kind(&self) -> SyntheticKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == SyntheticKind::Interface
    }

    pub fn is_enum(&self) -> bool {
        self.kind == SyntheticKind::Enum
    }

    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }

    /// Interfaces kept after synthesis (unresolvable ones are dropped).
    pub fn interfaces(&self) -> &[Arc<str>] {
        &self.interfaces
    }

    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    pub fn shape(&self) -> TypeShape {
        match self.kind {
            SyntheticKind::Enum => TypeShape::Enum {
                constants: self.constants.clone(),
            },
            SyntheticKind::Record | SyntheticKind::Interface => TypeShape::Composite {
                fields: self.fields.clone(),
                interfaces: self.interfaces.clone(),
            },
        }
    }
}
