// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Validated schema section of a received message.

use super::notation::{RestrictedKind, TypeNotation};
use crate::error::{Result, SerializationError};
use crate::types::{validate_type_name, Fingerprinter, ShapeSource, TypeIdentifier, TypeShape};
use std::collections::HashMap;
use std::sync::Arc;

/// Remote type information: the notations embedded in one message.
///
/// Construction re-derives every descriptor from the notations themselves,
/// so a schema whose fingerprints do not match its own shapes never reaches
/// the serializers.
#[derive(Debug, Clone)]
pub struct RemoteSchema {
    notations: Vec<Arc<TypeNotation>>,
    by_name: HashMap<Arc<str>, usize>,
}

impl RemoteSchema {
    pub fn new(notations: Vec<TypeNotation>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(notations.len());
        for (index, notation) in notations.iter().enumerate() {
            check_notation(notation)?;
            if by_name
                .insert(Arc::clone(notation.name_arc()), index)
                .is_some()
            {
                return Err(SerializationError::malformed(format!(
                    "type {} described twice",
                    notation.name()
                )));
            }
        }
        let schema = Self {
            notations: notations.into_iter().map(Arc::new).collect(),
            by_name,
        };
        schema.verify_descriptors()?;
        Ok(schema)
    }

    fn verify_descriptors(&self) -> Result<()> {
        let mut printer = Fingerprinter::new(self);
        for notation in &self.notations {
            let computed = match notation.collection_type() {
                Some(collection) => printer.fingerprint_type(&collection)?,
                None => printer.fingerprint(notation.name())?,
            };
            if computed != notation.descriptor() {
                return Err(SerializationError::malformed(format!(
                    "descriptor of {} does not match its shape",
                    notation.name()
                )));
            }
        }
        Ok(())
    }

    /// Fill in every descriptor from the notations' own shapes.
    #[cfg(test)]
    pub(crate) fn seal(notations: Vec<TypeNotation>) -> Vec<TypeNotation> {
        let draft = Self {
            by_name: notations
                .iter()
                .enumerate()
                .map(|(i, n)| (Arc::clone(n.name_arc()), i))
                .collect(),
            notations: notations.iter().cloned().map(Arc::new).collect(),
        };
        let mut printer = Fingerprinter::new(&draft);
        notations
            .into_iter()
            .map(|mut notation| {
                let computed = match notation.collection_type() {
                    Some(t) => printer.fingerprint_type(&t),
                    None => printer.fingerprint(notation.name()),
                };
                if let Ok(fp) = computed {
                    match &mut notation {
                        TypeNotation::Composite(c) => c.descriptor = fp,
                        TypeNotation::Restricted(r) => r.descriptor = fp,
                    }
                }
                notation
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.notations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notations.is_empty()
    }

    pub fn notations(&self) -> &[Arc<TypeNotation>] {
        &self.notations
    }

    /// Notation at a data-section index.
    pub fn at(&self, index: u32) -> Result<&Arc<TypeNotation>> {
        self.notations.get(index as usize).ok_or_else(|| {
            SerializationError::malformed(format!(
                "schema index {} out of range ({} notations)",
                index,
                self.notations.len()
            ))
        })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TypeNotation>> {
        self.by_name.get(name).map(|&i| &self.notations[i])
    }

    pub fn identifier_of(&self, name: &str) -> Option<TypeIdentifier> {
        self.get(name).map(|n| n.identifier())
    }

    /// Composite notations listing `interface` among their interfaces.
    pub fn implementors_of<'s>(&'s self, interface: &'s str) -> impl Iterator<Item = &'s Arc<TypeNotation>> + 's {
        self.notations.iter().filter(move |n| {
            n.as_composite()
                .is_some_and(|c| c.interfaces.iter().any(|i| i.as_ref() == interface))
        })
    }

    /// A notation is abstract when another notation names it as an interface.
    pub fn is_interface(&self, name: &str) -> bool {
        self.implementors_of(name).next().is_some()
    }
}

impl ShapeSource for RemoteSchema {
    fn shape_of(&self, name: &str) -> Option<TypeShape> {
        self.get(name).and_then(|n| n.shape())
    }
}

fn check_notation(notation: &TypeNotation) -> Result<()> {
    let malformed = |reason: &str| {
        SerializationError::malformed(format!("notation {}: {}", notation.name(), reason))
    };
    match notation {
        TypeNotation::Composite(c) => {
            let mut names: Vec<&str> = c.fields.iter().map(|f| f.name.as_ref()).collect();
            names.sort_unstable();
            if names.windows(2).any(|w| w[0] == w[1]) {
                return Err(malformed("duplicate field"));
            }
            if names.iter().any(|n| n.is_empty()) {
                return Err(malformed("empty field name"));
            }
            Ok(())
        }
        TypeNotation::Restricted(r) => {
            let collection_name = notation.collection_type().map(|t| t.to_string());
            match r.kind {
                RestrictedKind::List | RestrictedKind::Map => {
                    match collection_name {
                        Some(canonical) if canonical == r.name.as_ref() => {}
                        Some(_) => return Err(malformed("name does not match element types")),
                        None => return Err(malformed("wrong number of element types")),
                    }
                    if !r.choices.is_empty() {
                        return Err(malformed("collection with choices"));
                    }
                }
                RestrictedKind::Enum => {
                    if !r.element_types.is_empty() || r.choices.is_empty() {
                        return Err(malformed("enum needs choices and no element types"));
                    }
                    let mut choices: Vec<&str> = r.choices.iter().map(String::as_str).collect();
                    choices.sort_unstable();
                    if choices.windows(2).any(|w| w[0] == w[1]) {
                        return Err(malformed("duplicate enum constant"));
                    }
                }
                RestrictedKind::Proxy => {
                    if r.element_types.len() != 1 || !r.choices.is_empty() {
                        return Err(malformed("proxy needs exactly one element type"));
                    }
                }
            }
            if matches!(r.kind, RestrictedKind::Enum | RestrictedKind::Proxy) {
                validate_type_name(&r.name).map_err(|_| malformed("invalid type name"))?;
            }
            Ok(())
        }
    }
}
