// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Decode-only serializers reconciling an older (or newer) remote shape.
//!
//! The remote field list drives reading: every remote field is consumed in
//! order, including fields the local type no longer has, so back-reference
//! numbering and stream position stay intact. The plan then maps remote
//! values onto the chosen local constructor or setters.
//!
//! Constructor choice, in order:
//!
//! 1. the primary constructor, if every parameter has remote data;
//! 2. the highest-versioned historical constructor whose parameters all have
//!    remote data;
//! 3. the primary constructor with nulls for properties the remote shape
//!    lacks, provided every such property is nullable.

use crate::error::{Result, SerializationError};
use crate::schema::CompositeNotation;
use crate::types::registration::{CreateFn, Setter};
use crate::types::{
    ConstructorArgs, ConstructorDef, FieldShape, HistoricalConstructor, LocalTypeInformation,
    ObjectRef, Reconstruction, TypeIdentifier, TypeRegistration, Value,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Where a local constructor argument or setter value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Index into the remote field list.
    Remote(usize),
    /// Property added after the bytes were written: null or the empty default.
    Default,
}

enum Plan {
    Constructor {
        constructor: ConstructorDef,
        /// Version of the historical constructor, `None` for the primary.
        version: Option<u32>,
        slots: Vec<(Arc<str>, Slot)>,
    },
    Setters {
        create: CreateFn,
        slots: Vec<(Arc<str>, Setter, Slot)>,
    },
}

pub struct EvolutionSerializer {
    local: Arc<LocalTypeInformation>,
    registration: Arc<TypeRegistration>,
    remote: TypeIdentifier,
    remote_fields: Vec<FieldShape>,
    plan: Plan,
}

impl EvolutionSerializer {
    /// Plan how bytes written with `remote` become an instance of `local`.
    pub fn build(
        local: Arc<LocalTypeInformation>,
        registration: Arc<TypeRegistration>,
        remote: &CompositeNotation,
    ) -> Result<Self> {
        let name = registration.name();
        let remote_index: HashMap<&str, usize> = remote
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.as_ref(), i))
            .collect();

        for property in registration.properties() {
            let Some(&index) = remote_index.get(property.name.as_ref()) else {
                continue;
            };
            let old = &remote.fields[index];
            if old.type_ref != property.type_ref {
                return Err(SerializationError::mismatch(
                    name,
                    format!(
                        "field `{}` changed type from {} to {}",
                        property.name, old.type_ref, property.type_ref
                    ),
                ));
            }
            if !old.mandatory && property.mandatory() {
                return Err(SerializationError::mismatch(
                    name,
                    format!("field `{}` was optional and is now mandatory", property.name),
                ));
            }
        }
        for field in &remote.fields {
            if registration.property(&field.name).is_none() {
                log::debug!("[evolution] {}: remote field `{}` is read and discarded", name, field.name);
            }
        }

        let plan = match registration.reconstruction() {
            Some(Reconstruction::ByOrderedConstructorArgs {
                primary,
                historical,
            }) => plan_constructor(&registration, primary, historical, &remote_index)?,
            Some(Reconstruction::ByEmptyConstructorThenSetters { create }) => {
                plan_setters(&registration, create, &remote_index)?
            }
            None => {
                return Err(SerializationError::mismatch(
                    name,
                    "abstract type cannot be instantiated",
                ))
            }
        };

        let identifier = TypeIdentifier {
            name: Arc::clone(&remote.name),
            fingerprint: remote.descriptor,
        };
        log::info!(
            "[evolution] {} evolves to local {}",
            identifier,
            local.identifier()
        );
        Ok(Self {
            local,
            registration,
            remote: identifier,
            remote_fields: remote.fields.clone(),
            plan,
        })
    }

    pub fn local(&self) -> &Arc<LocalTypeInformation> {
        &self.local
    }

    pub fn registration(&self) -> &Arc<TypeRegistration> {
        &self.registration
    }

    /// Identifier of the shape the bytes were written with.
    pub fn remote(&self) -> &TypeIdentifier {
        &self.remote
    }

    /// Fields to read, in stream order, with their remote declared types.
    pub fn remote_fields(&self) -> &[FieldShape] {
        &self.remote_fields
    }

    /// Version of the historical constructor in use, if any.
    pub fn historical_version(&self) -> Option<u32> {
        match &self.plan {
            Plan::Constructor { version, .. } => *version,
            Plan::Setters { .. } => None,
        }
    }

    /// Build the local instance from one value per remote field.
    pub fn construct(&self, values: Vec<Value>) -> Result<ObjectRef> {
        if values.len() != self.remote_fields.len() {
            return Err(SerializationError::malformed(format!(
                "{} expects {} values, stream holds {}",
                self.remote,
                self.remote_fields.len(),
                values.len()
            )));
        }
        let mut values: Vec<Option<Value>> = values.into_iter().map(Some).collect();
        let mut take = |slot: Slot| match slot {
            Slot::Remote(i) => values[i].take().unwrap_or(Value::Null),
            Slot::Default => Value::Null,
        };

        match &self.plan {
            Plan::Constructor {
                constructor, slots, ..
            } => {
                let args = slots
                    .iter()
                    .map(|(param, slot)| (Arc::clone(param), take(*slot)))
                    .collect();
                let mut args = ConstructorArgs::new(Arc::clone(self.registration.name_arc()), args);
                (constructor.invoke)(&mut args)
            }
            Plan::Setters { create, slots } => {
                let mut instance = create();
                for (_, setter, slot) in slots {
                    if let Slot::Remote(_) = slot {
                        setter(&mut *instance, take(*slot))?;
                    }
                }
                Ok(Arc::from(instance))
            }
        }
    }
}

fn plan_constructor(
    registration: &TypeRegistration,
    primary: &ConstructorDef,
    historical: &[HistoricalConstructor],
    remote: &HashMap<&str, usize>,
) -> Result<Plan> {
    let satisfiable = |c: &ConstructorDef| c.params.iter().all(|p| remote.contains_key(p.as_ref()));
    let remote_slots = |c: &ConstructorDef| -> Vec<(Arc<str>, Slot)> {
        c.params
            .iter()
            .map(|p| (Arc::clone(p), Slot::Remote(remote[p.as_ref()])))
            .collect()
    };

    if satisfiable(primary) {
        return Ok(Plan::Constructor {
            constructor: primary.clone(),
            version: None,
            slots: remote_slots(primary),
        });
    }
    if let Some(old) = historical.iter().find(|h| satisfiable(&h.constructor)) {
        log::debug!(
            "[evolution] {} uses historical constructor v{}",
            registration.name(),
            old.version
        );
        return Ok(Plan::Constructor {
            constructor: old.constructor.clone(),
            version: Some(old.version),
            slots: remote_slots(&old.constructor),
        });
    }

    let mut slots = Vec::with_capacity(primary.params.len());
    for param in &primary.params {
        let slot = match remote.get(param.as_ref()) {
            Some(&index) => Slot::Remote(index),
            None => default_slot(registration, param)?,
        };
        slots.push((Arc::clone(param), slot));
    }
    Ok(Plan::Constructor {
        constructor: primary.clone(),
        version: None,
        slots,
    })
}

fn plan_setters(
    registration: &TypeRegistration,
    create: &CreateFn,
    remote: &HashMap<&str, usize>,
) -> Result<Plan> {
    let mut slots = Vec::with_capacity(registration.properties().len());
    for property in registration.properties() {
        let setter = property.setter.clone().ok_or_else(|| {
            SerializationError::not_serializable(
                registration.name(),
                format!("property `{}` has no setter", property.name),
            )
        })?;
        let slot = match remote.get(property.name.as_ref()) {
            Some(&index) => Slot::Remote(index),
            None => default_slot(registration, &property.name)?,
        };
        slots.push((Arc::clone(&property.name), setter, slot));
    }
    Ok(Plan::Setters {
        create: Arc::clone(create),
        slots,
    })
}

/// A property missing from the remote shape must be nullable.
fn default_slot(registration: &TypeRegistration, property: &str) -> Result<Slot> {
    match registration.property(property) {
        Some(p) if p.nullable => Ok(Slot::Default),
        Some(_) => Err(SerializationError::mismatch(
            registration.name(),
            format!("new mandatory field `{}` with no historical data", property),
        )),
        None => Err(SerializationError::mismatch(
            registration.name(),
            format!("constructor parameter `{}` is not a property", property),
        )),
    }
}

impl fmt::Debug for EvolutionSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots: Vec<(Arc<str>, Slot)> = match &self.plan {
            Plan::Constructor { slots, .. } => slots.clone(),
            Plan::Setters { slots, .. } => slots
                .iter()
                .map(|(name, _, slot)| (Arc::clone(name), *slot))
                .collect(),
        };
        f.debug_struct("EvolutionSerializer")
            .field("remote", &self.remote)
            .field("local", self.local.identifier())
            .field("historical_version", &self.historical_version())
            .field("slots", &slots)
            .finish()
    }
}
