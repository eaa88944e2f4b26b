// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic type synthesis ("carpentry").
//!
//! When a received schema names a type with no local definition, the
//! carpenter builds a [`SyntheticType`] exposing exactly the remote fields.
//! Instances materialize as generic [`crate::types::Record`]s; no code is
//! generated. Dependencies are synthesized first, and results are cached
//! per [`TypeIdentifier`], evicting the least recently used past capacity.
//!
//! Interfaces are kept only when they need to be: an interface without a
//! notation is dropped, and so is one whose every implementor in the schema
//! already resolves locally.

pub mod scope;
pub mod synthesis;

pub use scope::{CodeLoadingScope, CodeReference, CodeResolver, ScopeLoader, TypeLoader};
pub use synthesis::{SyntheticKind, SyntheticType};

use crate::error::{Result, SerializationError};
use crate::schema::{RemoteSchema, RestrictedKind, TypeNotation};
use crate::serializer::cache::BuildOnceCache;
use crate::types::TypeIdentifier;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// What the carpenter needs to know about local types.
pub trait LocalTypes {
    /// A native, enum or custom-serialized definition exists for `name`.
    fn resolves_locally(&self, name: &str) -> bool;
}

/// Synthesized types of one serializer factory.
#[derive(Default)]
pub struct Carpenter {
    synthesized: BuildOnceCache<TypeIdentifier, SyntheticType>,
    by_name: BuildOnceCache<Arc<str>, SyntheticType>,
}

impl Carpenter {
    /// Unbounded carpenter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Carpenter keeping at most `capacity` synthesized types.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            synthesized: BuildOnceCache::bounded(capacity),
            by_name: BuildOnceCache::bounded(capacity),
        }
    }

    /// Synthesize `name` (and whatever it depends on) from `schema`.
    pub fn synthesize(
        &self,
        schema: &RemoteSchema,
        name: &str,
        local: &dyn LocalTypes,
    ) -> Result<Arc<SyntheticType>> {
        let root = schema
            .get(name)
            .ok_or_else(|| SerializationError::unknown(name, "no notation in schema"))?;
        if let Some(hit) = self.synthesized.get(&root.identifier()) {
            return Ok(hit);
        }

        let plan = Planner::new(schema, local).plan(root.name_arc())?;
        let mut result = None;
        for step in plan.order {
            let notation = schema.get(&step).ok_or_else(|| {
                SerializationError::malformed(format!("planned type {} vanished", step))
            })?;
            let kept = plan.interfaces.get(&step).cloned().unwrap_or_default();
            let is_interface = schema.is_interface(&step);
            let built = self
                .synthesized
                .get_or_try_build(&notation.identifier(), || build(notation, kept, is_interface))?;
            self.by_name.insert(Arc::clone(&step), Arc::clone(&built));
            if step.as_ref() == name {
                result = Some(built);
            }
        }
        result.ok_or_else(|| SerializationError::unknown(name, "synthesis produced no type"))
    }

    /// Most recently synthesized type named `name`.
    pub fn get(&self, name: &str) -> Option<Arc<SyntheticType>> {
        self.by_name.get(name)
    }

    /// Distinct synthesized identifiers.
    pub fn len(&self) -> usize {
        self.synthesized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn build(notation: &TypeNotation, interfaces: Vec<Arc<str>>, is_interface: bool) -> Result<SyntheticType> {
    let identifier = notation.identifier();
    let synthetic = match notation {
        TypeNotation::Composite(c) if is_interface => {
            SyntheticType::interface(identifier, c.fields.clone(), interfaces)
        }
        TypeNotation::Composite(c) => SyntheticType::record(identifier, c.fields.clone(), interfaces),
        TypeNotation::Restricted(r) if r.kind == RestrictedKind::Enum => {
            SyntheticType::enumeration(identifier, r.choices.clone())
        }
        TypeNotation::Restricted(r) => {
            return Err(SerializationError::unknown(
                r.name.as_ref(),
                format!("{} notations cannot be synthesized", r.kind),
            ))
        }
    };
    log::info!(
        "[carpenter] synthesized {} ({:?})",
        synthetic.identifier(),
        synthetic.kind()
    );
    Ok(synthetic)
}

struct Plan {
    /// Dependencies first.
    order: Vec<Arc<str>>,
    interfaces: HashMap<Arc<str>, Vec<Arc<str>>>,
}

struct Planner<'a> {
    schema: &'a RemoteSchema,
    local: &'a dyn LocalTypes,
}

impl<'a> Planner<'a> {
    fn new(schema: &'a RemoteSchema, local: &'a dyn LocalTypes) -> Self {
        Self { schema, local }
    }

    /// Iterative post-order walk; a visited set cuts reference cycles.
    fn plan(&self, root: &Arc<str>) -> Result<Plan> {
        let mut plan = Plan {
            order: Vec::new(),
            interfaces: HashMap::new(),
        };
        let mut visited: HashSet<Arc<str>> = HashSet::new();
        let mut stack: Vec<(Arc<str>, bool)> = vec![(Arc::clone(root), false)];

        while let Some((name, expanded)) = stack.pop() {
            if expanded {
                plan.order.push(name);
                continue;
            }
            if !visited.insert(Arc::clone(&name)) {
                continue;
            }
            let (deps, kept) = self.dependencies(&name)?;
            plan.interfaces.insert(Arc::clone(&name), kept);
            stack.push((name, true));
            for dep in deps {
                if !visited.contains(&dep) {
                    stack.push((dep, false));
                }
            }
        }
        Ok(plan)
    }

    /// Types `name` needs synthesized, plus the interfaces it keeps.
    fn dependencies(&self, name: &Arc<str>) -> Result<(Vec<Arc<str>>, Vec<Arc<str>>)> {
        let notation = self
            .schema
            .get(name)
            .ok_or_else(|| SerializationError::unknown(name.as_ref(), "no notation in schema"))?;
        let composite = match notation.as_ref() {
            TypeNotation::Composite(c) => c,
            TypeNotation::Restricted(r) => {
                return match r.kind {
                    RestrictedKind::Enum => Ok((Vec::new(), Vec::new())),
                    RestrictedKind::Proxy => Err(SerializationError::unknown(
                        name.as_ref(),
                        "custom serializer not available",
                    )),
                    RestrictedKind::List | RestrictedKind::Map => Err(SerializationError::malformed(
                        format!("collection notation {} used as a named type", name),
                    )),
                };
            }
        };

        let mut deps = Vec::new();
        for field in &composite.fields {
            for dep in field.type_ref.named_dependencies() {
                if self.needs_synthesis(&dep, name)? {
                    deps.push(dep);
                }
            }
        }

        let mut kept = Vec::new();
        for interface in &composite.interfaces {
            if self.local.resolves_locally(interface) {
                kept.push(Arc::clone(interface));
                continue;
            }
            let synthesizable = matches!(
                self.schema.get(interface).map(|n| n.as_ref()),
                Some(TypeNotation::Composite(_))
            );
            if synthesizable && !self.all_implementors_local(interface) {
                kept.push(Arc::clone(interface));
                deps.push(Arc::clone(interface));
            } else {
                log::debug!("[carpenter] {} drops interface {}", name, interface);
            }
        }
        Ok((deps, kept))
    }

    fn needs_synthesis(&self, dep: &Arc<str>, referrer: &str) -> Result<bool> {
        if self.local.resolves_locally(dep) {
            return Ok(false);
        }
        match self.schema.get(dep).map(|n| n.as_ref()) {
            None => Err(SerializationError::unknown(
                dep.as_ref(),
                format!("referenced by {} with neither a local type nor a notation", referrer),
            )),
            Some(TypeNotation::Composite(_)) => {
                Ok(!(self.schema.is_interface(dep) && self.all_implementors_local(dep)))
            }
            Some(TypeNotation::Restricted(r)) => match r.kind {
                RestrictedKind::Enum => Ok(true),
                RestrictedKind::Proxy => Err(SerializationError::unknown(
                    dep.as_ref(),
                    "custom serializer not available",
                )),
                RestrictedKind::List | RestrictedKind::Map => Err(SerializationError::malformed(
                    format!("collection notation {} used as a named type", dep),
                )),
            },
        }
    }

    fn all_implementors_local(&self, interface: &str) -> bool {
        self.schema
            .implementors_of(interface)
            .all(|n| self.local.resolves_locally(n.name()))
    }
}

#[cfg(test)]
mod tests;
