// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializer factory: one per security context.
//!
//! A factory is bound to a registry (base types plus a loaded code scope), a
//! whitelist and a set of custom serializers. Everything it builds (type
//! information, object serializers, notations, decode strategies, synthetic
//! types) is built once per key and shared read-only afterwards. Caches keyed
//! by remote identifiers hold at most `remote_type_cache_capacity` entries.
//!
//! # Lookup order for a type name
//!
//! 1. custom serializers of the context
//! 2. registered composites, interfaces and enums
//! 3. types synthesized from received schemas

use crate::carpenter::{Carpenter, CodeLoadingScope, LocalTypes, SyntheticKind, SyntheticType};
use crate::config::EngineConfig;
use crate::error::{Result, SerializationError};
use crate::schema::{CompositeNotation, RemoteSchema, RestrictedKind, RestrictedNotation, TypeNotation};
use crate::serializer::cache::{BuildOnceCache, LookupStats};
use crate::serializer::custom::CustomSerializer;
use crate::serializer::evolution::EvolutionSerializer;
use crate::serializer::object::ObjectSerializer;
use crate::types::{
    EnumRegistration, FieldShape, Fingerprint, Fingerprinter, LocalDefinition, LocalProperty,
    LocalTypeInformation, Record, RegisteredType, ShapeSource, TypeIdentifier, TypeRef,
    TypeRegistration, TypeRegistry, TypeShape,
};
use crate::whitelist::Whitelist;
use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// What distinguishes one factory from another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactoryKey {
    pub whitelist: Whitelist,
    pub scope: CodeLoadingScope,
    pub custom_serializers: BTreeSet<CustomSerializerKey>,
}

/// What tells two custom serializers apart: the claimed wire name, the proxy
/// type it converts through and the Rust type it handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomSerializerKey {
    pub type_name: Arc<str>,
    pub proxy_type: TypeRef,
    pub rust_type: TypeId,
}

impl CustomSerializerKey {
    pub fn of(custom: &dyn CustomSerializer) -> Self {
        Self {
            type_name: Arc::from(custom.type_name()),
            proxy_type: custom.proxy_type(),
            rust_type: custom.rust_type(),
        }
    }
}

/// How instances of one remote type are read back.
#[derive(Debug)]
pub enum DecodeStrategy {
    /// Remote fields equal the local ones.
    Object(Arc<ObjectSerializer>),
    /// Remote fields differ; reconcile through a plan.
    Evolution(Arc<EvolutionSerializer>),
    /// No local type; materialize as a [`Record`].
    Synthetic(Arc<SyntheticType>),
    Enum(Arc<EnumRegistration>),
    /// No local enum; constants pass through unchanged.
    SyntheticEnum(Arc<SyntheticType>),
    Custom(Arc<dyn CustomSerializer>),
}

impl DecodeStrategy {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            DecodeStrategy::Object(_) => "object",
            DecodeStrategy::Evolution(_) => "evolution",
            DecodeStrategy::Synthetic(_) => "synthetic",
            DecodeStrategy::Enum(_) => "enum",
            DecodeStrategy::SyntheticEnum(_) => "synthetic enum",
            DecodeStrategy::Custom(_) => "custom",
        }
    }
}

pub struct SerializerFactory {
    registry: Arc<TypeRegistry>,
    whitelist: Whitelist,
    customs: HashMap<Arc<str>, Arc<dyn CustomSerializer>>,
    customs_by_type: HashMap<TypeId, Arc<dyn CustomSerializer>>,
    config: EngineConfig,
    local_types: BuildOnceCache<Arc<str>, LocalTypeInformation>,
    serializers: BuildOnceCache<Arc<str>, ObjectSerializer>,
    notations: BuildOnceCache<Arc<str>, TypeNotation>,
    collections: BuildOnceCache<TypeRef, TypeNotation>,
    readers: BuildOnceCache<TypeIdentifier, DecodeStrategy>,
    carpenter: Carpenter,
}

impl SerializerFactory {
    pub fn new(
        registry: Arc<TypeRegistry>,
        whitelist: Whitelist,
        custom_serializers: Vec<Arc<dyn CustomSerializer>>,
        config: EngineConfig,
    ) -> Self {
        let mut customs: HashMap<Arc<str>, Arc<dyn CustomSerializer>> = HashMap::new();
        let mut customs_by_type = HashMap::new();
        for custom in custom_serializers {
            let name: Arc<str> = Arc::from(custom.type_name());
            if customs.contains_key(&name) {
                log::warn!("[factory] duplicate custom serializer for {}, keeping the first", name);
                continue;
            }
            if registry.contains(&name) {
                log::debug!("[factory] custom serializer overrides registration of {}", name);
            }
            customs_by_type.insert(custom.rust_type(), Arc::clone(&custom));
            customs.insert(name, custom);
        }
        Self {
            registry,
            whitelist,
            customs,
            customs_by_type,
            local_types: BuildOnceCache::new(),
            serializers: BuildOnceCache::new(),
            notations: BuildOnceCache::new(),
            collections: BuildOnceCache::new(),
            readers: BuildOnceCache::bounded(config.remote_type_cache_capacity),
            carpenter: Carpenter::with_capacity(config.remote_type_cache_capacity),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn carpenter(&self) -> &Carpenter {
        &self.carpenter
    }

    pub fn custom(&self, name: &str) -> Option<&Arc<dyn CustomSerializer>> {
        self.customs.get(name)
    }

    /// Object serializers built so far.
    pub fn serializer_count(&self) -> usize {
        self.serializers.len()
    }

    pub fn serializer_stats(&self) -> LookupStats {
        self.serializers.stats()
    }

    /// Decode strategies for remote types currently cached.
    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    // ========================================================================
    // Local type information
    // ========================================================================

    pub fn fingerprint_of(&self, name: &str) -> Result<Fingerprint> {
        Fingerprinter::new(self).fingerprint(name)
    }

    /// Local view of `name`, built once (synthetic types are not cached).
    pub fn local_type(&self, name: &str) -> Result<Arc<LocalTypeInformation>> {
        if !self.resolves_locally(name) {
            return self.build_local_type(name).map(Arc::new);
        }
        self.local_types
            .get_or_try_build(&Arc::from(name), || self.build_local_type(name))
    }

    fn build_local_type(&self, name: &str) -> Result<LocalTypeInformation> {
        let definition = if let Some(custom) = self.customs.get(name) {
            LocalDefinition::Custom(Arc::clone(custom))
        } else {
            match self.registry.get(name) {
                Some(RegisteredType::Composite(r)) => LocalDefinition::Composite(Arc::clone(r)),
                Some(RegisteredType::Enum(e)) => LocalDefinition::Enum(Arc::clone(e)),
                None => match self.carpenter.get(name) {
                    Some(synthetic) => LocalDefinition::Synthetic(synthetic),
                    None => {
                        return Err(SerializationError::unknown(name, "no local definition"));
                    }
                },
            }
        };

        let (properties, interfaces): (Vec<LocalProperty>, Vec<Arc<str>>) = match &definition {
            LocalDefinition::Composite(registration) => (
                registration
                    .field_shapes()
                    .into_iter()
                    .map(|shape| self.local_property(shape))
                    .collect(),
                registration.interfaces().to_vec(),
            ),
            LocalDefinition::Synthetic(synthetic) => (
                synthetic
                    .fields()
                    .iter()
                    .cloned()
                    .map(|shape| self.local_property(shape))
                    .collect(),
                synthetic.interfaces().to_vec(),
            ),
            LocalDefinition::Enum(_) | LocalDefinition::Custom(_) => (Vec::new(), Vec::new()),
        };

        let fingerprint = self.fingerprint_of(name)?;
        log::debug!("[factory] type information for {} ({})", name, fingerprint.to_hex());
        Ok(LocalTypeInformation::new(
            TypeIdentifier::new(name, fingerprint),
            properties,
            interfaces,
            definition,
        ))
    }

    fn local_property(&self, shape: FieldShape) -> LocalProperty {
        let custom_serialized = shape
            .type_ref
            .named_dependencies()
            .iter()
            .any(|dep| self.customs.contains_key(dep));
        LocalProperty {
            shape,
            custom_serialized,
        }
    }

    /// Wire name of a native instance or [`Record`].
    pub fn type_name_of(&self, object: &dyn Any) -> Result<Arc<str>> {
        if let Some(record) = object.downcast_ref::<Record>() {
            return Ok(Arc::clone(&record.synthetic_type().identifier().name));
        }
        let rust_type = Any::type_id(object);
        if let Some(custom) = self.customs_by_type.get(&rust_type) {
            return Ok(Arc::from(custom.type_name()));
        }
        self.registry.name_of(rust_type).cloned().ok_or_else(|| {
            SerializationError::not_serializable(
                format!("{:?}", rust_type),
                "Rust type is neither registered nor custom-serialized",
            )
        })
    }

    /// `runtime` is `declared` or implements it, directly or transitively.
    pub fn is_assignable(&self, runtime: &str, declared: &str) -> bool {
        if runtime == declared {
            return true;
        }
        let mut seen: HashSet<Arc<str>> = HashSet::new();
        let mut pending: Vec<Arc<str>> = vec![Arc::from(runtime)];
        while let Some(name) = pending.pop() {
            if !seen.insert(Arc::clone(&name)) {
                continue;
            }
            if let Some(TypeShape::Composite { interfaces, .. }) = self.shape_of(&name) {
                if interfaces.iter().any(|i| i.as_ref() == declared) {
                    return true;
                }
                pending.extend(interfaces);
            }
        }
        false
    }

    // ========================================================================
    // Encode side
    // ========================================================================

    /// Serializer of a registered composite or interface.
    pub fn serializer_for(&self, name: &str) -> Result<Arc<ObjectSerializer>> {
        self.serializers.get_or_try_build(&Arc::from(name), || {
            let info = self.local_type(name)?;
            let notation = self.notation_for(name)?;
            let serializer = ObjectSerializer::new(info, notation)?;
            log::debug!(
                "[factory] built {} serializer for {}",
                if serializer.is_abstract() { "abstract" } else { "concrete" },
                name
            );
            Ok(serializer)
        })
    }

    /// Schema entry describing the named type as this process sees it.
    pub fn notation_for(&self, name: &str) -> Result<Arc<TypeNotation>> {
        if !self.resolves_locally(name) {
            return self.build_notation(name).map(Arc::new);
        }
        self.notations
            .get_or_try_build(&Arc::from(name), || self.build_notation(name))
    }

    fn build_notation(&self, name: &str) -> Result<TypeNotation> {
        let shape = self
            .shape_of(name)
            .ok_or_else(|| SerializationError::not_serializable(name, "no local definition"))?;
        let descriptor = self.fingerprint_of(name)?;
        let name: Arc<str> = Arc::from(name);
        Ok(match shape {
            TypeShape::Composite { fields, interfaces } => TypeNotation::Composite(CompositeNotation {
                name,
                descriptor,
                interfaces,
                fields,
            }),
            TypeShape::Enum { constants } => TypeNotation::Restricted(RestrictedNotation {
                name,
                kind: RestrictedKind::Enum,
                descriptor,
                element_types: Vec::new(),
                choices: constants,
            }),
            TypeShape::Proxy { proxy } => TypeNotation::Restricted(RestrictedNotation {
                name,
                kind: RestrictedKind::Proxy,
                descriptor,
                element_types: vec![proxy],
                choices: Vec::new(),
            }),
        })
    }

    /// Restricted notation of a `list<..>` or `map<..>` type.
    pub fn collection_notation(&self, type_ref: &TypeRef) -> Result<Arc<TypeNotation>> {
        self.collections.get_or_try_build(type_ref, || {
            let (kind, element_types) = match type_ref {
                TypeRef::List(element) => (RestrictedKind::List, vec![element.as_ref().clone()]),
                TypeRef::Map(key, value) => (
                    RestrictedKind::Map,
                    vec![key.as_ref().clone(), value.as_ref().clone()],
                ),
                other => {
                    return Err(SerializationError::not_serializable(
                        other.to_string(),
                        "not a collection type",
                    ))
                }
            };
            Ok(TypeNotation::Restricted(RestrictedNotation {
                name: Arc::from(type_ref.to_string()),
                kind,
                descriptor: Fingerprinter::new(self).fingerprint_type(type_ref)?,
                element_types,
                choices: Vec::new(),
            }))
        })
    }

    // ========================================================================
    // Decode side
    // ========================================================================

    /// Decode strategy for a remote OBJECT/ENUM/CUSTOM notation, cached per
    /// remote identifier.
    pub fn reader_for(
        &self,
        schema: &RemoteSchema,
        notation: &Arc<TypeNotation>,
    ) -> Result<Arc<DecodeStrategy>> {
        let identifier = notation.identifier();
        self.readers.get_or_try_build(&identifier, || {
            let strategy = self.build_reader(schema, notation)?;
            log::debug!("[factory] {} strategy for {}", strategy.label(), identifier);
            Ok(strategy)
        })
    }

    fn build_reader(&self, schema: &RemoteSchema, notation: &TypeNotation) -> Result<DecodeStrategy> {
        let name = notation.name();
        if let Some(custom) = self.customs.get(name) {
            return match notation.as_restricted() {
                Some(r) if r.kind == RestrictedKind::Proxy => {
                    let local_proxy = custom.proxy_type();
                    if r.element_types.first() != Some(&local_proxy) {
                        return Err(SerializationError::mismatch(
                            name,
                            format!("remote proxy type differs from local {}", local_proxy),
                        ));
                    }
                    Ok(DecodeStrategy::Custom(Arc::clone(custom)))
                }
                _ => Err(SerializationError::mismatch(
                    name,
                    "custom-serialized locally but not sent as a proxy",
                )),
            };
        }

        match (self.registry.get(name), notation) {
            (Some(RegisteredType::Composite(registration)), TypeNotation::Composite(remote)) => {
                if registration.is_interface() {
                    return Err(SerializationError::mismatch(
                        name,
                        "sent as an instance but abstract locally",
                    ));
                }
                self.composite_reader(name, Arc::clone(registration), remote)
            }
            (Some(RegisteredType::Enum(registration)), TypeNotation::Restricted(r))
                if r.kind == RestrictedKind::Enum =>
            {
                Ok(DecodeStrategy::Enum(Arc::clone(registration)))
            }
            (Some(_), _) => Err(SerializationError::mismatch(
                name,
                "remote notation kind differs from the local definition",
            )),
            (None, TypeNotation::Restricted(r)) if r.kind == RestrictedKind::Proxy => Err(
                SerializationError::unknown(name, "custom serializer not available"),
            ),
            (None, _) => {
                let synthetic = self.carpenter.synthesize(schema, name, self)?;
                match synthetic.kind() {
                    SyntheticKind::Record => Ok(DecodeStrategy::Synthetic(synthetic)),
                    SyntheticKind::Enum => Ok(DecodeStrategy::SyntheticEnum(synthetic)),
                    SyntheticKind::Interface => Err(SerializationError::malformed(format!(
                        "abstract type {} sent as an instance",
                        name
                    ))),
                }
            }
        }
    }

    fn composite_reader(
        &self,
        name: &str,
        registration: Arc<TypeRegistration>,
        remote: &CompositeNotation,
    ) -> Result<DecodeStrategy> {
        let local = self.local_type(name)?;
        let local_fields = local.field_shapes();
        let same_fingerprint = remote.descriptor == local.fingerprint();

        if remote.fields == local_fields {
            if !same_fingerprint {
                log::debug!(
                    "[factory] {} has matching fields but a nested type differs",
                    name
                );
            }
            return Ok(DecodeStrategy::Object(self.serializer_for(name)?));
        }

        if same_fingerprint {
            if self.config.reject_fingerprint_collisions {
                return Err(SerializationError::FingerprintCollisionSuspected {
                    type_name: name.to_string(),
                    fingerprint: remote.descriptor.to_hex(),
                });
            }
            log::warn!(
                "[factory] fingerprint collision suspected for {} ({}), evolving",
                name,
                remote.descriptor
            );
        }
        EvolutionSerializer::build(local, registration, remote)
            .map(|evolution| DecodeStrategy::Evolution(Arc::new(evolution)))
    }
}

impl ShapeSource for SerializerFactory {
    fn shape_of(&self, name: &str) -> Option<TypeShape> {
        if let Some(custom) = self.customs.get(name) {
            return Some(TypeShape::Proxy {
                proxy: custom.proxy_type(),
            });
        }
        match self.registry.get(name) {
            Some(RegisteredType::Composite(r)) => Some(TypeShape::Composite {
                fields: r.field_shapes(),
                interfaces: r.interfaces().to_vec(),
            }),
            Some(RegisteredType::Enum(e)) => Some(TypeShape::Enum {
                constants: e.constants().to_vec(),
            }),
            None => self.carpenter.get(name).map(|synthetic| synthetic.shape()),
        }
    }
}

impl LocalTypes for SerializerFactory {
    fn resolves_locally(&self, name: &str) -> bool {
        self.customs.contains_key(name) || self.registry.contains(name)
    }
}

impl fmt::Debug for SerializerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerFactory")
            .field("registered", &self.registry.len())
            .field("whitelist", &self.whitelist)
            .field("custom_serializers", &self.customs.len())
            .field("serializers", &self.serializers.len())
            .field("synthesized", &self.carpenter.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
