// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Explicit per-type registration: properties, reconstruction, interfaces.
//!
//! Rust has no runtime reflection, so every serializable composite declares
//! its shape once through [`TypeRegistration::builder`]. The closures captured
//! here are the accessor and constructor tables the factory binds into an
//! object serializer; nothing is resolved dynamically per call.
//!
//! # Example
//!
//! ```ignore
//! let person = TypeRegistration::builder::<Person>("acme.Person")
//!     .property("name", TypeRef::String, |p: &Person| p.name.clone().into())
//!     .nullable_property("email", TypeRef::String, |p: &Person| p.email.clone().into())
//!     .constructor(&["name", "email"], |args| {
//!         Ok(Person { name: args.take("name")?, email: args.take("email")? })
//!     })
//!     .build()?;
//! ```

use crate::error::{Result, SerializationError};
use crate::types::type_ref::validate_type_name;
use crate::types::value::{FromValue, ObjectRef, Value};
use crate::types::{FieldShape, TypeRef};
use std::any::{Any, TypeId};
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Reads one property from a (type-erased) instance.
pub type Getter = Arc<dyn Fn(&dyn Any) -> Result<Value> + Send + Sync>;

/// Writes one property into a freshly created instance.
pub type Setter = Arc<dyn Fn(&mut dyn Any, Value) -> Result<()> + Send + Sync>;

/// Builds an instance from named constructor arguments.
pub type ConstructorFn = Arc<dyn Fn(&mut ConstructorArgs) -> Result<ObjectRef> + Send + Sync>;

/// Creates an empty instance for setter-based reconstruction.
pub type CreateFn = Arc<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// One serializable property.
#[derive(Clone)]
pub struct PropertyDef {
    pub name: Arc<str>,
    pub type_ref: TypeRef,
    pub nullable: bool,
    /// `None` for interface (abstract) properties.
    pub getter: Option<Getter>,
    pub setter: Option<Setter>,
}

impl PropertyDef {
    pub fn mandatory(&self) -> bool {
        !self.nullable
    }

    pub fn shape(&self) -> FieldShape {
        FieldShape {
            name: Arc::clone(&self.name),
            type_ref: self.type_ref.clone(),
            mandatory: self.mandatory(),
        }
    }
}

impl fmt::Debug for PropertyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("name", &self.name)
            .field("type_ref", &self.type_ref)
            .field("nullable", &self.nullable)
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

/// A constructor with its parameter names in call order.
#[derive(Clone)]
pub struct ConstructorDef {
    pub params: Vec<Arc<str>>,
    pub invoke: ConstructorFn,
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("params", &self.params)
            .finish()
    }
}

/// Constructor kept for data written by an older version of the type.
#[derive(Debug, Clone)]
pub struct HistoricalConstructor {
    pub version: u32,
    pub constructor: ConstructorDef,
}

/// How a decoded instance is rebuilt.
#[derive(Clone)]
pub enum Reconstruction {
    /// Property values are positional arguments of `primary`.
    ByOrderedConstructorArgs {
        primary: ConstructorDef,
        /// Sorted by descending version.
        historical: Vec<HistoricalConstructor>,
    },
    /// Empty instance first, then one setter per property.
    ByEmptyConstructorThenSetters { create: CreateFn },
}

impl fmt::Debug for Reconstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reconstruction::ByOrderedConstructorArgs {
                primary,
                historical,
            } => f
                .debug_struct("ByOrderedConstructorArgs")
                .field("primary", primary)
                .field("historical", historical)
                .finish(),
            Reconstruction::ByEmptyConstructorThenSetters { .. } => {
                write!(f, "ByEmptyConstructorThenSetters")
            }
        }
    }
}

/// Named arguments handed to a constructor closure.
#[derive(Debug)]
pub struct ConstructorArgs {
    type_name: Arc<str>,
    args: Vec<(Arc<str>, Option<Value>)>,
}

impl ConstructorArgs {
    pub(crate) fn new(type_name: Arc<str>, args: Vec<(Arc<str>, Value)>) -> Self {
        Self {
            type_name,
            args: args.into_iter().map(|(n, v)| (n, Some(v))).collect(),
        }
    }

    /// Move the argument `name` out, converted to `V`.
    pub fn take<V: FromValue>(&mut self, name: &str) -> Result<V> {
        let slot = self
            .args
            .iter_mut()
            .find(|(param, _)| param.as_ref() == name)
            .and_then(|(_, value)| value.take())
            .ok_or_else(|| {
                SerializationError::not_serializable(
                    self.type_name.as_ref(),
                    format!("constructor argument `{}` missing or already taken", name),
                )
            })?;
        V::from_value(slot).map_err(|e| match e {
            SerializationError::MalformedStream { reason } => SerializationError::malformed(
                format!("{}.{}: {}", self.type_name, name, reason),
            ),
            other => other,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Whether a registration can be instantiated.
#[derive(Debug, Clone)]
pub enum RegistrationKind {
    Concrete {
        rust_type: TypeId,
        reconstruction: Reconstruction,
    },
    /// Never instantiated; only describes a property shape.
    Interface,
}

/// Registered composite or interface type.
#[derive(Debug, Clone)]
pub struct TypeRegistration {
    name: Arc<str>,
    properties: Vec<PropertyDef>,
    interfaces: Vec<Arc<str>>,
    kind: RegistrationKind,
    inherently_safe: bool,
}

impl TypeRegistration {
    /// Start registering the Rust type `T` under `name`.
    pub fn builder<T: Any + Send + Sync>(name: impl AsRef<str>) -> TypeRegistrationBuilder<T> {
        TypeRegistrationBuilder {
            name: Arc::from(name.as_ref()),
            properties: Vec::new(),
            interfaces: Vec::new(),
            primary: None,
            historical: Vec::new(),
            create: None,
            inherently_safe: false,
            error: None,
            _marker: PhantomData,
        }
    }

    /// Start registering an interface (abstract, property shape only).
    pub fn interface(name: impl AsRef<str>) -> InterfaceBuilder {
        InterfaceBuilder {
            name: Arc::from(name.as_ref()),
            properties: Vec::new(),
            interfaces: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    /// Properties in canonical order.
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name.as_ref() == name)
    }

    /// Implemented interface names, sorted.
    pub fn interfaces(&self) -> &[Arc<str>] {
        &self.interfaces
    }

    pub fn kind(&self) -> &RegistrationKind {
        &self.kind
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, RegistrationKind::Interface)
    }

    pub fn rust_type(&self) -> Option<TypeId> {
        match &self.kind {
            RegistrationKind::Concrete { rust_type, .. } => Some(*rust_type),
            RegistrationKind::Interface => None,
        }
    }

    pub fn reconstruction(&self) -> Option<&Reconstruction> {
        match &self.kind {
            RegistrationKind::Concrete { reconstruction, .. } => Some(reconstruction),
            RegistrationKind::Interface => None,
        }
    }

    /// Carries the "inherently safe" marker (admitted without a whitelist entry).
    pub fn is_inherently_safe(&self) -> bool {
        self.inherently_safe
    }

    pub fn field_shapes(&self) -> Vec<FieldShape> {
        self.properties.iter().map(PropertyDef::shape).collect()
    }
}

fn sorted_interfaces(mut interfaces: Vec<Arc<str>>) -> Vec<Arc<str>> {
    interfaces.sort();
    interfaces.dedup();
    interfaces
}

fn check_property_names(name: &str, properties: &[PropertyDef]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for property in properties {
        if property.name.is_empty() {
            return Err(SerializationError::not_serializable(
                name,
                "empty property name",
            ));
        }
        if !seen.insert(property.name.as_ref()) {
            return Err(SerializationError::not_serializable(
                name,
                format!("duplicate property `{}`", property.name),
            ));
        }
    }
    Ok(())
}

// ============================================================================
// Builders
// ============================================================================

/// Builder for concrete types; see [`TypeRegistration::builder`].
pub struct TypeRegistrationBuilder<T> {
    name: Arc<str>,
    properties: Vec<PropertyDef>,
    interfaces: Vec<Arc<str>>,
    primary: Option<ConstructorDef>,
    historical: Vec<HistoricalConstructor>,
    create: Option<CreateFn>,
    inherently_safe: bool,
    error: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> TypeRegistrationBuilder<T> {
    /// Declare a mandatory property.
    #[must_use]
    pub fn property<F>(self, name: &str, type_ref: TypeRef, get: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.push_property(name, type_ref, false, get)
    }

    /// Declare a property that may be null.
    #[must_use]
    pub fn nullable_property<F>(self, name: &str, type_ref: TypeRef, get: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.push_property(name, type_ref, true, get)
    }

    fn push_property<F>(mut self, name: &str, type_ref: TypeRef, nullable: bool, get: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        let type_name = Arc::clone(&self.name);
        let getter: Getter = Arc::new(move |instance: &dyn Any| {
            instance.downcast_ref::<T>().map(&get).ok_or_else(|| {
                SerializationError::not_serializable(
                    type_name.as_ref(),
                    "getter invoked on a foreign instance",
                )
            })
        });
        self.properties.push(PropertyDef {
            name: Arc::from(name),
            type_ref,
            nullable,
            getter: Some(getter),
            setter: None,
        });
        self
    }

    /// Attach a setter to an already declared property.
    #[must_use]
    pub fn setter<F>(mut self, name: &str, set: F) -> Self
    where
        F: Fn(&mut T, Value) -> Result<()> + Send + Sync + 'static,
    {
        let type_name = Arc::clone(&self.name);
        let setter: Setter = Arc::new(move |instance: &mut dyn Any, value: Value| {
            let instance = instance.downcast_mut::<T>().ok_or_else(|| {
                SerializationError::not_serializable(
                    type_name.as_ref(),
                    "setter invoked on a foreign instance",
                )
            })?;
            set(instance, value)
        });
        match self.properties.iter_mut().find(|p| p.name.as_ref() == name) {
            Some(property) => property.setter = Some(setter),
            None => self.fail(format!("setter for undeclared property `{}`", name)),
        }
        self
    }

    /// Primary constructor; `params` fixes the canonical property order.
    #[must_use]
    pub fn constructor<F>(mut self, params: &[&str], construct: F) -> Self
    where
        F: Fn(&mut ConstructorArgs) -> Result<T> + Send + Sync + 'static,
    {
        if self.primary.is_some() {
            self.fail("primary constructor declared twice".to_string());
        }
        self.primary = Some(constructor_def(params, construct));
        self
    }

    /// Constructor for data written by version `version` of this type.
    #[must_use]
    pub fn historical_constructor<F>(mut self, version: u32, params: &[&str], construct: F) -> Self
    where
        F: Fn(&mut ConstructorArgs) -> Result<T> + Send + Sync + 'static,
    {
        self.historical.push(HistoricalConstructor {
            version,
            constructor: constructor_def(params, construct),
        });
        self
    }

    /// Empty constructor for setter-based reconstruction.
    #[must_use]
    pub fn empty_constructor<F>(mut self, create: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.create = Some(Arc::new(move || Box::new(create()) as Box<dyn Any + Send + Sync>));
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(Arc::from(interface));
        self
    }

    /// Mark the type inherently safe to construct from untrusted bytes.
    #[must_use]
    pub fn serializable(mut self) -> Self {
        self.inherently_safe = true;
        self
    }

    fn fail(&mut self, reason: String) {
        if self.error.is_none() {
            self.error = Some(reason);
        }
    }

    /// Validate and freeze the registration.
    pub fn build(self) -> Result<TypeRegistration> {
        validate_type_name(&self.name)?;
        let name = self.name;
        if let Some(reason) = self.error {
            return Err(SerializationError::not_serializable(name.as_ref(), reason));
        }
        check_property_names(&name, &self.properties)?;

        let (properties, reconstruction) = match (self.primary, self.create) {
            (Some(_), Some(_)) => {
                return Err(SerializationError::not_serializable(
                    name.as_ref(),
                    "both a constructor and an empty constructor declared",
                ))
            }
            (None, None) => {
                return Err(SerializationError::not_serializable(
                    name.as_ref(),
                    "no constructor declared",
                ))
            }
            (Some(primary), None) => {
                let properties = order_by_constructor(&name, self.properties, &primary)?;
                let mut historical = self.historical;
                historical.sort_by(|a, b| b.version.cmp(&a.version));
                for window in historical.windows(2) {
                    if window[0].version == window[1].version {
                        return Err(SerializationError::not_serializable(
                            name.as_ref(),
                            format!("historical constructor version {} declared twice", window[0].version),
                        ));
                    }
                }
                (
                    properties,
                    Reconstruction::ByOrderedConstructorArgs {
                        primary,
                        historical,
                    },
                )
            }
            (None, Some(create)) => {
                if !self.historical.is_empty() {
                    return Err(SerializationError::not_serializable(
                        name.as_ref(),
                        "historical constructors require a primary constructor",
                    ));
                }
                let mut properties = self.properties;
                if let Some(missing) = properties.iter().find(|p| p.setter.is_none()) {
                    return Err(SerializationError::not_serializable(
                        name.as_ref(),
                        format!("property `{}` has no setter", missing.name),
                    ));
                }
                properties.sort_by(|a, b| a.name.cmp(&b.name));
                (
                    properties,
                    Reconstruction::ByEmptyConstructorThenSetters { create },
                )
            }
        };

        Ok(TypeRegistration {
            name,
            properties,
            interfaces: sorted_interfaces(self.interfaces),
            kind: RegistrationKind::Concrete {
                rust_type: TypeId::of::<T>(),
                reconstruction,
            },
            inherently_safe: self.inherently_safe,
        })
    }
}

fn constructor_def<T, F>(params: &[&str], construct: F) -> ConstructorDef
where
    T: Any + Send + Sync,
    F: Fn(&mut ConstructorArgs) -> Result<T> + Send + Sync + 'static,
{
    ConstructorDef {
        params: params.iter().map(|p| Arc::from(*p)).collect(),
        invoke: Arc::new(move |args: &mut ConstructorArgs| {
            construct(args).map(|instance| Arc::new(instance) as ObjectRef)
        }),
    }
}

/// Reorder `properties` to the primary constructor's parameter order.
fn order_by_constructor(
    name: &str,
    mut properties: Vec<PropertyDef>,
    primary: &ConstructorDef,
) -> Result<Vec<PropertyDef>> {
    if primary.params.len() != properties.len() {
        return Err(SerializationError::not_serializable(
            name,
            format!(
                "constructor takes {} parameters but {} properties are declared",
                primary.params.len(),
                properties.len()
            ),
        ));
    }
    let mut ordered = Vec::with_capacity(properties.len());
    for param in &primary.params {
        let index = properties
            .iter()
            .position(|p| p.name == *param)
            .ok_or_else(|| {
                SerializationError::not_serializable(
                    name,
                    format!("constructor parameter `{}` is not a property", param),
                )
            })?;
        ordered.push(properties.swap_remove(index));
    }
    Ok(ordered)
}

/// Builder for interfaces; see [`TypeRegistration::interface`].
#[derive(Debug)]
pub struct InterfaceBuilder {
    name: Arc<str>,
    properties: Vec<PropertyDef>,
    interfaces: Vec<Arc<str>>,
}

impl InterfaceBuilder {
    /// Declare an abstract property.
    #[must_use]
    pub fn property(mut self, name: &str, type_ref: TypeRef, nullable: bool) -> Self {
        self.properties.push(PropertyDef {
            name: Arc::from(name),
            type_ref,
            nullable,
            getter: None,
            setter: None,
        });
        self
    }

    /// Super-interface.
    #[must_use]
    pub fn extends(mut self, interface: &str) -> Self {
        self.interfaces.push(Arc::from(interface));
        self
    }

    pub fn build(self) -> Result<TypeRegistration> {
        validate_type_name(&self.name)?;
        check_property_names(&self.name, &self.properties)?;
        let mut properties = self.properties;
        properties.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(TypeRegistration {
            name: self.name,
            properties,
            interfaces: sorted_interfaces(self.interfaces),
            kind: RegistrationKind::Interface,
            inherently_safe: false,
        })
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Registered enum with its evolution transforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumRegistration {
    name: Arc<str>,
    constants: Vec<String>,
    /// `old -> current` constant renames.
    renames: Vec<(String, String)>,
    /// `unknown -> fallback` for constants added by newer writers.
    defaults: Vec<(String, String)>,
}

impl EnumRegistration {
    pub fn new<I, S>(name: impl AsRef<str>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Arc::from(name.as_ref()),
            constants: constants.into_iter().map(Into::into).collect(),
            renames: Vec::new(),
            defaults: Vec::new(),
        }
    }

    /// Constant `old` was renamed to `current`.
    #[must_use]
    pub fn rename(mut self, old: impl Into<String>, current: impl Into<String>) -> Self {
        self.renames.push((old.into(), current.into()));
        self
    }

    /// Map the (unknown here) constant `unknown` onto `fallback`.
    #[must_use]
    pub fn default_for(mut self, unknown: impl Into<String>, fallback: impl Into<String>) -> Self {
        self.defaults.push((unknown.into(), fallback.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    pub fn contains(&self, constant: &str) -> bool {
        self.constants.iter().any(|c| c == constant)
    }

    /// Validate names, constants and that every transform lands on a known constant.
    pub fn validate(&self) -> Result<()> {
        validate_type_name(&self.name)?;
        if self.constants.is_empty() {
            return Err(SerializationError::not_serializable(
                self.name.as_ref(),
                "enum without constants",
            ));
        }
        let unique: BTreeSet<&str> = self.constants.iter().map(String::as_str).collect();
        if unique.len() != self.constants.len() {
            return Err(SerializationError::not_serializable(
                self.name.as_ref(),
                "duplicate enum constant",
            ));
        }
        for (from, to) in self.renames.iter().chain(self.defaults.iter()) {
            if !self.contains(to) && !self.renames.iter().any(|(old, _)| old == to) {
                return Err(SerializationError::not_serializable(
                    self.name.as_ref(),
                    format!("transform {} -> {} targets an unknown constant", from, to),
                ));
            }
        }
        Ok(())
    }

    /// Map a constant written by another version onto a local constant.
    pub fn resolve(&self, constant: &str) -> Result<&str> {
        let mut current = constant;
        // Each transform may apply once; this bounds chains and breaks loops.
        for _ in 0..=self.renames.len() + self.defaults.len() {
            if let Some(local) = self.constants.iter().find(|c| c.as_str() == current) {
                return Ok(local);
            }
            let next = self
                .renames
                .iter()
                .chain(self.defaults.iter())
                .find(|(from, _)| from == current)
                .map(|(_, to)| to.as_str());
            match next {
                Some(to) => current = to,
                None => break,
            }
        }
        Err(SerializationError::mismatch(
            self.name.as_ref(),
            format!("unknown enum constant `{}`", constant),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Pair {
        left: i32,
        right: Option<String>,
    }

    fn pair_builder() -> TypeRegistrationBuilder<Pair> {
        TypeRegistration::builder::<Pair>("test.Pair")
            .nullable_property("right", TypeRef::String, |p: &Pair| p.right.clone().into())
            .property("left", TypeRef::Int, |p: &Pair| p.left.into())
    }

    #[test]
    fn test_constructor_order_wins() {
        let reg = pair_builder()
            .constructor(&["left", "right"], |args| {
                Ok(Pair {
                    left: args.take("left")?,
                    right: args.take("right")?,
                })
            })
            .build()
            .expect("valid registration");

        let names: Vec<&str> = reg.properties().iter().map(|p| p.name.as_ref()).collect();
        assert_eq!(names, ["left", "right"]);
        assert!(!reg.is_interface());
        assert_eq!(reg.rust_type(), Some(TypeId::of::<Pair>()));
    }

    #[test]
    fn test_constructor_arity_mismatch_rejected() {
        let err = pair_builder()
            .constructor(&["left"], |args| {
                Ok(Pair {
                    left: args.take("left")?,
                    right: None,
                })
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, SerializationError::NotSerializable { .. }));
    }

    #[test]
    fn test_setter_types_sorted_alphabetically() {
        #[derive(Default)]
        struct Bag {
            b: i32,
            a: i32,
        }

        let reg = TypeRegistration::builder::<Bag>("test.Bag")
            .property("b", TypeRef::Int, |x: &Bag| x.b.into())
            .setter("b", |x: &mut Bag, v| {
                x.b = FromValue::from_value(v)?;
                Ok(())
            })
            .property("a", TypeRef::Int, |x: &Bag| x.a.into())
            .setter("a", |x: &mut Bag, v| {
                x.a = FromValue::from_value(v)?;
                Ok(())
            })
            .empty_constructor(Bag::default)
            .build()
            .expect("valid registration");

        let names: Vec<&str> = reg.properties().iter().map(|p| p.name.as_ref()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_missing_setter_rejected() {
        #[derive(Default)]
        struct Bag {
            a: i32,
        }
        let err = TypeRegistration::builder::<Bag>("test.Bag")
            .property("a", TypeRef::Int, |x: &Bag| x.a.into())
            .empty_constructor(Bag::default)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("no setter"));
    }

    #[test]
    fn test_constructor_args_take() {
        let mut args = ConstructorArgs::new(
            Arc::from("test.Pair"),
            vec![(Arc::from("left"), Value::Int(4))],
        );
        assert_eq!(args.take::<i32>("left").unwrap(), 4);
        assert!(args.take::<i32>("left").is_err());
        assert!(args.take::<i32>("other").is_err());
    }

    #[test]
    fn test_enum_resolution_follows_transforms() {
        let color = EnumRegistration::new("test.Color", ["RED", "GREEN"])
            .rename("CRIMSON", "RED")
            .default_for("BLUE", "GREEN");
        color.validate().expect("valid enum");

        assert_eq!(color.resolve("RED").unwrap(), "RED");
        assert_eq!(color.resolve("CRIMSON").unwrap(), "RED");
        assert_eq!(color.resolve("BLUE").unwrap(), "GREEN");
        assert!(matches!(
            color.resolve("PURPLE"),
            Err(SerializationError::SchemaMismatchUnrecoverable { .. })
        ));
    }

    #[test]
    fn test_enum_transform_loop_terminates() {
        let looping = EnumRegistration::new("test.Loop", ["A"])
            .rename("X", "Y")
            .rename("Y", "X");
        assert!(looping.resolve("X").is_err());
    }
}
