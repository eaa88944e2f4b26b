// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type information: registrations, values, identity and fingerprints.

pub mod fingerprint;
pub mod local;
pub mod record;
pub mod registration;
pub mod registry;
pub mod type_ref;
pub mod value;

pub use fingerprint::{Fingerprint, Fingerprinter, ShapeSource, TypeShape};
pub use local::{FieldShape, LocalDefinition, LocalProperty, LocalTypeInformation, TypeIdentifier};
pub use record::Record;
pub use registration::{
    ConstructorArgs, ConstructorDef, EnumRegistration, HistoricalConstructor, InterfaceBuilder,
    PropertyDef, Reconstruction, RegistrationKind, TypeRegistration, TypeRegistrationBuilder,
};
pub use registry::{RegisteredType, TypeRegistry};
pub use type_ref::{validate_type_name, TypeRef};
pub use value::{binary_from_value, FromValue, ObjectRef, Value};
