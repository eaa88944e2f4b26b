// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # graphser - versioned, self-describing object-graph serialization
//!
//! Encodes typed object graphs into a binary format that carries its own
//! schema, and decodes it back into live objects even when the receiver's
//! type definitions have evolved since the bytes were written.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use graphser::{
//!     GraphScheme, SchemeDispatcher, SerializationContext, TypeRef, TypeRegistration,
//!     TypeRegistry, EngineConfig, Whitelist,
//! };
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! struct Point { x: i32, y: i32 }
//!
//! let point = TypeRegistration::builder::<Point>("geo.Point")
//!     .property("x", TypeRef::Int, |p: &Point| p.x.into())
//!     .property("y", TypeRef::Int, |p: &Point| p.y.into())
//!     .constructor(&["x", "y"], |args| Ok(Point { x: args.take("x")?, y: args.take("y")? }))
//!     .build()?;
//! let registry = Arc::new(TypeRegistry::new().with(point)?);
//!
//! let dispatcher = SchemeDispatcher::new()
//!     .with_scheme(Arc::new(GraphScheme::new(registry, EngineConfig::default())));
//! let context = SerializationContext::p2p().with_whitelist(&Whitelist::of(["geo.Point"]));
//!
//! let bytes = dispatcher.serialize(&Point { x: 1, y: 2 }, &context)?;
//! let back: Point = dispatcher.deserialize(&bytes, &context)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  SchemeDispatcher -> SerializationScheme (GraphScheme)              |
//! |  SerializationContext | current_context() | ContextGuard            |
//! +---------------------------------------------------------------------+
//! |  SerializerFactory (one per whitelist + code scope + customs)       |
//! |  ObjectSerializer | EvolutionSerializer | CustomSerializer          |
//! |  Whitelist admission | Carpenter (synthetic records)                |
//! +---------------------------------------------------------------------+
//! |  TypeRegistry | LocalTypeInformation | SHA-256 fingerprints         |
//! +---------------------------------------------------------------------+
//! |  Wire: header | schema section | data section | DEFLATE             |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`scheme`] - use-case contexts and dispatch (start here)
//! - [`types`] - registrations, values, fingerprints
//! - [`serializer`] - factory, per-type serializers, encoder and decoder
//! - [`schema`] - type notations carried in every message
//! - [`carpenter`] - synthesis of types with no local definition
//! - [`whitelist`] - admission policy
//! - [`wire`] - header, cursor and payload encodings

/// Type synthesis and code-loading scopes.
pub mod carpenter;
/// Engine limits, wire constants and config loaders.
pub mod config;
pub mod error;
/// Schema section: type notations and their binary form.
pub mod schema;
/// Use-case contexts, current context, dispatcher.
pub mod scheme;
/// Serializer factory, object and evolution serializers, encoder/decoder.
pub mod serializer;
/// Type registrations, dynamic values and fingerprints.
pub mod types;
pub mod whitelist;
/// Byte-level framing.
pub mod wire;

pub use carpenter::{CodeLoadingScope, CodeReference, CodeResolver, ScopeLoader, TypeLoader};
pub use config::{ConfigError, EngineConfig};
pub use error::{Result, SerializationError};
pub use scheme::{
    current_context, with_context, ContextGuard, GraphScheme, SchemeDispatcher,
    SerializationContext, SerializationScheme, UseCase,
};
pub use serializer::{CustomSerializer, ProxySerializer, Root, SerializerFactory};
pub use types::{
    ConstructorArgs, EnumRegistration, Fingerprint, FromValue, ObjectRef, Record, TypeRef,
    TypeRegistration, TypeRegistry, Value,
};
pub use whitelist::Whitelist;
pub use wire::Encoding;
