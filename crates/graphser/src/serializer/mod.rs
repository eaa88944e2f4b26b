// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializer factory, per-type serializers, and the graph encoder/decoder.

pub mod cache;
pub mod custom;
pub mod evolution;
pub mod factory;
pub mod input;
pub mod object;
pub mod output;

pub use cache::{BuildOnceCache, LookupStats};
pub use custom::{CustomSerializer, ProxySerializer};
pub use evolution::{EvolutionSerializer, Slot};
pub use factory::{CustomSerializerKey, DecodeStrategy, FactoryKey, SerializerFactory};
pub use input::{decode, read_schema_section};
pub use object::{AbstractSerializer, ConcreteSerializer, ObjectSerializer, PropertyAccessor};
pub use output::{encode, Root};
