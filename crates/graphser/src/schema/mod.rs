// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema section: type notations, their binary form, and the validated
//! remote view a decoder works from.

pub mod codec;
pub mod notation;
pub mod remote;

pub use codec::{read_schema, write_schema};
pub use notation::{CompositeNotation, RestrictedKind, RestrictedNotation, TypeNotation};
pub use remote::RemoteSchema;
