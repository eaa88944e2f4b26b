// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Use-case contexts, the scoped current context, and scheme dispatch.

pub mod context;
pub mod current;
pub mod dispatcher;
pub mod graph_scheme;

pub use context::{SerializationContext, UseCase};
pub use current::{current_context, enter, with_context, ContextGuard};
pub use dispatcher::{SchemeDispatcher, SerializationScheme};
pub use graph_scheme::GraphScheme;
