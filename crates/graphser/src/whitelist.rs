// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Admission policy: which types may be constructed from decoded bytes.
//!
//! Default-deny. A type is admitted when one of these holds:
//! - its name is whitelisted,
//! - its registration carries the inherently-safe marker,
//! - a custom serializer of the active context claims it.
//!
//! Whitelists only grow: nested contexts compose by union.

use crate::error::{Result, SerializationError};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Set of admitted type names. Hashable so it can key a serializer factory.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Whitelist {
    names: BTreeSet<Arc<str>>,
}

impl Whitelist {
    /// Admits nothing on its own.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(|n| Arc::from(n.as_ref())).collect(),
        }
    }

    /// This whitelist plus `name`.
    #[must_use]
    pub fn with(mut self, name: impl AsRef<str>) -> Self {
        self.names.insert(Arc::from(name.as_ref()));
        self
    }

    /// Union of both whitelists.
    #[must_use]
    pub fn union(&self, other: &Whitelist) -> Self {
        Self {
            names: self.names.union(&other.names).cloned().collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.as_ref())
    }
}

impl fmt::Debug for Whitelist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// What the decoder knows about a type at construction time.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionRequest<'a> {
    pub type_name: &'a str,
    pub inherently_safe: bool,
    pub custom_serialized: bool,
}

/// Decide admission; called right before a constructor runs.
pub fn admit(whitelist: &Whitelist, request: AdmissionRequest<'_>) -> Result<()> {
    if request.custom_serialized || request.inherently_safe || whitelist.contains(request.type_name) {
        return Ok(());
    }
    log::debug!("[whitelist] denied {}", request.type_name);
    Err(SerializationError::NotWhitelisted {
        type_name: request.type_name.to_string(),
    })
}
