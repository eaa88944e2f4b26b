// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural records: instances of synthesized types.

use crate::carpenter::{SyntheticKind, SyntheticType};
use crate::error::{Result, SerializationError};
use crate::types::Value;
use std::fmt;
use std::sync::Arc;

/// Generic instance of a type that has no local definition.
///
/// Holds one value per field of its [`SyntheticType`], in schema order, and
/// is written back out with exactly the same notation it was read with.
#[derive(Clone)]
pub struct Record {
    synthetic: Arc<SyntheticType>,
    values: Vec<Value>,
}

impl Record {
    /// Build a record; `values` must match the synthetic field list.
    pub fn new(synthetic: Arc<SyntheticType>, values: Vec<Value>) -> Result<Self> {
        if synthetic.kind() != SyntheticKind::Record {
            return Err(SerializationError::not_serializable(
                synthetic.name(),
                "only record types can be instantiated",
            ));
        }
        if values.len() != synthetic.fields().len() {
            return Err(SerializationError::not_serializable(
                synthetic.name(),
                format!(
                    "record has {} values for {} fields",
                    values.len(),
                    synthetic.fields().len()
                ),
            ));
        }
        Ok(Self { synthetic, values })
    }

    pub fn type_name(&self) -> &str {
        self.synthetic.name()
    }

    pub fn synthetic_type(&self) -> &Arc<SyntheticType> {
        &self.synthetic
    }

    /// Field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.synthetic
            .fields()
            .iter()
            .position(|field| field.name.as_ref() == name)
            .map(|index| &self.values[index])
    }

    /// `(name, value)` pairs in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.synthetic
            .fields()
            .iter()
            .map(|field| field.name.as_ref())
            .zip(self.values.iter())
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn implements(&self, interface: &str) -> bool {
        self.synthetic
            .interfaces()
            .iter()
            .any(|name| name.as_ref() == interface)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.synthetic.identifier() == other.synthetic.identifier() && self.values == other.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct(self.type_name());
        for (name, value) in self.fields() {
            debug.field(name, value);
        }
        debug.finish()
    }
}
