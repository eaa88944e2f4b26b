// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural fingerprints (SHA-256 over a type's field shape).
//!
//! A type's own contribution is its name, each property as `(name, type
//! token, mandatory)` in canonical order, then the sorted interface names.
//! The type token of a property is the fingerprint of the referenced type
//! when its shape is known and its canonical name otherwise.
//!
//! Recursive definitions are handled per strongly connected component of the
//! reference graph: members of one component refer to each other by name,
//! and each member's fingerprint also covers the other members' own
//! contributions (sorted by name). The result depends only on the reachable
//! shapes, never on lookup order, so the local factory and the decoder of a
//! received schema agree bit for bit when their shapes agree.

use crate::config::FINGERPRINT_LEN;
use crate::error::{Result, SerializationError};
use crate::types::{FieldShape, TypeRef};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Fixed-length structural hash of a type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn digest(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut out = [0u8; FINGERPRINT_LEN];
        out.copy_from_slice(&digest);
        Self(out)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hashable description of a named type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// Composite or interface: ordered fields plus implemented interfaces.
    Composite {
        fields: Vec<FieldShape>,
        interfaces: Vec<Arc<str>>,
    },
    Enum {
        constants: Vec<String>,
    },
    /// Custom-serialized type, described by its proxy type.
    Proxy {
        proxy: TypeRef,
    },
}

impl TypeShape {
    /// Named types this shape refers to (interfaces excluded: they hash by name).
    fn references(&self) -> Vec<Arc<str>> {
        match self {
            TypeShape::Composite { fields, .. } => fields
                .iter()
                .flat_map(|f| f.type_ref.named_dependencies())
                .collect(),
            TypeShape::Enum { .. } => Vec::new(),
            TypeShape::Proxy { proxy } => proxy.named_dependencies(),
        }
    }
}

/// Anything able to describe named types: the local factory or a received schema.
pub trait ShapeSource {
    fn shape_of(&self, name: &str) -> Option<TypeShape>;
}

/// Fingerprint computations over one [`ShapeSource`], memoized.
pub struct Fingerprinter<'a, S: ShapeSource + ?Sized> {
    source: &'a S,
    memo: HashMap<Arc<str>, Fingerprint>,
}

struct Node {
    name: Arc<str>,
    shape: TypeShape,
    edges: Vec<Arc<str>>,
    index: usize,
    low: usize,
    on_stack: bool,
}

impl<'a, S: ShapeSource + ?Sized> Fingerprinter<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            memo: HashMap::new(),
        }
    }

    /// Fingerprint of the named type.
    pub fn fingerprint(&mut self, name: &str) -> Result<Fingerprint> {
        if let Some(fp) = self.memo.get(name) {
            return Ok(*fp);
        }
        let shape = self.source.shape_of(name).ok_or_else(|| {
            SerializationError::unknown(name, "no shape available for fingerprinting")
        })?;
        self.run_components(Arc::from(name), shape);
        self.memo.get(name).copied().ok_or_else(|| {
            SerializationError::unknown(name, "fingerprint computation did not converge")
        })
    }

    /// Fingerprint of an anonymous collection type (restricted notations).
    pub fn fingerprint_type(&mut self, type_ref: &TypeRef) -> Result<Fingerprint> {
        for name in type_ref.named_dependencies() {
            if self.source.shape_of(&name).is_some() {
                self.fingerprint(&name)?;
            }
        }
        let mut bytes = Vec::new();
        put(&mut bytes, "restricted");
        let token = self.token(type_ref, &BTreeSet::new());
        put(&mut bytes, &token);
        Ok(Fingerprint::digest(&bytes))
    }

    /// Iterative Tarjan over the reference graph rooted at `root`; every
    /// component is sealed as soon as it completes (dependencies first).
    fn run_components(&mut self, root: Arc<str>, shape: TypeShape) {
        let mut nodes: Vec<Node> = Vec::new();
        let mut ids: HashMap<Arc<str>, usize> = HashMap::new();
        let mut stack: Vec<usize> = Vec::new();
        let mut calls: Vec<(usize, usize)> = Vec::new();

        let add = |nodes: &mut Vec<Node>,
                   ids: &mut HashMap<Arc<str>, usize>,
                   stack: &mut Vec<usize>,
                   name: Arc<str>,
                   shape: TypeShape| {
            let id = nodes.len();
            nodes.push(Node {
                edges: shape.references(),
                name: Arc::clone(&name),
                shape,
                index: id,
                low: id,
                on_stack: true,
            });
            ids.insert(name, id);
            stack.push(id);
            id
        };

        let root_id = add(&mut nodes, &mut ids, &mut stack, root, shape);
        calls.push((root_id, 0));

        while let Some(&(v, cursor)) = calls.last() {
            if cursor < nodes[v].edges.len() {
                if let Some(call) = calls.last_mut() {
                    call.1 += 1;
                }
                let target = Arc::clone(&nodes[v].edges[cursor]);
                if let Some(&w) = ids.get(&target) {
                    if nodes[w].on_stack {
                        nodes[v].low = nodes[v].low.min(nodes[w].index);
                    }
                    continue;
                }
                if self.memo.contains_key(&target) {
                    continue;
                }
                if let Some(shape) = self.source.shape_of(&target) {
                    let w = add(&mut nodes, &mut ids, &mut stack, target, shape);
                    calls.push((w, 0));
                }
                continue;
            }

            calls.pop();
            if let Some(&(parent, _)) = calls.last() {
                nodes[parent].low = nodes[parent].low.min(nodes[v].low);
            }
            if nodes[v].low == nodes[v].index {
                let mut members = Vec::new();
                while let Some(id) = stack.pop() {
                    nodes[id].on_stack = false;
                    members.push(id);
                    if id == v {
                        break;
                    }
                }
                self.seal(&nodes, &members);
            }
        }
    }

    fn seal(&mut self, nodes: &[Node], members: &[usize]) {
        let names: BTreeSet<Arc<str>> = members
            .iter()
            .map(|&id| Arc::clone(&nodes[id].name))
            .collect();
        let mut own: Vec<(Arc<str>, Vec<u8>)> = members
            .iter()
            .map(|&id| {
                let node = &nodes[id];
                (Arc::clone(&node.name), self.own_bytes(&node.name, &node.shape, &names))
            })
            .collect();
        own.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, bytes) in &own {
            let mut all = bytes.clone();
            for (other, other_bytes) in &own {
                if other != name {
                    all.extend_from_slice(other_bytes);
                }
            }
            self.memo.insert(Arc::clone(name), Fingerprint::digest(&all));
        }
    }

    fn own_bytes(&self, name: &str, shape: &TypeShape, component: &BTreeSet<Arc<str>>) -> Vec<u8> {
        let mut bytes = Vec::new();
        match shape {
            TypeShape::Composite { fields, interfaces } => {
                put(&mut bytes, "composite");
                put(&mut bytes, name);
                bytes.extend_from_slice(&(fields.len() as u32).to_le_bytes());
                for field in fields {
                    put(&mut bytes, &field.name);
                    put(&mut bytes, &self.token(&field.type_ref, component));
                    bytes.push(u8::from(field.mandatory));
                }
                let sorted: BTreeSet<&str> = interfaces.iter().map(|i| i.as_ref()).collect();
                bytes.extend_from_slice(&(sorted.len() as u32).to_le_bytes());
                for interface in sorted {
                    put(&mut bytes, interface);
                }
            }
            TypeShape::Enum { constants } => {
                put(&mut bytes, "enum");
                put(&mut bytes, name);
                bytes.extend_from_slice(&(constants.len() as u32).to_le_bytes());
                for constant in constants {
                    put(&mut bytes, constant);
                }
            }
            TypeShape::Proxy { proxy } => {
                put(&mut bytes, "proxy");
                put(&mut bytes, name);
                put(&mut bytes, &self.token(proxy, component));
            }
        }
        bytes
    }

    fn token(&self, type_ref: &TypeRef, component: &BTreeSet<Arc<str>>) -> String {
        match type_ref {
            TypeRef::List(element) => format!("list<{}>", self.token(element, component)),
            TypeRef::Map(key, value) => format!(
                "map<{},{}>",
                self.token(key, component),
                self.token(value, component)
            ),
            TypeRef::Named(name) if component.contains(name) => format!("@{}", name),
            TypeRef::Named(name) => match self.memo.get(name) {
                Some(fp) => fp.to_hex(),
                None => name.to_string(),
            },
            primitive => primitive.to_string(),
        }
    }
}

fn put(bytes: &mut Vec<u8>, text: &str) {
    bytes.extend_from_slice(&(text.len() as u32).to_le_bytes());
    bytes.extend_from_slice(text.as_bytes());
}
