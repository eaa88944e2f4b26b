// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//! Tests for type synthesis.

use super::*;
use crate::config::FINGERPRINT_LEN;
use crate::schema::{CompositeNotation, RestrictedNotation};
use crate::types::{FieldShape, Fingerprint, TypeRef};
use std::collections::BTreeSet;

struct Known(BTreeSet<&'static str>);

impl LocalTypes for Known {
    fn resolves_locally(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

fn nothing_local() -> Known {
    Known(BTreeSet::new())
}

fn composite(name: &str, fields: Vec<FieldShape>, interfaces: &[&str]) -> TypeNotation {
    TypeNotation::Composite(CompositeNotation {
        name: Arc::from(name),
        descriptor: Fingerprint::from_bytes([0; FINGERPRINT_LEN]),
        interfaces: interfaces.iter().map(|i| Arc::from(*i)).collect(),
        fields,
    })
}

fn restricted(name: &str, kind: RestrictedKind, elements: Vec<TypeRef>, choices: &[&str]) -> TypeNotation {
    TypeNotation::Restricted(RestrictedNotation {
        name: Arc::from(name),
        kind,
        descriptor: Fingerprint::from_bytes([0; FINGERPRINT_LEN]),
        element_types: elements,
        choices: choices.iter().map(|c| c.to_string()).collect(),
    })
}

fn schema(notations: Vec<TypeNotation>) -> RemoteSchema {
    RemoteSchema::new(RemoteSchema::seal(notations)).expect("valid schema")
}

fn order_schema() -> RemoteSchema {
    schema(vec![
        composite(
            "remote.Order",
            vec![
                FieldShape::new("id", TypeRef::Long, true),
                FieldShape::new("lines", TypeRef::list(TypeRef::named("remote.Line")), true),
                FieldShape::new("status", TypeRef::named("remote.Status"), true),
            ],
            &[],
        ),
        composite(
            "remote.Line",
            vec![
                FieldShape::new("sku", TypeRef::String, true),
                FieldShape::new("order", TypeRef::named("remote.Order"), false),
            ],
            &[],
        ),
        restricted("remote.Status", RestrictedKind::Enum, Vec::new(), &["OPEN", "SHIPPED"]),
        restricted(
            "list<remote.Line>",
            RestrictedKind::List,
            vec![TypeRef::named("remote.Line")],
            &[],
        ),
    ])
}

#[test]
fn test_dependencies_synthesized_and_cached() {
    let carpenter = Carpenter::new();
    let schema = order_schema();

    let order = carpenter
        .synthesize(&schema, "remote.Order", &nothing_local())
        .expect("synthesize");
    assert_eq!(order.kind(), SyntheticKind::Record);
    assert_eq!(order.fields().len(), 3);
    assert_eq!(order.identifier(), &schema.identifier_of("remote.Order").expect("id"));

    // Order, Line (cyclic back to Order) and the enum.
    assert_eq!(carpenter.len(), 3);
    assert!(carpenter.get("remote.Line").is_some());
    assert!(carpenter.get("remote.Status").is_some_and(|s| s.is_enum()));

    let again = carpenter
        .synthesize(&schema, "remote.Order", &nothing_local())
        .expect("cached");
    assert!(Arc::ptr_eq(&order, &again));
}

#[test]
fn test_local_dependencies_are_not_synthesized() {
    let carpenter = Carpenter::new();
    let local = Known(["remote.Line", "remote.Status"].into_iter().collect());
    carpenter
        .synthesize(&order_schema(), "remote.Order", &local)
        .expect("synthesize");
    assert_eq!(carpenter.len(), 1);
    assert!(carpenter.get("remote.Line").is_none());
}

#[test]
fn test_unresolvable_dependency_is_unknown_type() {
    let schema = schema(vec![composite(
        "remote.Box",
        vec![FieldShape::new("content", TypeRef::named("remote.Missing"), true)],
        &[],
    )]);
    let err = Carpenter::new()
        .synthesize(&schema, "remote.Box", &nothing_local())
        .unwrap_err();
    match err {
        SerializationError::UnknownType { type_name, reason } => {
            assert_eq!(type_name, "remote.Missing");
            assert!(reason.contains("remote.Box"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_proxy_dependency_needs_custom_serializer() {
    let schema = schema(vec![
        composite(
            "remote.Payment",
            vec![FieldShape::new("amount", TypeRef::named("remote.Money"), true)],
            &[],
        ),
        restricted("remote.Money", RestrictedKind::Proxy, vec![TypeRef::String], &[]),
    ]);
    let err = Carpenter::new()
        .synthesize(&schema, "remote.Payment", &nothing_local())
        .unwrap_err();
    assert!(matches!(err, SerializationError::UnknownType { .. }));
}

#[test]
fn test_interfaces_kept_or_dropped() {
    let schema = schema(vec![
        composite("remote.Circle", vec![FieldShape::new("r", TypeRef::Double, true)], &[
            "remote.Shape",
            "remote.Undocumented",
        ]),
        composite("remote.Shape", Vec::new(), &[]),
        composite(
            "remote.Drawing",
            vec![FieldShape::new("main", TypeRef::named("remote.Named"), true)],
            &[],
        ),
        composite("remote.Named", vec![FieldShape::new("label", TypeRef::String, true)], &[]),
        composite("remote.Label", vec![FieldShape::new("label", TypeRef::String, true)], &[
            "remote.Named",
        ]),
    ]);

    // Circle has no local type, so Shape must exist for it; the interface
    // without a notation is dropped.
    let carpenter = Carpenter::new();
    let circle = carpenter
        .synthesize(&schema, "remote.Circle", &nothing_local())
        .expect("circle");
    let kept: Vec<&str> = circle.interfaces().iter().map(|i| i.as_ref()).collect();
    assert_eq!(kept, ["remote.Shape"]);
    assert!(carpenter.get("remote.Shape").is_some_and(|s| s.is_interface()));

    // Every implementor of Named resolves locally: no synthetic Named.
    let local = Known(["remote.Label"].into_iter().collect());
    let carpenter = Carpenter::new();
    carpenter
        .synthesize(&schema, "remote.Drawing", &local)
        .expect("drawing");
    assert!(carpenter.get("remote.Named").is_none());
}
