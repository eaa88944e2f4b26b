// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//! Tests for the serializer factory.

use super::*;
use crate::serializer::custom::ProxySerializer;
use crate::types::{FromValue, Value};

#[derive(Debug, Clone, PartialEq)]
struct Item {
    sku: String,
    qty: i32,
    note: Option<String>,
}

#[derive(Debug, PartialEq)]
struct Money(i64);

fn registry() -> Arc<TypeRegistry> {
    let priced = TypeRegistration::interface("shop.Priced")
        .property("sku", TypeRef::String, false)
        .build()
        .expect("interface");
    let item = TypeRegistration::builder::<Item>("shop.Item")
        .property("sku", TypeRef::String, |i: &Item| i.sku.clone().into())
        .property("qty", TypeRef::Int, |i: &Item| i.qty.into())
        .nullable_property("note", TypeRef::String, |i: &Item| i.note.clone().into())
        .constructor(&["sku", "qty", "note"], |args| {
            Ok(Item {
                sku: args.take("sku")?,
                qty: args.take("qty")?,
                note: args.take("note")?,
            })
        })
        .implements("shop.Priced")
        .build()
        .expect("registration");
    let registry = TypeRegistry::new()
        .with(priced)
        .and_then(|r| r.with(item))
        .and_then(|r| r.with_enum(EnumRegistration::new("shop.Size", ["S", "M", "L"])))
        .expect("registry");
    Arc::new(registry)
}

fn money() -> Arc<dyn CustomSerializer> {
    Arc::new(ProxySerializer::new(
        "shop.Money",
        TypeRef::Long,
        |m: &Money| Value::Long(m.0),
        |v| Ok(Money(i64::from_value(v)?)),
    ))
}

fn factory_with(config: EngineConfig) -> SerializerFactory {
    SerializerFactory::new(registry(), Whitelist::empty(), vec![money()], config)
}

fn factory() -> SerializerFactory {
    factory_with(EngineConfig::default())
}

fn remote(notations: Vec<TypeNotation>) -> RemoteSchema {
    RemoteSchema::new(RemoteSchema::seal(notations)).expect("valid schema")
}

fn item_notation(fields: Vec<FieldShape>) -> TypeNotation {
    TypeNotation::Composite(CompositeNotation {
        name: Arc::from("shop.Item"),
        descriptor: Fingerprint::from_bytes([0; crate::config::FINGERPRINT_LEN]),
        interfaces: vec![Arc::from("shop.Priced")],
        fields,
    })
}

#[test]
fn test_fingerprints_stable_across_factories() {
    let a = factory();
    let b = factory();
    for name in ["shop.Item", "shop.Priced", "shop.Size", "shop.Money"] {
        assert_eq!(
            a.fingerprint_of(name).expect("fingerprint"),
            b.fingerprint_of(name).expect("fingerprint"),
            "{}",
            name
        );
    }
    assert_ne!(
        a.fingerprint_of("shop.Item").expect("fingerprint"),
        a.fingerprint_of("shop.Priced").expect("fingerprint")
    );
}

#[test]
fn test_serializer_built_once() {
    let factory = factory();
    let first = factory.serializer_for("shop.Item").expect("serializer");
    let second = factory.serializer_for("shop.Item").expect("serializer");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(factory.serializer_count(), 1);
    assert!(!first.is_abstract());

    let priced = factory.serializer_for("shop.Priced").expect("serializer");
    assert!(priced.is_abstract());
    assert!(priced.as_concrete().is_err());
}

#[test]
fn test_unknown_type_has_no_serializer() {
    let err = factory().serializer_for("shop.Ghost").unwrap_err();
    assert!(matches!(err, SerializationError::UnknownType { .. }), "{:?}", err);
}

#[test]
fn test_type_name_of() {
    let factory = factory();
    let item = Item {
        sku: "A1".into(),
        qty: 2,
        note: None,
    };
    assert_eq!(factory.type_name_of(&item).expect("name").as_ref(), "shop.Item");
    assert_eq!(factory.type_name_of(&Money(5)).expect("name").as_ref(), "shop.Money");
    assert!(factory.type_name_of(&42_u8).is_err());
}

#[test]
fn test_is_assignable() {
    let factory = factory();
    assert!(factory.is_assignable("shop.Item", "shop.Item"));
    assert!(factory.is_assignable("shop.Item", "shop.Priced"));
    assert!(!factory.is_assignable("shop.Priced", "shop.Item"));
    assert!(!factory.is_assignable("shop.Item", "shop.Size"));
}

#[test]
fn test_custom_serializer_described_as_proxy() {
    let notation = factory().notation_for("shop.Money").expect("notation");
    let restricted = notation.as_restricted().expect("restricted");
    assert_eq!(restricted.kind, RestrictedKind::Proxy);
    assert_eq!(restricted.element_types, vec![TypeRef::Long]);
}

#[test]
fn test_reader_for_matching_shape_is_object() {
    let factory = factory();
    let local = factory.notation_for("shop.Item").expect("notation");
    let schema = remote(vec![local.as_ref().clone()]);
    let notation = Arc::clone(schema.get("shop.Item").expect("notation"));

    let strategy = factory.reader_for(&schema, &notation).expect("strategy");
    assert!(matches!(strategy.as_ref(), DecodeStrategy::Object(_)), "{:?}", strategy);
    let again = factory.reader_for(&schema, &notation).expect("strategy");
    assert!(Arc::ptr_eq(&strategy, &again));
}

#[test]
fn test_reader_for_older_shape_is_evolution() {
    let factory = factory();
    let schema = remote(vec![item_notation(vec![
        FieldShape::new("sku", TypeRef::String, true),
        FieldShape::new("qty", TypeRef::Int, true),
    ])]);
    let notation = Arc::clone(schema.get("shop.Item").expect("notation"));

    match factory.reader_for(&schema, &notation).expect("strategy").as_ref() {
        DecodeStrategy::Evolution(evolution) => {
            let object = evolution
                .construct(vec![Value::from("A1"), Value::Int(3)])
                .expect("construct");
            let item = object.downcast_ref::<Item>().expect("Item");
            assert_eq!(item.qty, 3);
            assert_eq!(item.note, None);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_same_fingerprint_different_fields() {
    let local_fp = factory().fingerprint_of("shop.Item").expect("fingerprint");
    let collided = CompositeNotation {
        name: Arc::from("shop.Item"),
        descriptor: local_fp,
        interfaces: Vec::new(),
        fields: vec![
            FieldShape::new("sku", TypeRef::String, true),
            FieldShape::new("qty", TypeRef::Int, true),
        ],
    };

    let lenient = factory();
    let registration = Arc::clone(lenient.registry().composite("shop.Item").expect("registered"));
    let strategy = lenient
        .composite_reader("shop.Item", Arc::clone(&registration), &collided)
        .expect("evolves");
    assert!(matches!(strategy, DecodeStrategy::Evolution(_)));

    let strict = factory_with(EngineConfig {
        reject_fingerprint_collisions: true,
        ..EngineConfig::default()
    });
    let err = strict
        .composite_reader("shop.Item", registration, &collided)
        .unwrap_err();
    assert!(
        matches!(err, SerializationError::FingerprintCollisionSuspected { .. }),
        "{:?}",
        err
    );
}

#[test]
fn test_reader_for_unknown_type_synthesizes() {
    let factory = factory();
    let schema = remote(vec![TypeNotation::Composite(CompositeNotation {
        name: Arc::from("other.Ticket"),
        descriptor: Fingerprint::from_bytes([0; crate::config::FINGERPRINT_LEN]),
        interfaces: Vec::new(),
        fields: vec![FieldShape::new("seat", TypeRef::String, true)],
    })]);
    let notation = Arc::clone(schema.get("other.Ticket").expect("notation"));

    match factory.reader_for(&schema, &notation).expect("strategy").as_ref() {
        DecodeStrategy::Synthetic(synthetic) => {
            assert_eq!(synthetic.name(), "other.Ticket");
            assert_eq!(synthetic.fields().len(), 1);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(factory.carpenter().len(), 1);
    assert!(factory.shape_of("other.Ticket").is_some());
    assert!(!factory.resolves_locally("other.Ticket"));
}

#[test]
fn test_reader_for_proxy_type_mismatch() {
    let factory = factory();
    let schema = remote(vec![TypeNotation::Restricted(RestrictedNotation {
        name: Arc::from("shop.Money"),
        kind: RestrictedKind::Proxy,
        descriptor: Fingerprint::from_bytes([0; crate::config::FINGERPRINT_LEN]),
        element_types: vec![TypeRef::String],
        choices: Vec::new(),
    })]);
    let notation = Arc::clone(schema.get("shop.Money").expect("notation"));
    let err = factory.reader_for(&schema, &notation).unwrap_err();
    assert!(
        matches!(err, SerializationError::SchemaMismatchUnrecoverable { .. }),
        "{:?}",
        err
    );
}

#[test]
fn test_reader_for_proxy_without_custom_serializer() {
    let factory = SerializerFactory::new(registry(), Whitelist::empty(), Vec::new(), EngineConfig::default());
    let schema = remote(vec![TypeNotation::Restricted(RestrictedNotation {
        name: Arc::from("shop.Money"),
        kind: RestrictedKind::Proxy,
        descriptor: Fingerprint::from_bytes([0; crate::config::FINGERPRINT_LEN]),
        element_types: vec![TypeRef::Long],
        choices: Vec::new(),
    })]);
    let notation = Arc::clone(schema.get("shop.Money").expect("notation"));
    let err = factory.reader_for(&schema, &notation).unwrap_err();
    assert!(matches!(err, SerializationError::UnknownType { .. }), "{:?}", err);
}

#[test]
fn test_duplicate_custom_serializer_keeps_first() {
    let second: Arc<dyn CustomSerializer> = Arc::new(ProxySerializer::new(
        "shop.Money",
        TypeRef::String,
        |m: &Money| Value::from(m.0.to_string()),
        |_| Ok(Money(0)),
    ));
    let factory = SerializerFactory::new(
        registry(),
        Whitelist::empty(),
        vec![money(), second],
        EngineConfig::default(),
    );
    let custom = factory.custom("shop.Money").expect("custom");
    assert_eq!(custom.proxy_type(), TypeRef::Long);
}

#[test]
fn test_remote_type_caches_are_bounded() {
    let factory = factory_with(EngineConfig {
        remote_type_cache_capacity: 4,
        ..EngineConfig::default()
    });
    for i in 0..50 {
        let name = format!("peer.T{}", i);
        let schema = remote(vec![TypeNotation::Composite(CompositeNotation {
            name: Arc::from(name.as_str()),
            descriptor: Fingerprint::from_bytes([0; crate::config::FINGERPRINT_LEN]),
            interfaces: Vec::new(),
            fields: vec![FieldShape::new("v", TypeRef::Int, true)],
        })]);
        let notation = Arc::clone(schema.get(&name).expect("notation"));
        factory.reader_for(&schema, &notation).expect("strategy");
    }
    assert!(factory.reader_count() <= 4, "{} readers", factory.reader_count());
    assert!(factory.carpenter().len() <= 4, "{} synthesized", factory.carpenter().len());
    assert!(factory.carpenter().get("peer.T49").is_some());
    assert!(factory.carpenter().get("peer.T0").is_none());
}

#[test]
fn test_failed_reader_build_leaves_no_entry() {
    let factory = SerializerFactory::new(registry(), Whitelist::empty(), Vec::new(), EngineConfig::default());
    let schema = remote(vec![TypeNotation::Restricted(RestrictedNotation {
        name: Arc::from("shop.Money"),
        kind: RestrictedKind::Proxy,
        descriptor: Fingerprint::from_bytes([0; crate::config::FINGERPRINT_LEN]),
        element_types: vec![TypeRef::Long],
        choices: Vec::new(),
    })]);
    let notation = Arc::clone(schema.get("shop.Money").expect("notation"));
    for _ in 0..3 {
        assert!(factory.reader_for(&schema, &notation).is_err());
    }
    assert_eq!(factory.reader_count(), 0);
    assert_eq!(factory.readers.slot_count(), 0);
}
