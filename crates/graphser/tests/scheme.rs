// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic

//! Scheme selection, factory caching under load, and code-loading scopes.

mod common;

use common::*;
use graphser::types::RegisteredType;
use graphser::{
    CodeLoadingScope, CodeReference, CodeResolver, EngineConfig, EnumRegistration, GraphScheme,
    SchemeDispatcher, SerializationContext, SerializationError, TypeLoader, TypeRef,
    TypeRegistration, TypeRegistry, UseCase, Value, Whitelist,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn graph(config: EngineConfig) -> Arc<GraphScheme> {
    Arc::new(GraphScheme::new(Arc::new(shop_registry()), config))
}

#[test]
fn test_overlapping_schemes_are_misconfiguration() {
    let dispatcher = SchemeDispatcher::new()
        .with_scheme(graph(EngineConfig::default()))
        .with_scheme(Arc::new(
            GraphScheme::new(Arc::new(TypeRegistry::new()), EngineConfig::default())
                .for_use_cases([UseCase::Storage]),
        ));

    assert!(dispatcher.validate(&[UseCase::P2p]).is_ok());
    let err = dispatcher
        .serialize_value(&Value::Null, &SerializationContext::storage())
        .unwrap_err();
    assert!(matches!(err, SerializationError::Misconfiguration { .. }), "{:?}", err);
}

#[test]
fn test_unclaimed_use_case_is_misconfiguration() {
    let dispatcher = SchemeDispatcher::new().with_scheme(Arc::new(
        GraphScheme::new(Arc::new(TypeRegistry::new()), EngineConfig::default())
            .for_use_cases([UseCase::Storage]),
    ));
    let err = dispatcher
        .deserialize_value(b"gsr", &SerializationContext::checkpoint())
        .unwrap_err();
    assert!(err.to_string().contains("checkpoint"), "{}", err);
}

#[test]
fn test_factory_cache_bounded_under_concurrent_load() {
    let scheme = graph(EngineConfig {
        factory_cache_capacity: 4,
        ..EngineConfig::default()
    });
    let dispatcher = SchemeDispatcher::new().with_scheme(scheme.clone());
    let order = sample_order();

    std::thread::scope(|s| {
        for worker in 0..8 {
            let dispatcher = &dispatcher;
            let order = &order;
            s.spawn(move || {
                for round in 0..6 {
                    let context = SerializationContext::p2p().with_whitelist(&Whitelist::of([
                        "shop.Order".to_string(),
                        "shop.Line".to_string(),
                        format!("tenant{}.round{}", worker, round),
                    ]));
                    let bytes = dispatcher.serialize(order, &context).expect("encode");
                    let back: Order = dispatcher.deserialize(&bytes, &context).expect("decode");
                    assert_eq!(&back, order);
                }
            });
        }
    });

    assert_eq!(scheme.cached_factories(), 4);
}

#[test]
fn test_distinct_remote_types_do_not_grow_a_factory() {
    let scheme = Arc::new(GraphScheme::new(
        Arc::new(TypeRegistry::new()),
        EngineConfig {
            remote_type_cache_capacity: 8,
            ..EngineConfig::default()
        },
    ));
    let reader = SchemeDispatcher::new().with_scheme(scheme.clone());
    let context = SerializationContext::testing();

    for i in 0..40 {
        let registration = TypeRegistration::builder::<Line>(format!("peer.T{}", i))
            .property("sku", TypeRef::String, |l: &Line| l.sku.clone().into())
            .property("qty", TypeRef::Int, |l: &Line| l.qty.into())
            .constructor(&["sku", "qty"], |args| {
                Ok(Line {
                    sku: args.take("sku")?,
                    qty: args.take("qty")?,
                })
            })
            .build()
            .expect("registration");
        let writer = dispatcher(TypeRegistry::new().with(registration).expect("registry"));
        let bytes = writer
            .serialize(&Line { sku: "S".into(), qty: i }, &context)
            .expect("encode");
        let value = reader.deserialize_value(&bytes, &context).expect("decode");
        assert_eq!(value.as_record().map(|r| r.type_name().to_string()), Some(format!("peer.T{}", i)));
    }

    let factory = scheme.factory_for(&context).expect("factory");
    assert_eq!(scheme.cached_factories(), 1);
    assert!(factory.carpenter().len() <= 8, "{} synthesized", factory.carpenter().len());
    assert!(factory.reader_count() <= 8, "{} readers", factory.reader_count());
}

#[test]
fn test_same_context_reuses_factory() {
    let scheme = graph(EngineConfig::default());
    let context = SerializationContext::p2p().with_whitelist(&Whitelist::of(["shop.Order"]));
    let first = scheme.factory_for(&context).expect("factory");
    first.serializer_for("shop.Order").expect("serializer");

    let second = scheme.factory_for(&context.clone()).expect("factory");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.serializer_count(), 1);
}

// ============================================================================
// Code-loading scopes
// ============================================================================

struct Bundles {
    fetches: AtomicUsize,
}

impl CodeResolver for Bundles {
    fn resolve_code_for_reference(&self, reference: &CodeReference) -> Option<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        reference
            .as_str()
            .strip_prefix("bundle:")
            .map(|name| name.as_bytes().to_vec())
    }
}

/// Each bundle defines one enum named after the bundle.
struct EnumLoader;

impl TypeLoader for EnumLoader {
    fn load(&self, _reference: &CodeReference, code: &[u8]) -> graphser::Result<Vec<RegisteredType>> {
        let name = String::from_utf8_lossy(code).to_string();
        Ok(vec![RegisteredType::Enum(Arc::new(EnumRegistration::new(
            name,
            ["ON", "OFF"],
        )))])
    }
}

#[test]
fn test_scoped_types_visible_to_scoped_contexts() {
    let bundles = Arc::new(Bundles {
        fetches: AtomicUsize::new(0),
    });
    let config = EngineConfig {
        scope_cache_capacity: 4,
        ..EngineConfig::default()
    };
    let scheme = Arc::new(
        GraphScheme::new(Arc::new(TypeRegistry::new()), config)
            .with_code_loading(bundles.clone(), Arc::new(EnumLoader)),
    );
    assert_eq!(scheme.scope_loader().map(|l| l.capacity()), Some(4));
    let dispatcher = SchemeDispatcher::new().with_scheme(scheme);

    let scoped = SerializationContext::storage()
        .with_code_scope(CodeLoadingScope::of(["bundle:plugin.Switch"]));
    let value = Value::enum_constant("plugin.Switch", "ON");
    let bytes = dispatcher.serialize_value(&value, &scoped).expect("encode");
    let back = dispatcher.deserialize_value(&bytes, &scoped).expect("decode");
    assert_eq!(back, value);
    assert_eq!(bundles.fetches.load(Ordering::SeqCst), 1);

    let unscoped = dispatcher
        .serialize_value(&value, &SerializationContext::storage())
        .unwrap_err();
    assert!(matches!(unscoped, SerializationError::NotSerializable { .. }), "{:?}", unscoped);

    let missing = SerializationContext::storage()
        .with_code_scope(CodeLoadingScope::of(["elsewhere:plugin.Lamp"]));
    let err = dispatcher.serialize_value(&value, &missing).unwrap_err();
    assert!(matches!(err, SerializationError::UnknownType { .. }), "{:?}", err);
}
