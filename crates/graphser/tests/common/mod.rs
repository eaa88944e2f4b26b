// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared fixtures for graphser integration tests.

#![allow(dead_code)]

use graphser::config::tags;
use graphser::wire::{Encoding, Header};
use graphser::{
    EngineConfig, FromValue, GraphScheme, SchemeDispatcher, SerializationError, TypeRef,
    TypeRegistration, TypeRegistry, Value,
};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub sku: String,
    pub qty: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Open,
    Shipped,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Open => "OPEN",
            Status::Shipped => "SHIPPED",
        }
    }
}

impl FromValue for Status {
    fn from_value(value: Value) -> graphser::Result<Self> {
        match value.as_enum_constant() {
            Some("OPEN") => Ok(Status::Open),
            Some("SHIPPED") => Ok(Status::Shipped),
            _ => Err(SerializationError::MalformedStream {
                reason: format!("not a shop.Status: {:?}", value),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub paid: bool,
    pub total: f64,
    pub status: Status,
    pub lines: Vec<Arc<Line>>,
    pub tags: BTreeMap<String, i64>,
    pub signature: Vec<u8>,
    pub note: Option<String>,
}

pub fn line_registration() -> TypeRegistration {
    TypeRegistration::builder::<Line>("shop.Line")
        .property("sku", TypeRef::String, |l: &Line| l.sku.clone().into())
        .property("qty", TypeRef::Int, |l: &Line| l.qty.into())
        .constructor(&["sku", "qty"], |args| {
            Ok(Line {
                sku: args.take("sku")?,
                qty: args.take("qty")?,
            })
        })
        .build()
        .expect("shop.Line")
}

pub fn order_registration() -> TypeRegistration {
    TypeRegistration::builder::<Order>("shop.Order")
        .property("id", TypeRef::Long, |o: &Order| o.id.into())
        .property("paid", TypeRef::Bool, |o: &Order| o.paid.into())
        .property("total", TypeRef::Double, |o: &Order| o.total.into())
        .property("status", TypeRef::named("shop.Status"), |o: &Order| {
            Value::enum_constant("shop.Status", o.status.as_str())
        })
        .property(
            "lines",
            TypeRef::list(TypeRef::named("shop.Line")),
            |o: &Order| o.lines.clone().into(),
        )
        .property(
            "tags",
            TypeRef::map(TypeRef::String, TypeRef::Long),
            |o: &Order| o.tags.clone().into(),
        )
        .property("signature", TypeRef::Binary, |o: &Order| {
            Value::Binary(o.signature.clone())
        })
        .nullable_property("note", TypeRef::String, |o: &Order| o.note.clone().into())
        .constructor(
            &["id", "paid", "total", "status", "lines", "tags", "signature", "note"],
            |args| {
                Ok(Order {
                    id: args.take("id")?,
                    paid: args.take("paid")?,
                    total: args.take("total")?,
                    status: args.take("status")?,
                    lines: args.take("lines")?,
                    tags: args.take("tags")?,
                    signature: graphser::types::binary_from_value(args.take("signature")?)?,
                    note: args.take("note")?,
                })
            },
        )
        .build()
        .expect("shop.Order")
}

pub fn shop_registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(line_registration())
        .and_then(|r| r.with(order_registration()))
        .and_then(|r| {
            r.with_enum(graphser::EnumRegistration::new(
                "shop.Status",
                ["OPEN", "SHIPPED"],
            ))
        })
        .expect("shop registry")
}

pub fn sample_order() -> Order {
    let widget = Arc::new(Line {
        sku: "W-1".into(),
        qty: 3,
    });
    Order {
        id: 42,
        paid: true,
        total: 19.5,
        status: Status::Shipped,
        lines: vec![
            Arc::clone(&widget),
            Arc::new(Line {
                sku: "G-7".into(),
                qty: 1,
            }),
            widget,
        ],
        tags: BTreeMap::from([("priority".to_string(), 2), ("region".to_string(), 7)]),
        signature: vec![0xde, 0xad, 0xbe, 0xef],
        note: None,
    }
}

pub fn dispatcher(registry: TypeRegistry) -> SchemeDispatcher {
    dispatcher_with(registry, EngineConfig::default())
}

pub fn dispatcher_with(registry: TypeRegistry, config: EngineConfig) -> SchemeDispatcher {
    SchemeDispatcher::new().with_scheme(Arc::new(GraphScheme::new(Arc::new(registry), config)))
}

/// A message with an empty schema section followed by `data`.
pub fn raw_message(data: &[u8]) -> Vec<u8> {
    let mut message = Header::current(Encoding::Plain).to_bytes().to_vec();
    message.extend_from_slice(&0u32.to_le_bytes());
    message.extend_from_slice(data);
    message
}

pub fn reference(index: u32) -> Vec<u8> {
    let mut data = vec![tags::REFERENCE];
    data.extend_from_slice(&index.to_le_bytes());
    data
}
