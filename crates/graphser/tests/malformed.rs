// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic

//! Corrupt and hostile input must fail cleanly with `MalformedStream`.

mod common;

use common::*;
use graphser::config::tags;
use graphser::{EngineConfig, SerializationContext, SerializationError, TypeRegistry};

fn decode(bytes: &[u8]) -> SerializationError {
    dispatcher(shop_registry())
        .deserialize_value(bytes, &SerializationContext::testing())
        .unwrap_err()
}

fn assert_malformed(err: SerializationError, needle: &str) {
    match err {
        SerializationError::MalformedStream { reason } => {
            assert!(reason.contains(needle), "{:?} does not mention {:?}", reason, needle)
        }
        other => panic!("expected MalformedStream, got {:?}", other),
    }
}

#[test]
fn test_empty_and_foreign_input() {
    assert_malformed(decode(b""), "shorter than header");
    assert_malformed(decode(b"PK\x03\x04\x00"), "bad magic");
}

#[test]
fn test_truncated_message() {
    let order = sample_order();
    let bytes = dispatcher(shop_registry())
        .serialize(&order, &SerializationContext::testing())
        .expect("encode");

    for cut in [6, bytes.len() / 2, bytes.len() - 1] {
        let err = decode(&bytes[..cut]);
        assert!(
            matches!(err, SerializationError::MalformedStream { .. }),
            "cut at {}: {:?}",
            cut,
            err
        );
    }
}

#[test]
fn test_trailing_bytes_rejected() {
    let mut message = raw_message(&[tags::NULL]);
    message.push(0x00);
    assert_malformed(decode(&message), "trailing");
}

#[test]
fn test_reference_to_unknown_object() {
    let mut data = vec![tags::LIST];
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&reference(7));
    assert_malformed(decode(&raw_message(&data)), "reference to unknown object 7");
}

#[test]
fn test_unknown_tag() {
    assert_malformed(decode(&raw_message(&[0xEE])), "unknown value tag");
}

#[test]
fn test_deep_nesting_bounded() {
    let mut data = Vec::new();
    for _ in 0..200 {
        data.push(tags::LIST);
        data.extend_from_slice(&1u32.to_le_bytes());
    }
    data.push(tags::NULL);
    assert_malformed(decode(&raw_message(&data)), "nesting deeper than 128");
}

#[test]
fn test_collection_limit() {
    let config = EngineConfig {
        max_collection_len: 4,
        ..EngineConfig::default()
    };
    let mut data = vec![tags::LIST];
    data.extend_from_slice(&10u32.to_le_bytes());
    data.extend(std::iter::repeat(tags::NULL).take(10));

    let err = dispatcher_with(TypeRegistry::new(), config)
        .deserialize_value(&raw_message(&data), &SerializationContext::testing())
        .unwrap_err();
    assert_malformed(err, "exceeds limit 4");
}

#[test]
fn test_forged_length_does_not_allocate() {
    let mut data = vec![tags::STRING];
    data.extend_from_slice(&u32::MAX.to_le_bytes());
    data.extend_from_slice(b"short");
    assert_malformed(decode(&raw_message(&data)), "exceeds remaining");
}

#[test]
fn test_message_size_limit() {
    let config = EngineConfig {
        max_message_size: 16,
        ..EngineConfig::default()
    };
    let data = vec![tags::NULL; 64];
    let err = dispatcher_with(TypeRegistry::new(), config)
        .deserialize_value(&raw_message(&data), &SerializationContext::testing())
        .unwrap_err();
    assert_malformed(err, "exceeds limit 16");
}

#[test]
fn test_schema_count_beyond_body() {
    let mut message = raw_message(&[]);
    let len = message.len();
    message[len - 4..].copy_from_slice(&1000u32.to_le_bytes());
    assert!(matches!(
        decode(&message),
        SerializationError::MalformedStream { .. }
    ));
}
