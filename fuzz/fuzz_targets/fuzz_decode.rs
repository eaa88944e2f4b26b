// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use graphser::serializer::decode;
use graphser::{EngineConfig, SerializationContext, SerializerFactory, TypeRegistry, Whitelist};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    // Small limits keep each run cheap; every composite is synthesized
    let config = EngineConfig {
        max_depth: 32,
        max_collection_len: 1024,
        max_message_size: 64 * 1024,
        ..EngineConfig::default()
    };
    let factory = SerializerFactory::new(
        Arc::new(TypeRegistry::new()),
        Whitelist::empty(),
        Vec::new(),
        config,
    );
    let _ = decode(&factory, data, &SerializationContext::testing());
});
