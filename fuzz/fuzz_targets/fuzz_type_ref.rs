// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use graphser::TypeRef;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Whatever parses must print back to a string that parses the same
        if let Ok(parsed) = TypeRef::parse(text) {
            let printed = parsed.to_string();
            assert_eq!(TypeRef::parse(&printed).ok(), Some(parsed));
        }
    }
});
