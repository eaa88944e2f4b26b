// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte-level helpers for the graphser wire format.
//!
//! `[magic "gsr" + version][encoding][body]`, where the body holds the
//! schema section followed by the data section.

pub mod cursor;
pub mod header;

pub use cursor::{Cursor, Writer};
pub use header::{decode_body, encode_body, has_magic, Encoding, Header};

use thiserror::Error;

/// Low-level cursor failure; surfaces as `SerializationError::MalformedStream`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("read failed at offset {offset}: {reason}")]
    ReadFailed { offset: usize, reason: String },
    #[error("invalid data at offset {offset}: {reason}")]
    InvalidData { offset: usize, reason: String },
    #[error("length {len} does not fit a u32 prefix")]
    LengthOverflow { len: usize },
}

pub type WireResult<T> = core::result::Result<T, WireError>;
