// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed failures returned by every encode/decode path.
//!
//! None of these are retried internally. The calling subsystem decides whether
//! to retry (for example after re-fetching missing code) or surface the failure.

use crate::wire::WireError;
use thiserror::Error;

/// Errors returned by graphser operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    // ========================================================================
    // Admission / security
    // ========================================================================
    /// The admission policy denied construction of this type.
    #[error("type {type_name} is not whitelisted for deserialization")]
    NotWhitelisted { type_name: String },

    // ========================================================================
    // Schema evolution
    // ========================================================================
    /// Bytes written for an older shape cannot be reconciled with the local shape.
    #[error("cannot evolve {type_name}: {reason}")]
    SchemaMismatchUnrecoverable { type_name: String, reason: String },

    /// Two differently shaped types share a fingerprint.
    ///
    /// Only returned when `EngineConfig::reject_fingerprint_collisions` is set;
    /// otherwise the collision is logged and the evolution path is taken.
    #[error("fingerprint collision suspected for {type_name} ({fingerprint})")]
    FingerprintCollisionSuspected {
        type_name: String,
        fingerprint: String,
    },

    // ========================================================================
    // Type resolution
    // ========================================================================
    /// No local type exists and synthesis could not resolve it.
    #[error("unknown type {type_name}: {reason}")]
    UnknownType { type_name: String, reason: String },

    /// The decoded root is not an instance of the requested Rust type.
    #[error("unexpected root type: expected {expected}, found {found}")]
    UnexpectedType { expected: String, found: String },

    /// Encode-side failure: unregistered type, bad registration, or a value
    /// that does not match its declared property type.
    #[error("{type_name} is not serializable: {reason}")]
    NotSerializable { type_name: String, reason: String },

    // ========================================================================
    // Stream integrity
    // ========================================================================
    /// Schema or data section is internally inconsistent (corrupt or adversarial input).
    #[error("malformed stream: {reason}")]
    MalformedStream { reason: String },

    /// Payload encoding is unknown or not allowed by the context.
    #[error("unsupported payload encoding: {encoding}")]
    UnsupportedEncoding { encoding: String },

    // ========================================================================
    // Configuration
    // ========================================================================
    /// Scheme registration does not select exactly one scheme for a use-case.
    #[error("serialization misconfigured: {reason}")]
    Misconfiguration { reason: String },
}

impl SerializationError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedStream {
            reason: reason.into(),
        }
    }

    pub(crate) fn not_serializable(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotSerializable {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaMismatchUnrecoverable {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn misconfigured(reason: impl Into<String>) -> Self {
        Self::Misconfiguration {
            reason: reason.into(),
        }
    }
}

impl From<WireError> for SerializationError {
    fn from(err: WireError) -> Self {
        Self::MalformedStream {
            reason: err.to_string(),
        }
    }
}

/// Result alias used throughout graphser.
pub type Result<T> = core::result::Result<T, SerializationError>;
