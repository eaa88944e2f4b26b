// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! graphser configuration - wire constants and runtime limits.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: wire constants (magic, format version, value tags)
//! - **Level 2 (Dynamic)**: [`EngineConfig`] for cache capacities and decode limits,
//!   loadable from YAML (`config-loaders` feature) and overridable from the
//!   environment.
//!
//! # Example
//!
//! ```ignore
//! use graphser::config::EngineConfig;
//!
//! let config = EngineConfig::from_yaml_str("max_depth: 64")?.with_env_overrides();
//! assert_eq!(config.max_depth, 64);
//! ```

use serde::Deserialize;

// =======================================================================
// Wire format
// =======================================================================

/// Magic prefix of every encoded message.
pub const MAGIC: [u8; 3] = *b"gsr";

/// Current format version written after [`MAGIC`].
pub const FORMAT_VERSION: u8 = 1;

/// Header length: magic + version + encoding byte.
pub const HEADER_LEN: usize = MAGIC.len() + 2;

/// Length of a structural fingerprint (SHA-256).
pub const FINGERPRINT_LEN: usize = 32;

/// Value tags of the data section.
pub mod tags {
    pub const NULL: u8 = 0x00;
    pub const BOOL: u8 = 0x01;
    pub const INT: u8 = 0x02;
    pub const LONG: u8 = 0x03;
    pub const DOUBLE: u8 = 0x04;
    pub const STRING: u8 = 0x05;
    pub const BINARY: u8 = 0x06;
    pub const LIST: u8 = 0x10;
    pub const MAP: u8 = 0x11;
    pub const ENUM: u8 = 0x12;
    pub const OBJECT: u8 = 0x20;
    pub const REFERENCE: u8 = 0x21;
    pub const CUSTOM: u8 = 0x22;
}

// =======================================================================
// Runtime defaults
// =======================================================================

/// Default number of serializer factories kept per scheme.
pub const DEFAULT_FACTORY_CACHE_CAPACITY: usize = 128;

/// Default number of loaded code scopes kept in memory.
pub const DEFAULT_SCOPE_CACHE_CAPACITY: usize = 32;

/// Default number of remote types (decode strategies, synthesized types)
/// kept per serializer factory.
pub const DEFAULT_REMOTE_TYPE_CACHE_CAPACITY: usize = 1024;

/// Default maximum nesting depth of a decoded graph.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default maximum element count of a single list or map.
pub const DEFAULT_MAX_COLLECTION_LEN: usize = 1 << 20;

/// Default maximum (decompressed) message body size: 16 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Environment variable prefix consulted by [`EngineConfig::with_env_overrides`].
pub const ENV_PREFIX: &str = "GRAPHSER_";

/// Runtime limits and cache capacities of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Serializer factories kept per scheme (one per whitelist/scope/custom set).
    pub factory_cache_capacity: usize,
    /// Loaded code scopes kept by the scope loader.
    pub scope_cache_capacity: usize,
    /// Remote types kept per factory; should exceed the distinct types of
    /// one message.
    pub remote_type_cache_capacity: usize,
    /// Maximum nesting depth for encode and decode.
    pub max_depth: usize,
    /// Maximum element count of a list or map on decode.
    pub max_collection_len: usize,
    /// Maximum message body size after decompression.
    pub max_message_size: usize,
    /// Fail instead of evolving when two shapes share a fingerprint.
    pub reject_fingerprint_collisions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            factory_cache_capacity: DEFAULT_FACTORY_CACHE_CAPACITY,
            scope_cache_capacity: DEFAULT_SCOPE_CACHE_CAPACITY,
            remote_type_cache_capacity: DEFAULT_REMOTE_TYPE_CACHE_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
            max_collection_len: DEFAULT_MAX_COLLECTION_LEN,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            reject_fingerprint_collisions: false,
        }
    }
}

/// Errors raised while loading an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "config-loaders")]
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl EngineConfig {
    /// Parse a YAML document; missing keys keep their defaults.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML config file.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Apply `GRAPHSER_*` environment overrides, ignoring unparsable values.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read_usize = |key: &str, current: usize| -> usize {
            match lookup(key).map(|raw| raw.trim().parse::<usize>()) {
                Some(Ok(value)) if value > 0 => value,
                Some(_) => {
                    log::warn!("[config] ignoring invalid {}{}", ENV_PREFIX, key);
                    current
                }
                None => current,
            }
        };

        self.factory_cache_capacity =
            read_usize("FACTORY_CACHE_CAPACITY", self.factory_cache_capacity);
        self.scope_cache_capacity = read_usize("SCOPE_CACHE_CAPACITY", self.scope_cache_capacity);
        self.remote_type_cache_capacity =
            read_usize("REMOTE_TYPE_CACHE_CAPACITY", self.remote_type_cache_capacity);
        self.max_depth = read_usize("MAX_DEPTH", self.max_depth);
        self.max_collection_len = read_usize("MAX_COLLECTION_LEN", self.max_collection_len);
        self.max_message_size = read_usize("MAX_MESSAGE_SIZE", self.max_message_size);
        if let Some(raw) = lookup("REJECT_FINGERPRINT_COLLISIONS") {
            self.reject_fingerprint_collisions = matches!(raw.trim(), "1" | "true" | "yes");
        }
        self
    }

    /// Reject zero capacities and limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("factory_cache_capacity", self.factory_cache_capacity),
            ("scope_cache_capacity", self.scope_cache_capacity),
            ("remote_type_cache_capacity", self.remote_type_cache_capacity),
            ("max_depth", self.max_depth),
            ("max_collection_len", self.max_collection_len),
            ("max_message_size", self.max_message_size),
        ];
        for (key, value) in checks {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}
