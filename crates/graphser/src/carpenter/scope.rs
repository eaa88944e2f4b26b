// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Code-loading scopes.
//!
//! A scope names the code references (attachments, plugin bundles, ...) whose
//! types a call may see. Fetching code is the caller's business: the engine
//! only asks a [`CodeResolver`] for the bytes and a [`TypeLoader`] for the
//! registrations those bytes define. Loaded scopes are kept in an LRU keyed
//! by the exact reference set, so many distinct version combinations cannot
//! grow memory without bound.

use crate::config::EngineConfig;
use crate::error::{Result, SerializationError};
use crate::serializer::cache::{LookupCounters, LookupStats};
use crate::types::{RegisteredType, TypeRegistry};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

/// Opaque reference to a unit of loadable code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CodeReference(Arc<str>);

impl CodeReference {
    pub fn new(reference: impl AsRef<str>) -> Self {
        Self(Arc::from(reference.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CodeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of code references visible to one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CodeLoadingScope {
    references: BTreeSet<CodeReference>,
}

impl CodeLoadingScope {
    /// Local types only.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn of<I, S>(references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            references: references.into_iter().map(CodeReference::new).collect(),
        }
    }

    #[must_use]
    pub fn with(mut self, reference: CodeReference) -> Self {
        self.references.insert(reference);
        self
    }

    pub fn references(&self) -> impl Iterator<Item = &CodeReference> {
        self.references.iter()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// Collaborator that fetches the bytes behind a code reference.
///
/// May block on I/O; `None` means the code is not available.
pub trait CodeResolver: Send + Sync {
    fn resolve_code_for_reference(&self, reference: &CodeReference) -> Option<Vec<u8>>;
}

/// Collaborator that turns fetched code into type registrations.
pub trait TypeLoader: Send + Sync {
    fn load(&self, reference: &CodeReference, code: &[u8]) -> Result<Vec<RegisteredType>>;
}

/// Resolves scopes into registries, caching the most recently used ones.
pub struct ScopeLoader {
    resolver: Arc<dyn CodeResolver>,
    loader: Arc<dyn TypeLoader>,
    cache: Mutex<LruCache<CodeLoadingScope, Arc<TypeRegistry>>>,
    counters: LookupCounters,
}

impl ScopeLoader {
    pub fn new(resolver: Arc<dyn CodeResolver>, loader: Arc<dyn TypeLoader>, capacity: usize) -> Self {
        Self {
            resolver,
            loader,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            counters: LookupCounters::default(),
        }
    }

    /// Loader keeping `scope_cache_capacity` scopes.
    pub fn with_config(
        resolver: Arc<dyn CodeResolver>,
        loader: Arc<dyn TypeLoader>,
        config: &EngineConfig,
    ) -> Self {
        Self::new(resolver, loader, config.scope_cache_capacity)
    }

    /// Registry of every type defined by the scope's references.
    ///
    /// Resolution runs outside the cache lock; two concurrent misses for the
    /// same scope may both load it, and the first insert wins.
    pub fn load(&self, scope: &CodeLoadingScope) -> Result<Arc<TypeRegistry>> {
        if let Some(hit) = self.cache.lock().get(scope) {
            self.counters.record_hit();
            return Ok(Arc::clone(hit));
        }

        let start = Instant::now();
        let mut registry = TypeRegistry::new();
        for reference in scope.references() {
            let code = self.resolver.resolve_code_for_reference(reference).ok_or_else(|| {
                SerializationError::unknown(
                    reference.as_str(),
                    "code for reference could not be resolved",
                )
            })?;
            for registered in self.loader.load(reference, &code)? {
                registry.insert(registered)?;
            }
        }
        log::debug!(
            "[scope] loaded {} types from {} references",
            registry.len(),
            scope.len()
        );

        let loaded = Arc::new(registry);
        let mut cache = self.cache.lock();
        let result = match cache.get(scope) {
            Some(existing) => Arc::clone(existing),
            None => {
                cache.put(scope.clone(), Arc::clone(&loaded));
                loaded
            }
        };
        drop(cache);

        self.counters.record_miss(start);
        Ok(result)
    }

    /// Loaded scopes currently cached.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.cache.lock().cap().get()
    }

    pub fn stats(&self) -> LookupStats {
        self.counters.snapshot()
    }
}

impl fmt::Debug for ScopeLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeLoader")
            .field("cached", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnumRegistration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves `"enum:<name>:<CONST>,<CONST>"` for references starting with `ok/`.
    struct Resolver {
        calls: AtomicUsize,
    }

    impl CodeResolver for Resolver {
        fn resolve_code_for_reference(&self, reference: &CodeReference) -> Option<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = reference.as_str().strip_prefix("ok/")?;
            Some(format!("{}:A,B", name).into_bytes())
        }
    }

    struct EnumLoader;

    impl TypeLoader for EnumLoader {
        fn load(&self, _reference: &CodeReference, code: &[u8]) -> Result<Vec<RegisteredType>> {
            let text = std::str::from_utf8(code).map_err(|e| SerializationError::malformed(e.to_string()))?;
            let (name, constants) = text
                .split_once(':')
                .ok_or_else(|| SerializationError::malformed("bad code"))?;
            Ok(vec![EnumRegistration::new(name, constants.split(',')).into()])
        }
    }

    fn loader(capacity: usize) -> (ScopeLoader, Arc<Resolver>) {
        let resolver = Arc::new(Resolver {
            calls: AtomicUsize::new(0),
        });
        let loader = ScopeLoader::new(
            Arc::clone(&resolver) as Arc<dyn CodeResolver>,
            Arc::new(EnumLoader),
            capacity,
        );
        (loader, resolver)
    }

    #[test]
    fn test_scope_loaded_once_then_cached() {
        let (loader, resolver) = loader(4);
        let scope = CodeLoadingScope::of(["ok/acme.Size", "ok/acme.Shade"]);

        let first = loader.load(&scope).expect("load");
        assert_eq!(first.len(), 2);
        assert!(first.enumeration("acme.Size").is_some());

        let second = loader.load(&scope).expect("cached");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
        assert_eq!(loader.stats().hits, 1);
    }

    #[test]
    fn test_missing_code_names_the_reference() {
        let (loader, _) = loader(4);
        let err = loader
            .load(&CodeLoadingScope::of(["gone/acme.X"]))
            .unwrap_err();
        match err {
            SerializationError::UnknownType { type_name, .. } => assert_eq!(type_name, "gone/acme.X"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(loader.is_empty());
    }

    #[test]
    fn test_cache_is_bounded_by_reference_set() {
        let (loader, _) = loader(2);
        for i in 0..5 {
            let scope = CodeLoadingScope::of([format!("ok/acme.T{}", i)]);
            loader.load(&scope).expect("load");
        }
        assert_eq!(loader.len(), 2);
        assert_eq!(loader.capacity(), 2);
    }

    #[test]
    fn test_capacity_taken_from_config() {
        let config = EngineConfig {
            scope_cache_capacity: 3,
            ..EngineConfig::default()
        };
        let loader = ScopeLoader::with_config(
            Arc::new(Resolver {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(EnumLoader),
            &config,
        );
        assert_eq!(loader.capacity(), 3);
        for i in 0..5 {
            loader
                .load(&CodeLoadingScope::of([format!("ok/acme.T{}", i)]))
                .expect("load");
        }
        assert_eq!(loader.len(), 3);
        assert_eq!(loader.stats().misses, 5);
    }
}
