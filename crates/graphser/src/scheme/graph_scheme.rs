// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The object-graph scheme: picks a [`SerializerFactory`] per security
//! context and runs the graph encoder/decoder with it.
//!
//! Factories are keyed by (whitelist, code scope, custom serializer names)
//! and kept in a bounded LRU. A factory is built outside the cache lock;
//! when two callers race on the same key the first insert wins and the
//! other build is dropped.

use crate::carpenter::{CodeResolver, ScopeLoader, TypeLoader};
use crate::config::EngineConfig;
use crate::error::{Result, SerializationError};
use crate::scheme::{SerializationContext, SerializationScheme, UseCase};
use crate::serializer::{decode, encode, FactoryKey, Root, SerializerFactory};
use crate::types::{TypeRegistry, Value};
use crate::whitelist::Whitelist;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

pub struct GraphScheme {
    registry: Arc<TypeRegistry>,
    config: EngineConfig,
    /// Admitted for every context, unioned with the context's own whitelist.
    whitelist: Whitelist,
    scope_loader: Option<Arc<ScopeLoader>>,
    use_cases: BTreeSet<UseCase>,
    factories: Mutex<LruCache<FactoryKey, Arc<SerializerFactory>>>,
}

impl GraphScheme {
    /// Scheme over `registry`, claiming every use case.
    pub fn new(registry: Arc<TypeRegistry>, config: EngineConfig) -> Self {
        let capacity = NonZeroUsize::new(config.factory_cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            registry,
            config,
            whitelist: Whitelist::empty(),
            scope_loader: None,
            use_cases: UseCase::ALL.into_iter().collect(),
            factories: Mutex::new(LruCache::new(capacity)),
        }
    }

    #[must_use]
    pub fn with_whitelist(mut self, whitelist: Whitelist) -> Self {
        self.whitelist = self.whitelist.union(&whitelist);
        self
    }

    /// Loader for contexts carrying a non-empty code scope.
    #[must_use]
    pub fn with_scope_loader(mut self, loader: Arc<ScopeLoader>) -> Self {
        self.scope_loader = Some(loader);
        self
    }

    /// Build the scope loader from this scheme's config.
    #[must_use]
    pub fn with_code_loading(self, resolver: Arc<dyn CodeResolver>, loader: Arc<dyn TypeLoader>) -> Self {
        let scope_loader = ScopeLoader::with_config(resolver, loader, &self.config);
        self.with_scope_loader(Arc::new(scope_loader))
    }

    pub fn scope_loader(&self) -> Option<&Arc<ScopeLoader>> {
        self.scope_loader.as_ref()
    }

    /// Restrict the use cases this scheme claims.
    #[must_use]
    pub fn for_use_cases<I: IntoIterator<Item = UseCase>>(mut self, use_cases: I) -> Self {
        self.use_cases = use_cases.into_iter().collect();
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Factories currently cached.
    pub fn cached_factories(&self) -> usize {
        self.factories.lock().len()
    }

    /// Factory serving `context`, built on first use.
    pub fn factory_for(&self, context: &SerializationContext) -> Result<Arc<SerializerFactory>> {
        let key = context.factory_key(&self.whitelist);
        if let Some(hit) = self.factories.lock().get(&key) {
            return Ok(Arc::clone(hit));
        }

        let registry = if key.scope.is_empty() {
            Arc::clone(&self.registry)
        } else {
            let loader = self.scope_loader.as_ref().ok_or_else(|| {
                SerializationError::misconfigured(format!(
                    "context requests {} code references but no scope loader is installed",
                    key.scope.len()
                ))
            })?;
            let loaded = loader.load(&key.scope)?;
            Arc::new(self.registry.layered(&loaded))
        };
        let built = Arc::new(SerializerFactory::new(
            registry,
            key.whitelist.clone(),
            context.custom_serializers().to_vec(),
            self.config.clone(),
        ));

        let mut factories = self.factories.lock();
        if let Some(existing) = factories.get(&key) {
            return Ok(Arc::clone(existing));
        }
        log::debug!(
            "[scheme] new serializer factory ({} whitelisted, {} code references, {} custom)",
            key.whitelist.len(),
            key.scope.len(),
            key.custom_serializers.len()
        );
        if let Some((_, evicted)) = factories.push(key, Arc::clone(&built)) {
            log::debug!("[scheme] evicted factory {:?}", evicted);
        }
        Ok(built)
    }
}

impl SerializationScheme for GraphScheme {
    fn name(&self) -> &str {
        "graph"
    }

    fn can_handle(&self, use_case: UseCase) -> bool {
        self.use_cases.contains(&use_case)
    }

    fn serialize(&self, root: Root<'_>, context: &SerializationContext) -> Result<Vec<u8>> {
        let factory = self.factory_for(context)?;
        encode(&factory, root, context.encoding())
    }

    fn deserialize(&self, bytes: &[u8], context: &SerializationContext) -> Result<Value> {
        let factory = self.factory_for(context)?;
        decode(&factory, bytes, context)
    }
}

impl fmt::Debug for GraphScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphScheme")
            .field("registered", &self.registry.len())
            .field("whitelist", &self.whitelist)
            .field("use_cases", &self.use_cases)
            .field("cached_factories", &self.cached_factories())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carpenter::CodeLoadingScope;

    fn scheme(capacity: usize) -> GraphScheme {
        GraphScheme::new(
            Arc::new(TypeRegistry::new()),
            EngineConfig {
                factory_cache_capacity: capacity,
                ..EngineConfig::default()
            },
        )
    }

    #[test]
    fn test_factory_shared_per_key() {
        let scheme = scheme(4);
        let a = scheme.factory_for(&SerializationContext::p2p()).expect("factory");
        let b = scheme.factory_for(&SerializationContext::storage()).expect("factory");
        assert!(Arc::ptr_eq(&a, &b));

        let c = scheme
            .factory_for(&SerializationContext::p2p().with_whitelist(&Whitelist::of(["x.Y"])))
            .expect("factory");
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(scheme.cached_factories(), 2);
    }

    #[test]
    fn test_custom_serializers_with_different_proxies_get_own_factories() {
        use crate::serializer::{CustomSerializer, ProxySerializer};
        use crate::types::{FromValue, TypeRef, Value};

        struct Stamp(i64);
        let as_long: Arc<dyn CustomSerializer> = Arc::new(ProxySerializer::new(
            "log.Stamp",
            TypeRef::Long,
            |s: &Stamp| Value::Long(s.0),
            |v| Ok(Stamp(i64::from_value(v)?)),
        ));
        let as_text: Arc<dyn CustomSerializer> = Arc::new(ProxySerializer::new(
            "log.Stamp",
            TypeRef::String,
            |s: &Stamp| Value::from(s.0.to_string()),
            |_| Ok(Stamp(0)),
        ));

        let scheme = scheme(4);
        let long = scheme
            .factory_for(&SerializationContext::p2p().with_custom_serializer(as_long))
            .expect("factory");
        let text = scheme
            .factory_for(&SerializationContext::p2p().with_custom_serializer(as_text))
            .expect("factory");
        assert!(!Arc::ptr_eq(&long, &text));
        assert_eq!(long.custom("log.Stamp").map(|c| c.proxy_type()), Some(TypeRef::Long));
        assert_eq!(text.custom("log.Stamp").map(|c| c.proxy_type()), Some(TypeRef::String));
    }

    #[test]
    fn test_base_whitelist_unioned() {
        let scheme = scheme(4).with_whitelist(Whitelist::of(["base.Type"]));
        let factory = scheme
            .factory_for(&SerializationContext::p2p().with_whitelist(&Whitelist::of(["ctx.Type"])))
            .expect("factory");
        assert!(factory.whitelist().contains("base.Type"));
        assert!(factory.whitelist().contains("ctx.Type"));
    }

    #[test]
    fn test_factory_cache_is_bounded() {
        let scheme = scheme(2);
        for i in 0..5 {
            let context = SerializationContext::p2p().with_whitelist(&Whitelist::of([format!("t.T{}", i)]));
            scheme.factory_for(&context).expect("factory");
        }
        assert_eq!(scheme.cached_factories(), 2);
    }

    #[test]
    fn test_scope_without_loader_is_misconfiguration() {
        let context = SerializationContext::p2p().with_code_scope(CodeLoadingScope::of(["bundle"]));
        let err = scheme(2).factory_for(&context).unwrap_err();
        assert!(matches!(err, SerializationError::Misconfiguration { .. }));
    }

    #[test]
    fn test_claimed_use_cases() {
        let scheme = scheme(2).for_use_cases([UseCase::Storage]);
        assert!(scheme.can_handle(UseCase::Storage));
        assert!(!scheme.can_handle(UseCase::P2p));
    }
}
