// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scheme dispatcher.
//!
//! Schemes are registered once at startup; every call selects the single
//! scheme claiming the context's use case. Zero or several claimants is a
//! misconfiguration, never a recoverable runtime condition. The scheme table
//! is swapped atomically on registration so the hot path takes no lock; the
//! per-use-case selection lives inside the table it was computed from.

use crate::error::{Result, SerializationError};
use crate::scheme::current::{current_context, enter, ContextGuard};
use crate::scheme::{SerializationContext, UseCase};
use crate::serializer::Root;
use crate::types::Value;
use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// A concrete serialization configuration.
pub trait SerializationScheme: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this scheme serves `use_case`.
    fn can_handle(&self, use_case: UseCase) -> bool;

    fn serialize(&self, root: Root<'_>, context: &SerializationContext) -> Result<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8], context: &SerializationContext) -> Result<Value>;
}

#[derive(Default)]
struct SchemeTable {
    schemes: Vec<Arc<dyn SerializationScheme>>,
    /// Selection per use case over `schemes`.
    selected: DashMap<UseCase, Arc<dyn SerializationScheme>>,
}

pub struct SchemeDispatcher {
    table: ArcSwap<SchemeTable>,
}

impl Default for SchemeDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemeDispatcher {
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(SchemeTable::default()),
        }
    }

    #[must_use]
    pub fn with_scheme(self, scheme: Arc<dyn SerializationScheme>) -> Self {
        self.register(scheme);
        self
    }

    pub fn register(&self, scheme: Arc<dyn SerializationScheme>) {
        log::info!("[scheme] registered {}", scheme.name());
        self.table.rcu(|current| {
            let mut schemes = current.schemes.clone();
            schemes.push(Arc::clone(&scheme));
            SchemeTable {
                schemes,
                selected: DashMap::new(),
            }
        });
    }

    pub fn scheme_count(&self) -> usize {
        self.table.load().schemes.len()
    }

    /// The one scheme claiming `use_case`.
    pub fn select(&self, use_case: UseCase) -> Result<Arc<dyn SerializationScheme>> {
        let table = self.table.load();
        if let Some(hit) = table.selected.get(&use_case) {
            return Ok(Arc::clone(hit.value()));
        }
        let claimants: Vec<&Arc<dyn SerializationScheme>> =
            table.schemes.iter().filter(|s| s.can_handle(use_case)).collect();
        match claimants.as_slice() {
            [only] => {
                table.selected.insert(use_case, Arc::clone(only));
                Ok(Arc::clone(only))
            }
            [] => Err(SerializationError::misconfigured(format!(
                "no scheme claims use case {}",
                use_case
            ))),
            many => {
                let names: Vec<&str> = many.iter().map(|s| s.name()).collect();
                Err(SerializationError::misconfigured(format!(
                    "use case {} claimed by {} schemes: {}",
                    use_case,
                    many.len(),
                    names.join(", ")
                )))
            }
        }
    }

    /// Check that each use case selects exactly one scheme.
    pub fn validate(&self, use_cases: &[UseCase]) -> Result<()> {
        for &use_case in use_cases {
            self.select(use_case)?;
        }
        Ok(())
    }

    // ========================================================================
    // Encode
    // ========================================================================

    /// Encode a registered (or custom-serialized) instance.
    pub fn serialize<T: Any + Send + Sync>(&self, value: &T, context: &SerializationContext) -> Result<Vec<u8>> {
        self.serialize_root(Root::Object(value), context)
    }

    pub fn serialize_value(&self, value: &Value, context: &SerializationContext) -> Result<Vec<u8>> {
        self.serialize_root(Root::Value(value), context)
    }

    fn serialize_root(&self, root: Root<'_>, context: &SerializationContext) -> Result<Vec<u8>> {
        let scheme = self.select(context.use_case())?;
        let (context, _guard) = scoped(context);
        scheme.serialize(root, &context)
    }

    // ========================================================================
    // Decode
    // ========================================================================

    pub fn deserialize_value(&self, bytes: &[u8], context: &SerializationContext) -> Result<Value> {
        let scheme = self.select(context.use_case())?;
        let (context, _guard) = scoped(context);
        scheme.deserialize(bytes, &context)
    }

    /// Decode a root object of type `T`, sharing it with the decoded graph.
    pub fn deserialize_shared<T: Any + Send + Sync>(
        &self,
        bytes: &[u8],
        context: &SerializationContext,
    ) -> Result<Arc<T>> {
        let value = self.deserialize_value(bytes, context)?;
        let found = describe(&value);
        value.downcast_object::<T>().ok_or_else(|| SerializationError::UnexpectedType {
            expected: type_name::<T>().to_string(),
            found,
        })
    }

    /// Decode a root object of type `T`, cloning it if the graph still
    /// references it elsewhere.
    pub fn deserialize<T: Any + Send + Sync + Clone>(
        &self,
        bytes: &[u8],
        context: &SerializationContext,
    ) -> Result<T> {
        let shared = self.deserialize_shared::<T>(bytes, context)?;
        Ok(Arc::try_unwrap(shared).unwrap_or_else(|shared| T::clone(&shared)))
    }
}

/// Enter `context`, widened by the whitelist of any enclosing context.
fn scoped(context: &SerializationContext) -> (Arc<SerializationContext>, ContextGuard) {
    let effective = match current_context() {
        Some(outer) => Arc::new(context.nested_in(&outer)),
        None => Arc::new(context.clone()),
    };
    let guard = enter(Arc::clone(&effective));
    (effective, guard)
}

fn describe(value: &Value) -> String {
    match value.as_record() {
        Some(record) => format!("record {}", record.type_name()),
        None => value.kind().to_string(),
    }
}

impl fmt::Debug for SchemeDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.load();
        let names: Vec<&str> = table.schemes.iter().map(|s| s.name()).collect();
        f.debug_struct("SchemeDispatcher").field("schemes", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::current::depth;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        name: &'static str,
        use_cases: Vec<UseCase>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(name: &'static str, use_cases: &[UseCase]) -> Arc<Self> {
            Arc::new(Self {
                name,
                use_cases: use_cases.to_vec(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl SerializationScheme for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn can_handle(&self, use_case: UseCase) -> bool {
            self.use_cases.contains(&use_case)
        }

        fn serialize(&self, _root: Root<'_>, context: &SerializationContext) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            assert_eq!(
                current_context().map(|c| c.use_case()),
                Some(context.use_case())
            );
            Ok(self.name.as_bytes().to_vec())
        }

        fn deserialize(&self, _bytes: &[u8], _context: &SerializationContext) -> Result<Value> {
            Err(SerializationError::malformed("always fails"))
        }
    }

    #[test]
    fn test_single_claimant_selected() {
        let a = Fixed::new("a", &[UseCase::P2p]);
        let dispatcher = SchemeDispatcher::new()
            .with_scheme(a.clone())
            .with_scheme(Fixed::new("b", &[UseCase::Storage]));
        let bytes = dispatcher
            .serialize_value(&Value::Null, &SerializationContext::p2p())
            .expect("serialize");
        assert_eq!(bytes, b"a");
        assert_eq!(a.calls.load(Ordering::Relaxed), 1);
        assert!(dispatcher.validate(&[UseCase::P2p, UseCase::Storage]).is_ok());
    }

    #[test]
    fn test_no_claimant_is_misconfiguration() {
        let dispatcher = SchemeDispatcher::new().with_scheme(Fixed::new("a", &[UseCase::P2p]));
        let err = dispatcher
            .serialize_value(&Value::Null, &SerializationContext::checkpoint())
            .unwrap_err();
        assert!(matches!(err, SerializationError::Misconfiguration { .. }));
    }

    #[test]
    fn test_two_claimants_is_misconfiguration() {
        let dispatcher = SchemeDispatcher::new()
            .with_scheme(Fixed::new("a", &[UseCase::P2p]))
            .with_scheme(Fixed::new("b", &[UseCase::P2p, UseCase::Storage]));
        let err = dispatcher.validate(&[UseCase::P2p]).unwrap_err();
        assert!(err.to_string().contains("a, b"), "{}", err);
    }

    #[test]
    fn test_registration_clears_selection() {
        let dispatcher = SchemeDispatcher::new().with_scheme(Fixed::new("a", &[UseCase::P2p]));
        assert!(dispatcher.select(UseCase::P2p).is_ok());
        dispatcher.register(Fixed::new("b", &[UseCase::P2p]));
        assert!(dispatcher.select(UseCase::P2p).is_err());
        assert_eq!(dispatcher.scheme_count(), 2);
    }

    #[test]
    fn test_selection_from_replaced_table_not_reused() {
        let a: Arc<dyn SerializationScheme> = Fixed::new("a", &[UseCase::P2p]);
        let dispatcher = SchemeDispatcher::new().with_scheme(Arc::clone(&a));
        let stale = dispatcher.table.load_full();

        dispatcher.register(Fixed::new("b", &[UseCase::P2p]));
        // A select still working on the old table finishes late.
        stale.selected.insert(UseCase::P2p, a);

        let err = dispatcher.select(UseCase::P2p).err().map(|e| e.to_string());
        assert!(err.is_some_and(|e| e.contains("a, b")));
    }

    #[test]
    fn test_context_popped_after_failure() {
        let dispatcher = SchemeDispatcher::new().with_scheme(Fixed::new("a", &[UseCase::P2p]));
        assert!(dispatcher
            .deserialize_value(b"", &SerializationContext::p2p())
            .is_err());
        assert_eq!(depth(), 0);
    }
}
