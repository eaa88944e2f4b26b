// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scoped "current context".
//!
//! Each thread keeps its own stack of active contexts. [`enter`] pushes and
//! returns a [`ContextGuard`]; dropping the guard pops back to the state
//! before the push, on normal return, `?` propagation and unwinding alike.
//! Nested encode/decode calls (custom serializers, for example) read the
//! active context through [`current_context`].

use crate::scheme::SerializationContext;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

thread_local! {
    static STACK: RefCell<Vec<Arc<SerializationContext>>> = const { RefCell::new(Vec::new()) };
}

/// Pops its context when dropped. Not `Send`: it belongs to the thread
/// whose stack it modified.
#[must_use = "the context is popped as soon as the guard is dropped"]
pub struct ContextGuard {
    /// Stack height before the push.
    height: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        // try_with: the thread-local may already be gone during thread exit.
        let _ = STACK.try_with(|stack| {
            if let Ok(mut stack) = stack.try_borrow_mut() {
                stack.truncate(self.height);
            }
        });
    }
}

/// Make `context` current until the guard is dropped.
pub fn enter(context: Arc<SerializationContext>) -> ContextGuard {
    let height = STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let height = stack.len();
        stack.push(context);
        height
    });
    ContextGuard {
        height,
        _not_send: PhantomData,
    }
}

/// Innermost active context of this thread.
pub fn current_context() -> Option<Arc<SerializationContext>> {
    STACK.with(|stack| stack.borrow().last().cloned())
}

/// Number of contexts active on this thread.
pub fn depth() -> usize {
    STACK.with(|stack| stack.borrow().len())
}

/// Run `f` with `context` current.
pub fn with_context<R>(context: Arc<SerializationContext>, f: impl FnOnce() -> R) -> R {
    let _guard = enter(context);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::UseCase;

    #[test]
    fn test_nested_contexts_restore() {
        assert!(current_context().is_none());
        let outer = enter(Arc::new(SerializationContext::storage()));
        {
            let _inner = enter(Arc::new(SerializationContext::p2p()));
            assert_eq!(current_context().map(|c| c.use_case()), Some(UseCase::P2p));
            assert_eq!(depth(), 2);
        }
        assert_eq!(current_context().map(|c| c.use_case()), Some(UseCase::Storage));
        drop(outer);
        assert!(current_context().is_none());
    }

    #[test]
    fn test_restored_after_panic() {
        let result = std::panic::catch_unwind(|| {
            with_context(Arc::new(SerializationContext::testing()), || {
                panic!("boom");
            })
        });
        assert!(result.is_err());
        assert_eq!(depth(), 0);
    }

    #[test]
    fn test_contexts_do_not_leak_across_threads() {
        let _guard = enter(Arc::new(SerializationContext::checkpoint()));
        let seen = std::thread::spawn(|| current_context().is_some())
            .join()
            .expect("thread");
        assert!(!seen);
        assert!(current_context().is_some());
    }
}
