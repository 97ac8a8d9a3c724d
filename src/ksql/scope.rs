//! Model creation scope
//!
//! Query-shaping operations are only legal while a model is being defined.
//! The scope is entered either synchronously, through an RAII guard bound to
//! the current thread, or asynchronously, through [`ModelCreationScope::run`]
//! which attaches the scope to one task so it follows the task across `.await`
//! points and worker threads without leaking into concurrently running tasks.

use crate::ksql::error::{KsqlError, KsqlResult};
use std::cell::Cell;
use std::future::Future;
use std::marker::PhantomData;

thread_local! {
    static SCOPE_DEPTH: Cell<usize> = const { Cell::new(0) };
}

tokio::task_local! {
    static TASK_SCOPE: ();
}

/// Entry point for checking and entering the model creation scope
pub struct ModelCreationScope;

impl ModelCreationScope {
    /// Whether the current thread or task is inside a model creation scope
    pub fn is_active() -> bool {
        SCOPE_DEPTH.with(|depth| depth.get() > 0) || TASK_SCOPE.try_with(|_| ()).is_ok()
    }

    /// Enter the scope on the current thread until the guard is dropped
    ///
    /// Scopes nest; the scope stays active until the outermost guard drops.
    pub fn enter() -> ModelCreationGuard {
        SCOPE_DEPTH.with(|depth| depth.set(depth.get() + 1));
        ModelCreationGuard {
            _not_send: PhantomData,
        }
    }

    /// Run `future` with the scope active for that task only
    pub fn run<F: Future>(future: F) -> impl Future<Output = F::Output> {
        TASK_SCOPE.scope((), future)
    }

    /// Run `f` with the scope active on the current thread
    pub fn within<R>(f: impl FnOnce() -> R) -> R {
        let _guard = Self::enter();
        f()
    }

    /// Fail with a scope violation naming `operation` unless the scope is active
    pub fn ensure_active(operation: &str) -> KsqlResult<()> {
        if Self::is_active() {
            Ok(())
        } else {
            log::warn!("'{}' invoked outside a model creation scope", operation);
            Err(KsqlError::scope_violation(operation))
        }
    }
}

/// Guard returned by [`ModelCreationScope::enter`]
///
/// Not `Send`: the scope belongs to the thread that entered it.
#[must_use = "the scope is exited as soon as the guard is dropped"]
pub struct ModelCreationGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for ModelCreationGuard {
    fn drop(&mut self) {
        SCOPE_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}
