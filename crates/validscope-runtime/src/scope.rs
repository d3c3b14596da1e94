#![forbid(unsafe_code)]

//! Validation scopes: the channel from reporters to their collector.
//!
//! A [`ValidationScope`] carries one capability, a [`ValiditySink`]. Every
//! collector publishes a fresh scope for its subtree; reporters mounted with
//! that scope deliver their changes to it. The root scope discards
//! everything.
//!
//! Scopes are normally passed explicitly. For deep trees a scope can also be
//! *entered*, making it the ambient scope returned by
//! [`ValidationScope::current`] until the guard drops. Entries nest LIFO and
//! are per thread.
//!
//! # Batching
//!
//! [`ValidationScope::batch`] brackets several emissions so the receiving
//! collector folds them into a single recompute. Reporters batch the
//! retraction and registration of a rename this way.

use std::cell::RefCell;
use std::rc::Rc;

use validscope_core::ValidityChange;

/// Receiver of reporter notifications.
pub trait ValiditySink {
    /// `change.id` moved from `change.was_valid` to `change.is_valid`.
    fn on_valid_change(&self, change: &ValidityChange);

    /// Start of a group of changes that belong to one logical event.
    fn begin_batch(&self) {}

    /// End of the group opened by the matching [`ValiditySink::begin_batch`].
    fn end_batch(&self) {}
}

impl<F: Fn(&ValidityChange)> ValiditySink for F {
    fn on_valid_change(&self, change: &ValidityChange) {
        self(change);
    }
}

thread_local! {
    static AMBIENT: RefCell<Vec<ValidationScope>> = const { RefCell::new(Vec::new()) };
}

/// Handle to the sink that reporters in a subtree notify.
///
/// Cloning is cheap and shares the sink.
#[derive(Clone, Default)]
pub struct ValidationScope {
    sink: Option<Rc<dyn ValiditySink>>,
}

impl std::fmt::Debug for ValidationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationScope")
            .field("root", &self.is_root())
            .finish()
    }
}

impl ValidationScope {
    /// The no-op scope used when no collector encloses a reporter.
    #[must_use]
    pub const fn root() -> Self {
        Self { sink: None }
    }

    pub fn from_sink(sink: impl ValiditySink + 'static) -> Self {
        Self {
            sink: Some(Rc::new(sink)),
        }
    }

    #[must_use]
    pub fn from_rc(sink: Rc<dyn ValiditySink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// The innermost entered scope on this thread, or the root scope.
    #[must_use]
    pub fn current() -> Self {
        AMBIENT.with(|stack| stack.borrow().last().cloned().unwrap_or_default())
    }

    /// Make this the ambient scope until the guard drops.
    #[must_use = "dropping this guard leaves the scope immediately"]
    pub fn enter(&self) -> ScopeGuard {
        AMBIENT.with(|stack| stack.borrow_mut().push(self.clone()));
        ScopeGuard {
            scope: self.clone(),
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.sink.is_none()
    }

    /// Whether both handles share one sink. Root scopes are all the same.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        match (&self.sink, &other.sink) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Deliver one change to the sink.
    pub fn emit(&self, change: &ValidityChange) {
        if let Some(sink) = &self.sink {
            sink.on_valid_change(change);
        }
    }

    /// Group the emissions made while the guard lives.
    #[must_use = "dropping this guard ends the batch immediately"]
    pub fn batch(&self) -> BatchGuard {
        if let Some(sink) = &self.sink {
            sink.begin_batch();
        }
        BatchGuard {
            scope: self.clone(),
        }
    }
}

/// Run `f` with `scope` as the ambient scope.
pub fn with_scope<R>(scope: &ValidationScope, f: impl FnOnce() -> R) -> R {
    let _guard = scope.enter();
    f()
}

/// RAII guard for an entered scope.
#[must_use = "dropping this guard leaves the scope immediately"]
pub struct ScopeGuard {
    scope: ValidationScope,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let popped = AMBIENT.with(|stack| stack.borrow_mut().pop());
        if let Some(popped) = popped {
            debug_assert!(popped.same(&self.scope), "scope guards dropped out of order");
        }
    }
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard").finish_non_exhaustive()
    }
}

/// RAII guard for a batch; ends it on drop.
#[must_use = "dropping this guard ends the batch immediately"]
pub struct BatchGuard {
    scope: ValidationScope,
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        if let Some(sink) = &self.scope.sink {
            sink.end_batch();
        }
    }
}

impl std::fmt::Debug for BatchGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchGuard").finish_non_exhaustive()
    }
}
