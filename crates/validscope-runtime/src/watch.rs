#![forbid(unsafe_code)]

//! Observable aggregate validity.
//!
//! A [`ValidityWatch`] mirrors the validity a collector announces upward so
//! code outside the component tree (a submit button, a status line) can
//! react without registering as a child reporter.
//!
//! # Invariants
//!
//! 1. `version` increments exactly once per value-changing `set`.
//! 2. Setting the current value is a no-op (no version bump, no callbacks).
//! 3. Subscribers run in registration order with `(is, was)`.
//! 4. Dropping a [`Subscription`] silences its callback before the next
//!    change; the dead slot is pruned lazily.
//!
//! # Failure Modes
//!
//! - Subscribers run after the internal borrow is released, so a callback
//!   may read the watch. A callback that causes the owning collector to
//!   change again sees the nested notification before the outer loop ends.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use validscope_core::Validity;

type WatchFn = dyn Fn(Validity, Validity);

struct WatchInner {
    value: Validity,
    version: u64,
    subscribers: Vec<Weak<WatchFn>>,
}

/// Shared, versioned validity cell with change callbacks.
///
/// Clones are handles to the same cell.
#[derive(Clone)]
pub struct ValidityWatch {
    inner: Rc<RefCell<WatchInner>>,
}

impl std::fmt::Debug for ValidityWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ValidityWatch")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl Default for ValidityWatch {
    fn default() -> Self {
        Self::new(Validity::Unset)
    }
}

impl ValidityWatch {
    #[must_use]
    pub fn new(value: Validity) -> Self {
        Self {
            inner: Rc::new(RefCell::new(WatchInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn get(&self) -> Validity {
        self.inner.borrow().value
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Registered callbacks, including dropped ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Call `callback(is, was)` on every change until the guard drops.
    pub fn subscribe(&self, callback: impl Fn(Validity, Validity) + 'static) -> Subscription {
        let strong: Rc<WatchFn> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Store `value`, notifying subscribers when it differs.
    ///
    /// Returns whether the value changed.
    pub(crate) fn set(&self, value: Validity) -> bool {
        let (was, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            let was = std::mem::replace(&mut inner.value, value);
            inner.version += 1;
            inner.subscribers.retain(|w| w.strong_count() > 0);
            let live: Vec<Rc<WatchFn>> =
                inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (was, live)
        };
        for cb in &callbacks {
            cb(value, was);
        }
        true
    }
}

/// RAII guard for a [`ValidityWatch`] callback.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
