#![forbid(unsafe_code)]

//! Aggregation functions from a [`ValidityMap`] to one [`Validity`].
//!
//! Reducers are compared by identity, not behavior: a collector recomputes
//! its aggregate when handed a reducer that is not [`Reducer::same`] as the
//! previous one. Built-ins compare equal to themselves across constructions;
//! custom reducers compare equal only to clones of the same closure.
//!
//! # Failure Modes
//!
//! - Reducer panic: propagates to whoever triggered the recompute (the child
//!   notification or the collector update).
//! - Non-deterministic reducer: tolerated, but repeated recomputes over an
//!   unchanged map may then report spurious transitions.

use core::fmt;
use std::rc::Rc;

use crate::map::ValidityMap;
use crate::validity::Validity;

type ReduceFn = dyn Fn(&ValidityMap) -> Validity;

#[derive(Clone)]
enum ReducerKind {
    Unset,
    NoneInvalid,
    AllValid,
    Custom(Rc<ReduceFn>),
}

/// Aggregation strategy for a collector.
#[derive(Clone)]
pub struct Reducer {
    kind: ReducerKind,
}

impl Reducer {
    /// Wrap a custom aggregation closure.
    pub fn new(f: impl Fn(&ValidityMap) -> Validity + 'static) -> Self {
        Self {
            kind: ReducerKind::Custom(Rc::new(f)),
        }
    }

    /// Always `Unset`: the collector has no opinion of its own.
    #[must_use]
    pub const fn unset() -> Self {
        Self {
            kind: ReducerKind::Unset,
        }
    }

    /// `Invalid` if any child is invalid, otherwise `Valid` (including empty).
    #[must_use]
    pub const fn none_invalid() -> Self {
        Self {
            kind: ReducerKind::NoneInvalid,
        }
    }

    /// `Valid` if every child that is not disabled is valid, otherwise
    /// `Invalid`. An empty map is `Valid`.
    #[must_use]
    pub const fn all_valid() -> Self {
        Self {
            kind: ReducerKind::AllValid,
        }
    }

    /// Evaluate over `map`.
    #[must_use]
    pub fn reduce(&self, map: &ValidityMap) -> Validity {
        match &self.kind {
            ReducerKind::Unset => Validity::Unset,
            ReducerKind::NoneInvalid => {
                Validity::from(!map.values().any(Validity::is_invalid))
            }
            ReducerKind::AllValid => Validity::from(
                map.values()
                    .filter(|v| *v != Validity::Disabled)
                    .all(Validity::is_valid),
            ),
            ReducerKind::Custom(f) => f(map),
        }
    }

    /// Identity comparison.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (ReducerKind::Unset, ReducerKind::Unset)
            | (ReducerKind::NoneInvalid, ReducerKind::NoneInvalid)
            | (ReducerKind::AllValid, ReducerKind::AllValid) => true,
            (ReducerKind::Custom(a), ReducerKind::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Self::unset()
    }
}

impl PartialEq for Reducer {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.kind {
            ReducerKind::Unset => "unset",
            ReducerKind::NoneInvalid => "none_invalid",
            ReducerKind::AllValid => "all_valid",
            ReducerKind::Custom(_) => "custom",
        };
        f.debug_tuple("Reducer").field(&name).finish()
    }
}

impl<F> From<F> for Reducer
where
    F: Fn(&ValidityMap) -> Validity + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}
