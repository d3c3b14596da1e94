#![forbid(unsafe_code)]

//! Validity propagation components for validscope.
//!
//! - [`Validates`]: a reporter. Forwards its own validity transitions to its
//!   `on_valid_change` handler and to its [`ValidationScope`].
//! - [`Validate`]: a collector. Publishes a child scope, keeps a
//!   [`ValidityMap`](validscope_core::ValidityMap) of what its reporters said,
//!   reduces it to one validity and reports that upward like a reporter.
//! - [`ValidationScope`]: the channel between the two, passed explicitly or
//!   entered as the thread's ambient scope.
//! - [`ValidityWatch`]: observe a collector's announced validity from outside
//!   the tree.
//!
//! # Architecture
//!
//! Everything is single-threaded (`Rc`/`RefCell`). A collector's child scope
//! holds a `Weak` reference to it, so reporters outliving their collector
//! fall back to notifying nobody. All emissions happen after internal borrows
//! are released.
//!
//! # Invariants
//!
//! 1. A reporter never emits when neither its validity nor its name changed.
//! 2. A rename emits the retraction of the old name before the registration
//!    of the new one, and collectors apply the pair as one update.
//! 3. Unmounting (explicitly or by drop) emits a final transition to `Unset`.

pub mod collector;
pub mod reporter;
pub mod scope;
pub mod watch;

pub use collector::{CollectorConfig, DuplicatePolicy, Provided, Validate, ValidateProps};
pub use reporter::{ChangeHandler, Validates, ValidatesProps};
pub use scope::{BatchGuard, ScopeGuard, ValidationScope, ValiditySink, with_scope};
pub use watch::{Subscription, ValidityWatch};
