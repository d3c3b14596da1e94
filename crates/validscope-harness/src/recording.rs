#![forbid(unsafe_code)]

//! Recording test doubles.
//!
//! [`ChangeLog`] is a shared, append-only list of what a sink or handler
//! received. Batch brackets are recorded as [`Event::BeginBatch`] /
//! [`Event::EndBatch`] so tests can check grouping as well as order.

use std::cell::RefCell;
use std::rc::Rc;

use validscope_core::{Reducer, Validity, ValidityChange, ValidityMap};
use validscope_runtime::{ChangeHandler, ValidationScope, ValiditySink};

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Change(ValidityChange),
    BeginBatch,
    EndBatch,
}

/// Shared log of received events. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    events: Rc<RefCell<Vec<Event>>>,
}

impl ChangeLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    /// All events, including batch brackets.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Only the changes, in arrival order.
    #[must_use]
    pub fn changes(&self) -> Vec<ValidityChange> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Change(c) => Some(c.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(id, is_valid, was_valid)` of every change.
    #[must_use]
    pub fn triples(&self) -> Vec<(String, Validity, Validity)> {
        self.changes()
            .iter()
            .map(|c| (c.id.to_string(), c.is_valid, c.was_valid))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// A [`ValiditySink`] that writes into a [`ChangeLog`].
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: ChangeLog,
}

impl RecordingSink {
    #[must_use]
    pub fn new(log: ChangeLog) -> Self {
        Self { log }
    }

    #[must_use]
    pub fn log(&self) -> &ChangeLog {
        &self.log
    }
}

impl ValiditySink for RecordingSink {
    fn on_valid_change(&self, change: &ValidityChange) {
        self.log.push(Event::Change(change.clone()));
    }

    fn begin_batch(&self) {
        self.log.push(Event::BeginBatch);
    }

    fn end_batch(&self) {
        self.log.push(Event::EndBatch);
    }
}

/// A scope whose sink records everything it receives.
#[must_use]
pub fn recording_scope() -> (ValidationScope, ChangeLog) {
    let log = ChangeLog::new();
    let scope = ValidationScope::from_sink(RecordingSink::new(log.clone()));
    (scope, log)
}

/// An `on_valid_change` handler that records every call.
#[must_use]
pub fn recording_handler() -> (ChangeHandler, ChangeLog) {
    let log = ChangeLog::new();
    let sink = log.clone();
    let handler = ChangeHandler::new(move |c: &ValidityChange| sink.push(Event::Change(c.clone())));
    (handler, log)
}

/// Every map a reducer was invoked with.
#[derive(Debug, Clone, Default)]
pub struct ReducerLog {
    calls: Rc<RefCell<Vec<ValidityMap>>>,
}

impl ReducerLog {
    #[must_use]
    pub fn calls(&self) -> Vec<ValidityMap> {
        self.calls.borrow().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    #[must_use]
    pub fn last(&self) -> Option<ValidityMap> {
        self.calls.borrow().last().cloned()
    }
}

/// Wrap `inner` so each invocation is recorded before delegating.
#[must_use]
pub fn probe_reducer(inner: Reducer) -> (Reducer, ReducerLog) {
    let log = ReducerLog::default();
    let calls = Rc::clone(&log.calls);
    let reducer = Reducer::new(move |map: &ValidityMap| {
        calls.borrow_mut().push(map.clone());
        inner.reduce(map)
    });
    (reducer, log)
}

/// Assert the `(id, is_valid, was_valid)` sequence recorded in a [`ChangeLog`].
///
/// ```ignore
/// assert_changes!(log, [("child", Invalid, Unset), ("child", Unset, Invalid)]);
/// ```
#[macro_export]
macro_rules! assert_changes {
    ($log:expr, [$(($id:expr, $is:ident, $was:ident)),* $(,)?]) => {{
        let expected: ::std::vec::Vec<(::std::string::String, $crate::Validity, $crate::Validity)> =
            ::std::vec![$(
                (
                    ::std::string::String::from($id),
                    $crate::Validity::$is,
                    $crate::Validity::$was,
                )
            ),*];
        assert_eq!($log.triples(), expected, "recorded validity changes");
    }};
}
