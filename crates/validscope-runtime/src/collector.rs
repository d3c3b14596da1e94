#![forbid(unsafe_code)]

//! The collector component, [`Validate`].
//!
//! A collector aggregates the validities reported into its child scope and
//! announces the result upward through its own reporting role, so scopes
//! nest to any depth. Each level only sees the reporters mounted directly in
//! its scope; deeper descendants arrive pre-aggregated by their own
//! collectors.
//!
//! # Invariants
//!
//! 1. An identifier is in the map iff its latest admitted notification was
//!    not `Unset`.
//! 2. The reducer runs after every admitted child change, and after a
//!    reducer swap, but never inside an open batch.
//! 3. The announced validity is the override when set, else the reducer
//!    result.
//! 4. No internal borrow is held while handlers, watchers, or the parent
//!    scope run.
//! 5. The parent scope and the watch receive announcements in order and end
//!    on the current value, even when a handler changes the collector while
//!    an announcement is in flight.
//! 6. Inside a batch, departures are held until the batch closes, so a
//!    renamed child is never absent under both names.
//! 7. After unmount, child events still update the map but nothing is
//!    reduced or announced.
//!
//! # Failure Modes
//!
//! - Reducer panic: propagates to the reporter or caller that triggered it.
//! - Handler that flips the collector on every announcement: never settles.
//! - Reducer touching its own collector: panics (`RefCell` already borrowed).
//! - Duplicate identifiers: resolved by [`DuplicatePolicy`].

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use validscope_core::{
    Identifier, IdentifierError, Reducer, ReporterId, ScopeError, Validity, ValidityChange,
    ValidityMap,
};

use crate::reporter::{ChangeHandler, Notifier, ValidatesProps};
use crate::scope::{ValidationScope, ValiditySink};
use crate::watch::ValidityWatch;

/// What a collector does when two live reporters share an identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DuplicatePolicy {
    /// The latest writer owns the entry; a warning is logged.
    #[default]
    LastWriteWins,
    /// The first live owner keeps the entry; other writers are dropped and
    /// recorded as [`ScopeError::DuplicateIdentifier`].
    Reject,
}

/// Collector configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CollectorConfig {
    pub duplicate_policy: DuplicatePolicy,
    /// Run the reducer over the empty map at mount instead of starting from
    /// `Unset`.
    pub recompute_on_mount: bool,
}

impl CollectorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    #[must_use]
    pub fn with_recompute_on_mount(mut self, enabled: bool) -> Self {
        self.recompute_on_mount = enabled;
        self
    }
}

/// Inputs of a collector: the reporter props plus a reducer.
#[derive(Debug, Clone)]
pub struct ValidateProps {
    pub reporter: ValidatesProps,
    pub validate: Reducer,
}

impl ValidateProps {
    #[must_use]
    pub fn new(name: Identifier) -> Self {
        Self {
            reporter: ValidatesProps::new(name),
            validate: Reducer::unset(),
        }
    }

    pub fn named(name: impl AsRef<str>) -> Result<Self, IdentifierError> {
        Ok(Self::new(Identifier::new(name)?))
    }

    #[must_use]
    pub fn name(mut self, name: Identifier) -> Self {
        self.reporter = self.reporter.name(name);
        self
    }

    /// Override for the announced validity; `Unset` defers to the reducer.
    #[must_use]
    pub fn validates(mut self, validity: impl Into<Validity>) -> Self {
        self.reporter = self.reporter.validates(validity);
        self
    }

    #[must_use]
    pub fn on_valid_change(mut self, handler: impl Into<ChangeHandler>) -> Self {
        self.reporter = self.reporter.on_valid_change(handler);
        self
    }

    #[must_use]
    pub fn validate(mut self, reducer: impl Into<Reducer>) -> Self {
        self.validate = reducer.into();
        self
    }
}

struct CollectorState {
    notifier: Notifier,
    config: CollectorConfig,
    mounted: bool,
    override_validity: Validity,
    reducer: Reducer,
    map: ValidityMap,
    owners: AHashMap<Identifier, ReporterId>,
    computed: Validity,
    reported: Validity,
    batch_depth: u32,
    pending: bool,
    /// Departures held until the outermost batch closes.
    deferred: Vec<ValidityChange>,
    /// Name the parent scope last heard, when a rename is still unannounced.
    renamed_from: Option<Identifier>,
    dispatching: bool,
    rejected: Vec<ScopeError>,
}

impl CollectorState {
    fn effective(&self) -> Validity {
        self.override_validity.or(self.computed)
    }

    /// What the parent scope should hold for this collector.
    fn target(&self) -> Validity {
        if self.mounted {
            self.effective()
        } else {
            Validity::Unset
        }
    }

    fn settled(&self) -> bool {
        self.target() == self.reported && (self.renamed_from.is_none() || !self.mounted)
    }

    /// Apply the duplicate policy to `change`; `false` drops it.
    fn admit(&mut self, change: &ValidityChange) -> bool {
        let owner = self.owners.get(change.id.as_str()).copied();
        match owner {
            None => {
                if change.is_valid.is_set() {
                    self.owners.insert(change.id.clone(), change.source);
                }
                true
            }
            Some(owner) if owner == change.source => {
                if !change.is_valid.is_set() {
                    self.owners.remove(change.id.as_str());
                }
                true
            }
            Some(owner) => match self.config.duplicate_policy {
                DuplicatePolicy::LastWriteWins => {
                    tracing::warn!(
                        scope = %self.notifier.name,
                        id = %change.id,
                        %owner,
                        intruder = %change.source,
                        "duplicate identifier; last write wins"
                    );
                    if change.is_valid.is_set() {
                        self.owners.insert(change.id.clone(), change.source);
                    } else {
                        self.owners.remove(change.id.as_str());
                    }
                    true
                }
                DuplicatePolicy::Reject => {
                    if change.is_valid.is_set() {
                        tracing::warn!(
                            scope = %self.notifier.name,
                            id = %change.id,
                            %owner,
                            intruder = %change.source,
                            "duplicate identifier rejected"
                        );
                        self.rejected.push(ScopeError::DuplicateIdentifier {
                            id: change.id.clone(),
                            owner,
                            intruder: change.source,
                        });
                    }
                    false
                }
            },
        }
    }

    /// Drop `old` if `source` still owns it.
    fn release(&mut self, old: &Identifier, source: ReporterId) {
        if self.owners.get(old.as_str()) == Some(&source) {
            self.owners.remove(old.as_str());
            self.map.remove(old.as_str());
        }
    }

    fn recompute(&mut self) {
        self.pending = false;
        let computed = self.reducer.reduce(&self.map);
        tracing::debug!(
            scope = %self.notifier.name,
            children = self.map.len(),
            from = %self.computed,
            to = %computed,
            "recomputed aggregate validity"
        );
        self.computed = computed;
    }
}

struct CollectorCell {
    state: RefCell<CollectorState>,
    watch: ValidityWatch,
}

impl CollectorCell {
    fn on_child_valid_change(&self, change: &ValidityChange) {
        let _span = tracing::debug_span!(
            "child_valid_change",
            child = %change.id,
            is = %change.is_valid,
            was = %change.was_valid
        )
        .entered();

        {
            let mut state = self.state.borrow_mut();
            if state.batch_depth > 0 && !change.is_valid.is_set() && change.retracted.is_none() {
                state.deferred.push(change.clone());
                state.pending = true;
                return;
            }
            if !state.admit(change) {
                return;
            }
            state.map.apply(&change.id, change.is_valid);
            if let Some(old) = &change.retracted {
                state.release(old, change.source);
            }
            if !state.mounted {
                return;
            }
            if state.batch_depth > 0 {
                state.pending = true;
                return;
            }
            state.recompute();
        }
        self.report(None);
    }

    fn begin_batch(&self) {
        self.state.borrow_mut().batch_depth += 1;
    }

    fn end_batch(&self) {
        let flush = {
            let mut state = self.state.borrow_mut();
            state.batch_depth = state.batch_depth.saturating_sub(1);
            if state.batch_depth > 0 {
                return;
            }
            for change in std::mem::take(&mut state.deferred) {
                state.release(&change.id, change.source);
            }
            let flush = state.pending && state.mounted;
            if flush {
                state.recompute();
            }
            flush
        };
        if flush {
            self.report(None);
        }
    }

    /// Announce the target validity through the reporting role.
    ///
    /// Calls made while an announcement is in flight (from handlers, the
    /// parent scope or watchers) only record their rename; the outermost call
    /// loops until the announced value matches the state.
    fn report(&self, previous_name: Option<&Identifier>) {
        {
            let mut state = self.state.borrow_mut();
            if state.renamed_from.is_none() {
                state.renamed_from = previous_name.cloned();
            }
            if std::mem::replace(&mut state.dispatching, true) {
                return;
            }
        }
        loop {
            let (notifier, plan) = {
                let mut state = self.state.borrow_mut();
                let mounted = state.mounted;
                let renamed_from = state.renamed_from.take().filter(|_| mounted);
                let target = state.target();
                let plan = state
                    .notifier
                    .plan(target, state.reported, renamed_from.as_ref());
                state.reported = target;
                (state.notifier.clone(), plan)
            };
            notifier.dispatch(plan);
            let reported = self.state.borrow().reported;
            self.watch.set(reported);

            let mut state = self.state.borrow_mut();
            if state.settled() {
                state.dispatching = false;
                state.renamed_from = None;
                return;
            }
        }
    }

    fn retire(&self) {
        {
            let mut state = self.state.borrow_mut();
            if !std::mem::replace(&mut state.mounted, false) {
                return;
            }
        }
        self.report(None);
    }
}

/// Sink published into a collector's subtree.
struct ChildSink {
    cell: Weak<CollectorCell>,
}

impl ValiditySink for ChildSink {
    fn on_valid_change(&self, change: &ValidityChange) {
        if let Some(cell) = self.cell.upgrade() {
            cell.on_child_valid_change(change);
        }
    }

    fn begin_batch(&self) {
        if let Some(cell) = self.cell.upgrade() {
            cell.begin_batch();
        }
    }

    fn end_batch(&self) {
        if let Some(cell) = self.cell.upgrade() {
            cell.end_batch();
        }
    }
}

/// What a collector renders: its children, wrapped in its child scope.
#[derive(Debug)]
pub struct Provided<'a, C> {
    pub scope: &'a ValidationScope,
    pub children: Option<&'a C>,
}

/// A validation-scope boundary.
///
/// Dropping a mounted collector unmounts it. Reporters still mounted in its
/// scope afterwards notify nobody.
pub struct Validate<C = ()> {
    cell: Rc<CollectorCell>,
    child_scope: ValidationScope,
    children: Option<C>,
    attached: bool,
}

impl Validate {
    pub fn mount(props: ValidateProps, scope: &ValidationScope) -> Self {
        Self::mount_with_config(props, scope, CollectorConfig::default())
    }

    pub fn mount_with_config(
        props: ValidateProps,
        scope: &ValidationScope,
        config: CollectorConfig,
    ) -> Self {
        let ValidateProps { reporter, validate } = props;
        let computed = if config.recompute_on_mount {
            validate.reduce(&ValidityMap::new())
        } else {
            Validity::Unset
        };
        let notifier = Notifier::new(reporter.name, reporter.on_valid_change, scope.clone());
        tracing::debug!(scope = %notifier.name, source = %notifier.source, ?config, "mounting collector");

        let cell = Rc::new(CollectorCell {
            state: RefCell::new(CollectorState {
                notifier,
                config,
                mounted: true,
                override_validity: reporter.validates,
                reducer: validate,
                map: ValidityMap::new(),
                owners: AHashMap::new(),
                computed,
                reported: Validity::Unset,
                batch_depth: 0,
                pending: false,
                deferred: Vec::new(),
                renamed_from: None,
                dispatching: false,
                rejected: Vec::new(),
            }),
            watch: ValidityWatch::default(),
        });
        let child_scope = ValidationScope::from_sink(ChildSink {
            cell: Rc::downgrade(&cell),
        });
        cell.report(None);

        Self {
            cell,
            child_scope,
            children: None,
            attached: true,
        }
    }

    /// Mount into the ambient scope (see [`ValidationScope::current`]).
    pub fn mount_ambient(props: ValidateProps) -> Self {
        Self::mount(props, &ValidationScope::current())
    }
}

impl<C> Validate<C> {
    /// Attach children; the returned collector renders them.
    pub fn with_children<D>(mut self, children: D) -> Validate<D> {
        let attached = std::mem::replace(&mut self.attached, false);
        Validate {
            cell: Rc::clone(&self.cell),
            child_scope: self.child_scope.clone(),
            children: Some(children),
            attached,
        }
    }

    pub fn set_children(&mut self, children: Option<C>) {
        self.children = children;
    }

    /// Apply new props. A different reducer recomputes from the current map
    /// before the announced validity is re-evaluated.
    pub fn update(&mut self, next: ValidateProps) {
        let ValidateProps { reporter, validate } = next;
        let previous_name = {
            let mut state = self.cell.state.borrow_mut();
            let previous_name = (reporter.name != state.notifier.name)
                .then(|| std::mem::replace(&mut state.notifier.name, reporter.name));
            state.notifier.handler = reporter.on_valid_change;
            state.override_validity = reporter.validates;
            if !state.reducer.same(&validate) {
                tracing::debug!(scope = %state.notifier.name, reducer = ?validate, "reducer replaced");
                state.reducer = validate;
                if state.mounted && state.batch_depth == 0 {
                    state.recompute();
                } else {
                    state.pending = true;
                }
            }
            previous_name
        };
        self.cell.report(previous_name.as_ref());
    }

    /// Current props, for building the next update.
    #[must_use]
    pub fn props(&self) -> ValidateProps {
        let state = self.cell.state.borrow();
        ValidateProps {
            reporter: ValidatesProps {
                name: state.notifier.name.clone(),
                validates: state.override_validity,
                on_valid_change: state.notifier.handler.clone(),
            },
            validate: state.reducer.clone(),
        }
    }

    /// Change only the override.
    pub fn set_override(&mut self, validity: impl Into<Validity>) {
        let next = self.props().validates(validity);
        self.update(next);
    }

    /// Change only the reducer.
    pub fn set_reducer(&mut self, reducer: impl Into<Reducer>) {
        let next = self.props().validate(reducer);
        self.update(next);
    }

    /// Change only the name.
    pub fn rename(&mut self, name: Identifier) {
        let next = self.props().name(name);
        self.update(next);
    }

    /// Unmount, reporting a final transition to `Unset`.
    pub fn unmount(self) {
        self.cell.retire();
    }

    /// Children wrapped in the scope that reaches this collector.
    #[must_use]
    pub fn render(&self) -> Provided<'_, C> {
        Provided {
            scope: &self.child_scope,
            children: self.children.as_ref(),
        }
    }

    /// Run `f` with the child scope passed in and entered as ambient.
    pub fn provide<R>(&self, f: impl FnOnce(&ValidationScope) -> R) -> R {
        let _guard = self.child_scope.enter();
        f(&self.child_scope)
    }

    /// Scope to mount child reporters into.
    #[must_use]
    pub fn scope(&self) -> &ValidationScope {
        &self.child_scope
    }

    /// Announced validity: override if set, else the reducer result.
    #[must_use]
    pub fn validity(&self) -> Validity {
        self.cell.state.borrow().effective()
    }

    /// Latest reducer result, regardless of the override.
    #[must_use]
    pub fn computed(&self) -> Validity {
        self.cell.state.borrow().computed
    }

    /// Snapshot of the registered child validities.
    #[must_use]
    pub fn map(&self) -> ValidityMap {
        self.cell.state.borrow().map.clone()
    }

    /// Handle that follows the announced validity.
    #[must_use]
    pub fn watch(&self) -> ValidityWatch {
        self.cell.watch.clone()
    }

    /// Duplicate writes dropped under [`DuplicatePolicy::Reject`].
    #[must_use]
    pub fn rejected(&self) -> Vec<ScopeError> {
        self.cell.state.borrow().rejected.clone()
    }

    #[must_use]
    pub fn config(&self) -> CollectorConfig {
        self.cell.state.borrow().config.clone()
    }

    #[must_use]
    pub fn name(&self) -> Identifier {
        self.cell.state.borrow().notifier.name.clone()
    }

    #[must_use]
    pub fn source_id(&self) -> ReporterId {
        self.cell.state.borrow().notifier.source
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.cell.state.borrow().mounted
    }
}

impl<C> Drop for Validate<C> {
    fn drop(&mut self) {
        if self.attached {
            self.cell.retire();
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for Validate<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.cell.state.borrow();
        f.debug_struct("Validate")
            .field("name", &state.notifier.name)
            .field("override", &state.override_validity)
            .field("computed", &state.computed)
            .field("map", &state.map)
            .field("mounted", &state.mounted)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::Validates;
    use tracing_test::traced_test;

    fn id(name: &str) -> Identifier {
        Identifier::new(name).unwrap()
    }

    fn leaf(name: &str, v: Validity, scope: &ValidationScope) -> Validates {
        Validates::mount(ValidatesProps::new(id(name)).validates(v), scope)
    }

    #[test]
    fn starts_unset_and_silent() {
        let form = Validate::mount(
            ValidateProps::new(id("form")).validate(Reducer::all_valid()),
            &ValidationScope::root(),
        );
        assert_eq!(form.validity(), Validity::Unset);
        assert!(form.map().is_empty());
        assert_eq!(form.watch().version(), 0);
    }

    #[test]
    fn recompute_on_mount_applies_reducer_to_empty_map() {
        let form = Validate::mount_with_config(
            ValidateProps::new(id("form")).validate(Reducer::all_valid()),
            &ValidationScope::root(),
            CollectorConfig::new().with_recompute_on_mount(true),
        );
        assert_eq!(form.validity(), Validity::Valid);
    }

    #[test]
    fn child_changes_update_map_and_validity() {
        let form = Validate::mount(
            ValidateProps::new(id("form")).validate(Reducer::none_invalid()),
            &ValidationScope::root(),
        );
        let mut email = leaf("email", Validity::Valid, form.scope());
        assert_eq!(form.validity(), Validity::Valid);

        email.set_validity(Validity::Invalid);
        assert_eq!(form.map().get("email"), Validity::Invalid);
        assert_eq!(form.validity(), Validity::Invalid);

        email.unmount();
        assert!(form.map().is_empty());
        assert_eq!(form.validity(), Validity::Valid);
    }

    #[test]
    fn reducer_swap_recomputes_without_child_event() {
        let mut form = Validate::mount(
            ValidateProps::new(id("form")),
            &ValidationScope::root(),
        );
        let _a = leaf("a", Validity::Invalid, form.scope());
        assert_eq!(form.validity(), Validity::Unset);

        form.set_reducer(Reducer::none_invalid());
        assert_eq!(form.computed(), Validity::Invalid);
        assert_eq!(form.validity(), Validity::Invalid);
    }

    #[test]
    fn same_reducer_does_not_recompute() {
        let calls = Rc::new(std::cell::Cell::new(0u32));
        let c = Rc::clone(&calls);
        let reducer = Reducer::new(move |_| {
            c.set(c.get() + 1);
            Validity::Valid
        });
        let mut form = Validate::mount(
            ValidateProps::new(id("form")).validate(reducer),
            &ValidationScope::root(),
        );
        let _a = leaf("a", Validity::Valid, form.scope());
        assert_eq!(calls.get(), 1);

        form.set_override(Validity::Disabled);
        assert_eq!(calls.get(), 1);
        assert_eq!(form.validity(), Validity::Disabled);
    }

    #[test]
    fn rename_is_applied_atomically() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let reducer = Reducer::new(move |m: &ValidityMap| {
            s.borrow_mut()
                .push(m.ids().map(|i| i.to_string()).collect::<Vec<_>>());
            Validity::Valid
        });
        let form = Validate::mount(
            ValidateProps::new(id("form")).validate(reducer),
            &ValidationScope::root(),
        );
        let mut field = leaf("child", Validity::Invalid, form.scope());
        field.update(ValidatesProps::new(id("renamed")).validates(Validity::Valid));

        assert_eq!(
            *seen.borrow(),
            vec![vec!["child".to_string()], vec!["renamed".to_string()]]
        );
    }

    #[test]
    fn rename_from_unset_does_not_evict_another_owner() {
        let form = Validate::mount(
            ValidateProps::new(id("form")).validate(Reducer::none_invalid()),
            &ValidationScope::root(),
        );
        let _owner = leaf("x", Validity::Invalid, form.scope());
        let mut other = leaf("y", Validity::Unset, form.scope());
        other.update(ValidatesProps::new(id("z")).validates(Validity::Valid));
        // `y` never registered, so its rename must not touch anything else.
        let mut renamer = leaf("w", Validity::Unset, form.scope());
        renamer.rename(id("v"));

        assert_eq!(form.map().get("x"), Validity::Invalid);
        assert_eq!(form.map().get("z"), Validity::Valid);
        assert_eq!(form.map().len(), 2);
    }

    #[traced_test]
    #[test]
    fn duplicate_last_write_wins_and_warns() {
        let form = Validate::mount(
            ValidateProps::new(id("form")).validate(Reducer::none_invalid()),
            &ValidationScope::root(),
        );
        let _a = leaf("dup", Validity::Valid, form.scope());
        let _b = leaf("dup", Validity::Invalid, form.scope());
        assert_eq!(form.map().get("dup"), Validity::Invalid);
        assert!(form.rejected().is_empty());
        assert!(logs_contain("duplicate identifier; last write wins"));
    }

    #[test]
    fn duplicate_reject_keeps_first_owner() {
        let form = Validate::mount_with_config(
            ValidateProps::new(id("form")).validate(Reducer::none_invalid()),
            &ValidationScope::root(),
            CollectorConfig::new().with_duplicate_policy(DuplicatePolicy::Reject),
        );
        let a = leaf("dup", Validity::Valid, form.scope());
        let b = leaf("dup", Validity::Invalid, form.scope());
        assert_eq!(form.map().get("dup"), Validity::Valid);

        let rejected = form.rejected();
        assert_eq!(
            rejected,
            vec![ScopeError::DuplicateIdentifier {
                id: id("dup"),
                owner: a.source_id(),
                intruder: b.source_id(),
            }]
        );

        // The intruder's retraction is ignored too.
        drop(b);
        assert_eq!(form.map().get("dup"), Validity::Valid);
        drop(a);
        assert!(form.map().is_empty());
    }

    #[test]
    fn dropped_collector_turns_scope_into_noop() {
        let form = Validate::mount(ValidateProps::new(id("form")), &ValidationScope::root());
        let scope = form.scope().clone();
        let mut field = leaf("f", Validity::Valid, &scope);
        drop(form);
        field.set_validity(Validity::Invalid);
        assert!(field.is_mounted());
    }

    #[test]
    fn with_children_keeps_the_collector_mounted() {
        let form = Validate::mount(
            ValidateProps::new(id("form")).validate(Reducer::none_invalid()),
            &ValidationScope::root(),
        );
        let form = form.with_children(vec!["email", "password"]);
        assert!(form.is_mounted());
        let _f = leaf("email", Validity::Invalid, form.render().scope);
        assert_eq!(form.validity(), Validity::Invalid);
        assert_eq!(form.render().children.map(Vec::len), Some(2));
    }

    #[test]
    fn provide_enters_child_scope() {
        let form = Validate::mount(
            ValidateProps::new(id("form")).validate(Reducer::none_invalid()),
            &ValidationScope::root(),
        );
        let field = form.provide(|scope| {
            assert!(ValidationScope::current().same(scope));
            Validates::mount_ambient(ValidatesProps::new(id("f")).validates(Validity::Invalid))
        });
        assert!(ValidationScope::current().is_root());
        assert_eq!(form.validity(), Validity::Invalid);
        drop(field);
        assert_eq!(form.validity(), Validity::Valid);
    }

    #[test]
    fn unmounted_collector_still_tracks_departures() {
        let child_slot: Rc<RefCell<Option<Validates>>> = Rc::default();
        let slot = Rc::clone(&child_slot);
        let form = Validate::mount(
            ValidateProps::new(id("form"))
                .validate(Reducer::none_invalid())
                .on_valid_change(move |c: &ValidityChange| {
                    if !c.is_valid.is_set() {
                        let child = slot.borrow_mut().take();
                        drop(child);
                    }
                }),
            &ValidationScope::root(),
        );
        *child_slot.borrow_mut() = Some(leaf("late", Validity::Invalid, form.scope()));
        let cell = Rc::clone(&form.cell);

        form.unmount();

        assert!(child_slot.borrow().is_none());
        let state = cell.state.borrow();
        assert!(state.map.is_empty());
        assert_eq!(state.computed, Validity::Invalid);
        assert_eq!(state.reported, Validity::Unset);
        assert_eq!(cell.watch.get(), Validity::Unset);
    }

    #[test]
    fn departures_inside_a_batch_wait_for_its_end() {
        let form = Validate::mount(
            ValidateProps::new(id("form")).validate(Reducer::none_invalid()),
            &ValidationScope::root(),
        );
        let field = leaf("gone", Validity::Invalid, form.scope());
        {
            let _batch = form.scope().batch();
            field.unmount();
            assert_eq!(form.map().get("gone"), Validity::Invalid);
            assert_eq!(form.validity(), Validity::Invalid);
        }
        assert!(form.map().is_empty());
        assert_eq!(form.validity(), Validity::Valid);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_deserializes_with_defaults() {
        let config: CollectorConfig =
            serde_json::from_str(r#"{"duplicate_policy":"reject"}"#).unwrap();
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert!(!config.recompute_on_mount);
    }
}
