#![forbid(unsafe_code)]

//! The reporter component, [`Validates`].
//!
//! A reporter owns no aggregation logic. It remembers its name and its
//! current validity and, on every lifecycle step, forwards the transition to
//! its own `on_valid_change` handler and to its scope.
//!
//! # Lifecycle
//!
//! | Step | Emits |
//! |------|-------|
//! | [`Validates::mount`] | `(name, initial, Unset)` unless `initial` is `Unset` |
//! | [`Validates::update`] | `(name, new, old)`; on rename a retraction of the old name first |
//! | [`Validates::unmount`] / drop | `(name, Unset, current)` unless already `Unset` |
//!
//! # Example
//!
//! ```ignore
//! let email = Validates::mount(
//!     ValidatesProps::named("email")?.validates(Validity::Invalid),
//!     form.scope(),
//! );
//! ```

use std::fmt;
use std::rc::Rc;

use validscope_core::{
    Identifier, IdentifierError, NotificationPlan, ReporterId, Validity, ValidityChange,
    plan_notifications,
};

use crate::scope::ValidationScope;

/// Caller-supplied `on_valid_change` callback.
#[derive(Clone)]
pub struct ChangeHandler(Rc<dyn Fn(&ValidityChange)>);

impl ChangeHandler {
    pub fn new(f: impl Fn(&ValidityChange) + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[inline]
    pub fn call(&self, change: &ValidityChange) {
        (self.0)(change);
    }
}

impl<F: Fn(&ValidityChange) + 'static> From<F> for ChangeHandler {
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

impl fmt::Debug for ChangeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeHandler").finish_non_exhaustive()
    }
}

/// Inputs of a reporter.
#[derive(Debug, Clone)]
pub struct ValidatesProps {
    pub name: Identifier,
    pub validates: Validity,
    pub on_valid_change: Option<ChangeHandler>,
}

impl ValidatesProps {
    #[must_use]
    pub fn new(name: Identifier) -> Self {
        Self {
            name,
            validates: Validity::Unset,
            on_valid_change: None,
        }
    }

    /// Like [`ValidatesProps::new`], validating the name.
    pub fn named(name: impl AsRef<str>) -> Result<Self, IdentifierError> {
        Ok(Self::new(Identifier::new(name)?))
    }

    #[must_use]
    pub fn name(mut self, name: Identifier) -> Self {
        self.name = name;
        self
    }

    #[must_use]
    pub fn validates(mut self, validity: impl Into<Validity>) -> Self {
        self.validates = validity.into();
        self
    }

    #[must_use]
    pub fn on_valid_change(mut self, handler: impl Into<ChangeHandler>) -> Self {
        self.on_valid_change = Some(handler.into());
        self
    }
}

/// The reporting role shared by reporters and collectors.
///
/// Collectors embed one of these rather than wrapping a `Validates`.
#[derive(Debug, Clone)]
pub(crate) struct Notifier {
    pub(crate) source: ReporterId,
    pub(crate) name: Identifier,
    pub(crate) handler: Option<ChangeHandler>,
    pub(crate) scope: ValidationScope,
}

impl Notifier {
    pub(crate) fn new(
        name: Identifier,
        handler: Option<ChangeHandler>,
        scope: ValidationScope,
    ) -> Self {
        Self {
            source: ReporterId::next(),
            name,
            handler,
            scope,
        }
    }

    pub(crate) fn plan(
        &self,
        is_valid: Validity,
        was_valid: Validity,
        previous_name: Option<&Identifier>,
    ) -> NotificationPlan {
        plan_notifications(self.source, &self.name, is_valid, was_valid, previous_name)
    }

    /// Emit each planned change to the handler, then to the scope.
    pub(crate) fn dispatch(&self, plan: NotificationPlan) {
        if plan.is_empty() {
            return;
        }
        let _batch = plan.is_rename().then(|| self.scope.batch());
        for change in &plan {
            tracing::trace!(source = %self.source, %change, "validity change");
            if let Some(handler) = &self.handler {
                handler.call(change);
            }
            self.scope.emit(change);
        }
    }

    pub(crate) fn notify_change(
        &self,
        is_valid: Validity,
        was_valid: Validity,
        previous_name: Option<&Identifier>,
    ) {
        self.dispatch(self.plan(is_valid, was_valid, previous_name));
    }
}

/// A named unit whose validity is reported to the enclosing collector.
///
/// Renders its children unchanged. Dropping a mounted reporter unmounts it.
pub struct Validates<C = ()> {
    notifier: Notifier,
    validates: Validity,
    mounted: bool,
    children: Option<C>,
}

impl Validates {
    /// Mount into `scope` and report the initial validity.
    pub fn mount(props: ValidatesProps, scope: &ValidationScope) -> Self {
        let ValidatesProps {
            name,
            validates,
            on_valid_change,
        } = props;
        let reporter = Self {
            notifier: Notifier::new(name, on_valid_change, scope.clone()),
            validates,
            mounted: true,
            children: None,
        };
        reporter
            .notifier
            .notify_change(validates, Validity::Unset, None);
        reporter
    }

    /// Mount into the ambient scope (see [`ValidationScope::current`]).
    pub fn mount_ambient(props: ValidatesProps) -> Self {
        Self::mount(props, &ValidationScope::current())
    }
}

impl<C> Validates<C> {
    /// Attach children; the returned reporter renders them.
    pub fn with_children<D>(mut self, children: D) -> Validates<D> {
        let mounted = std::mem::replace(&mut self.mounted, false);
        Validates {
            notifier: self.notifier.clone(),
            validates: self.validates,
            mounted,
            children: Some(children),
        }
    }

    pub fn set_children(&mut self, children: Option<C>) {
        self.children = children;
    }

    /// Apply new props, reporting a changed validity or name.
    pub fn update(&mut self, next: ValidatesProps) {
        let ValidatesProps {
            name,
            validates,
            on_valid_change,
        } = next;
        let previous_name =
            (name != self.notifier.name).then(|| std::mem::replace(&mut self.notifier.name, name));
        let was_valid = std::mem::replace(&mut self.validates, validates);
        self.notifier.handler = on_valid_change;

        if self.mounted {
            self.notifier
                .notify_change(validates, was_valid, previous_name.as_ref());
        }
    }

    /// Change only the validity.
    pub fn set_validity(&mut self, validity: impl Into<Validity>) {
        let next = self.props().validates(validity);
        self.update(next);
    }

    /// Change only the name.
    pub fn rename(&mut self, name: Identifier) {
        let next = self.props().name(name);
        self.update(next);
    }

    /// Current props, for building the next update.
    #[must_use]
    pub fn props(&self) -> ValidatesProps {
        ValidatesProps {
            name: self.notifier.name.clone(),
            validates: self.validates,
            on_valid_change: self.notifier.handler.clone(),
        }
    }

    /// Unmount, reporting a final transition to `Unset`.
    pub fn unmount(mut self) {
        self.retire();
    }

    fn retire(&mut self) {
        if std::mem::replace(&mut self.mounted, false) {
            self.notifier
                .notify_change(Validity::Unset, self.validates, None);
        }
    }

    /// The children, unmodified; `None` renders nothing.
    #[must_use]
    pub fn render(&self) -> Option<&C> {
        self.children.as_ref()
    }

    #[must_use]
    pub fn name(&self) -> &Identifier {
        &self.notifier.name
    }

    #[must_use]
    pub fn validity(&self) -> Validity {
        self.validates
    }

    #[must_use]
    pub fn source_id(&self) -> ReporterId {
        self.notifier.source
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    #[must_use]
    pub fn scope(&self) -> &ValidationScope {
        &self.notifier.scope
    }
}

impl<C> Drop for Validates<C> {
    fn drop(&mut self) {
        self.retire();
    }
}

impl<C: fmt::Debug> fmt::Debug for Validates<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validates")
            .field("name", &self.notifier.name)
            .field("validates", &self.validates)
            .field("mounted", &self.mounted)
            .field("children", &self.children)
            .finish()
    }
}
