#![forbid(unsafe_code)]

//! validscope: hierarchical validity propagation for component trees.
//!
//! Reporters ([`Validates`]) announce a four-state [`Validity`] under a
//! name. Collectors ([`Validate`]) gather the announcements made inside
//! their [`ValidationScope`], reduce them with a [`Reducer`] and announce
//! the result to their own enclosing scope.
//!
//! ```
//! use validscope::prelude::*;
//!
//! let form = Validate::mount(
//!     ValidateProps::named("form")?.validate(Reducer::none_invalid()),
//!     &ValidationScope::root(),
//! );
//! let mut email = Validates::mount(
//!     ValidatesProps::named("email")?.validates(Validity::Valid),
//!     form.scope(),
//! );
//! assert_eq!(form.validity(), Validity::Valid);
//!
//! email.set_validity(Validity::Invalid);
//! assert_eq!(form.validity(), Validity::Invalid);
//! # Ok::<(), validscope::IdentifierError>(())
//! ```

pub use validscope_core::{
    Identifier, IdentifierError, NotificationPlan, ParseValidityError, Reducer, ReporterId,
    ScopeError, Validity, ValidityChange, ValidityMap, plan_notifications,
};
pub use validscope_runtime::{
    BatchGuard, ChangeHandler, CollectorConfig, DuplicatePolicy, Provided, ScopeGuard,
    Subscription, Validate, ValidateProps, Validates, ValidatesProps, ValidationScope,
    ValidityWatch, ValiditySink, with_scope,
};

/// The types most callers need.
pub mod prelude {
    pub use crate::{
        ChangeHandler, CollectorConfig, DuplicatePolicy, Identifier, Reducer, Validate,
        ValidateProps, Validates, ValidatesProps, ValidationScope, Validity, ValidityChange,
        ValidityMap, ValidityWatch, ValiditySink, with_scope,
    };
}
