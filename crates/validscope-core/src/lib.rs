#![forbid(unsafe_code)]

//! Validity model for validscope.
//!
//! This crate holds the data and the pure decision rules; it owns no shared
//! state and performs no dispatch:
//! - [`Validity`]: the four-state signal (unset, disabled, valid, invalid)
//! - [`Identifier`]: non-empty reporter names
//! - [`ValidityMap`]: a collector's registry of child validities
//! - [`Reducer`]: identity-compared aggregation over a map
//! - [`ValidityChange`] and [`plan_notifications`]: what a reporter emits

pub mod change;
pub mod error;
pub mod identifier;
pub mod map;
pub mod reducer;
pub mod validity;

pub use change::{NotificationPlan, ReporterId, ValidityChange, plan_notifications};
pub use error::{IdentifierError, ScopeError};
pub use identifier::Identifier;
pub use map::ValidityMap;
pub use reducer::Reducer;
pub use validity::{ParseValidityError, Validity};
