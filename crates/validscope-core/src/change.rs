#![forbid(unsafe_code)]

//! Validity-change notifications and the reporter's emission rules.
//!
//! [`plan_notifications`] is the whole decision procedure of a reporter: it
//! turns `(is_valid, was_valid, previous_name)` into zero, one, or two
//! [`ValidityChange`]s. Runtimes dispatch the plan to their sinks in order.
//!
//! # Invariants
//!
//! 1. No rename and `is_valid == was_valid`: the plan is empty.
//! 2. A plan never holds more than two changes.
//! 3. On rename with a set `was_valid`, the retraction of the old name comes
//!    first, the registration of the new name second.
//! 4. Renaming to the same name is not a rename.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::identifier::Identifier;
use crate::validity::Validity;

static REPORTER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one reporter instance.
///
/// Unlike [`Identifier`], this never changes across renames; collectors use
/// it to tell two reporters sharing a name apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReporterId(u64);

impl ReporterId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn next() -> Self {
        Self(REPORTER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReporterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reporter#{}", self.0)
    }
}

/// "`id` went from `was_valid` to `is_valid`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityChange {
    pub id: Identifier,
    pub is_valid: Validity,
    pub was_valid: Validity,
    /// Identifier retracted in the same logical event (set on the
    /// registration half of a rename).
    pub retracted: Option<Identifier>,
    pub source: ReporterId,
}

impl ValidityChange {
    /// `(id, is_valid, was_valid)` borrowed view, handy in assertions.
    #[must_use]
    pub fn triple(&self) -> (&str, Validity, Validity) {
        (self.id.as_str(), self.is_valid, self.was_valid)
    }

    /// Whether this change removes `id` from a collector.
    #[must_use]
    pub fn is_retraction(&self) -> bool {
        !self.is_valid.is_set()
    }
}

impl fmt::Display for ValidityChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.id, self.was_valid, self.is_valid)?;
        if let Some(old) = &self.retracted {
            write!(f, " (renamed from {old})")?;
        }
        Ok(())
    }
}

/// Up to two changes, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationPlan {
    changes: Vec<ValidityChange>,
}

impl NotificationPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether the plan retracts one name and registers another.
    #[must_use]
    pub fn is_rename(&self) -> bool {
        self.changes.iter().any(|c| c.retracted.is_some())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidityChange> {
        self.changes.iter()
    }
}

impl IntoIterator for NotificationPlan {
    type Item = ValidityChange;
    type IntoIter = std::vec::IntoIter<ValidityChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NotificationPlan {
    type Item = &'a ValidityChange;
    type IntoIter = std::slice::Iter<'a, ValidityChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Decide what a reporter named `name` must emit.
#[must_use]
pub fn plan_notifications(
    source: ReporterId,
    name: &Identifier,
    is_valid: Validity,
    was_valid: Validity,
    previous_name: Option<&Identifier>,
) -> NotificationPlan {
    let renamed_from = previous_name.filter(|prev| *prev != name);
    let mut changes = Vec::new();

    if let Some(prev) = renamed_from
        && was_valid.is_set()
    {
        changes.push(ValidityChange {
            id: prev.clone(),
            is_valid: Validity::Unset,
            was_valid,
            retracted: None,
            source,
        });
    }

    if renamed_from.is_some() || is_valid != was_valid {
        changes.push(ValidityChange {
            id: name.clone(),
            is_valid,
            was_valid,
            retracted: renamed_from.cloned(),
            source,
        });
    }

    NotificationPlan { changes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(name: &str) -> Identifier {
        Identifier::new(name).unwrap()
    }

    fn validity() -> impl Strategy<Value = Validity> {
        prop_oneof![
            Just(Validity::Unset),
            Just(Validity::Disabled),
            Just(Validity::Valid),
            Just(Validity::Invalid),
        ]
    }

    #[test]
    fn first_report_registers() {
        let plan = plan_notifications(
            ReporterId::next(),
            &id("child"),
            Validity::Invalid,
            Validity::Unset,
            None,
        );
        let triples: Vec<_> = plan.iter().map(ValidityChange::triple).collect();
        assert_eq!(triples, vec![("child", Validity::Invalid, Validity::Unset)]);
    }

    #[test]
    fn rename_retracts_then_registers() {
        let plan = plan_notifications(
            ReporterId::next(),
            &id("renamed"),
            Validity::Valid,
            Validity::Invalid,
            Some(&id("child")),
        );
        assert!(plan.is_rename());
        let changes: Vec<_> = plan.into_iter().collect();
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0].triple(),
            ("child", Validity::Unset, Validity::Invalid)
        );
        assert_eq!(changes[0].retracted, None);
        assert_eq!(
            changes[1].triple(),
            ("renamed", Validity::Valid, Validity::Invalid)
        );
        assert_eq!(changes[1].retracted, Some(id("child")));
    }

    #[test]
    fn rename_without_prior_validity_skips_retraction() {
        let plan = plan_notifications(
            ReporterId::next(),
            &id("new"),
            Validity::Unset,
            Validity::Unset,
            Some(&id("old")),
        );
        assert_eq!(plan.len(), 1);
        let change = plan.iter().next().unwrap();
        assert_eq!(change.triple(), ("new", Validity::Unset, Validity::Unset));
        assert_eq!(change.retracted, Some(id("old")));
    }

    #[test]
    fn same_name_is_not_a_rename() {
        let plan = plan_notifications(
            ReporterId::next(),
            &id("field"),
            Validity::Valid,
            Validity::Valid,
            Some(&id("field")),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn display_mentions_rename() {
        let change = ValidityChange {
            id: id("b"),
            is_valid: Validity::Valid,
            was_valid: Validity::Unset,
            retracted: Some(id("a")),
            source: ReporterId::next(),
        };
        assert_eq!(change.to_string(), "b: unset -> valid (renamed from a)");
    }

    #[test]
    fn reporter_ids_are_unique() {
        let a = ReporterId::next();
        let b = ReporterId::next();
        assert_ne!(a, b);
        assert!(b.id() > a.id());
    }

    proptest! {
        #[test]
        fn unchanged_validity_without_rename_is_silent(v in validity()) {
            let plan = plan_notifications(ReporterId::next(), &id("x"), v, v, None);
            prop_assert!(plan.is_empty());
        }

        #[test]
        fn plans_hold_at_most_two(
            is in validity(),
            was in validity(),
            rename in any::<bool>(),
        ) {
            let prev = id("prev");
            let plan = plan_notifications(
                ReporterId::next(),
                &id("cur"),
                is,
                was,
                rename.then_some(&prev),
            );
            prop_assert!(plan.len() <= 2);
            prop_assert_eq!(plan.is_empty(), !rename && is == was);
            if let Some(last) = plan.iter().last() {
                prop_assert_eq!(last.id.as_str(), "cur");
                prop_assert_eq!(last.is_valid, is);
            }
        }
    }
}
