#![forbid(unsafe_code)]

//! Proptest strategies over validity values and reporter scripts.

use proptest::prelude::*;
use validscope_core::{Identifier, Validity};

/// Any of the four validity states.
pub fn validity() -> impl Strategy<Value = Validity> {
    proptest::sample::select(Validity::ALL.to_vec())
}

/// Any state except `Unset`.
pub fn set_validity() -> impl Strategy<Value = Validity> {
    proptest::sample::select(vec![Validity::Disabled, Validity::Valid, Validity::Invalid])
}

/// Up to `max_len` successive validities for one reporter.
pub fn validity_sequence(max_len: usize) -> impl Strategy<Value = Vec<Validity>> {
    proptest::collection::vec(validity(), 0..=max_len)
}

/// An identifier drawn from a small pool so collisions actually happen.
pub fn identifier() -> impl Strategy<Value = Identifier> {
    "[a-d]".prop_filter_map("blank identifier", |name| Identifier::new(name).ok())
}

/// One step applied to a collection of reporters, addressed by slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Set { slot: usize, validity: Validity },
    Unmount { slot: usize },
}

/// A script of steps over `slots` reporters.
pub fn script(slots: usize, max_len: usize) -> impl Strategy<Value = Vec<Step>> {
    let step = prop_oneof![
        3 => (0..slots, validity()).prop_map(|(slot, validity)| Step::Set { slot, validity }),
        1 => (0..slots).prop_map(|slot| Step::Unmount { slot }),
    ];
    proptest::collection::vec(step, 0..=max_len)
}
