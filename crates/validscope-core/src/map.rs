#![forbid(unsafe_code)]

//! Registry of child validities owned by one collector.
//!
//! # Invariants
//!
//! 1. No entry ever holds [`Validity::Unset`]: applying `Unset` removes the
//!    identifier instead of storing it.
//! 2. Iteration order is the identifiers' sort order, so reducers and
//!    snapshots are deterministic.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::identifier::Identifier;
use crate::validity::Validity;

/// Mapping from child identifier to its last reported, non-unset validity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ValidityMap {
    entries: BTreeMap<Identifier, Validity>,
}

impl ValidityMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `validity` for `id`. `Unset` removes the entry.
    ///
    /// Returns the previous stored value (`Unset` when absent).
    pub fn apply(&mut self, id: &Identifier, validity: Validity) -> Validity {
        let previous = if validity.is_set() {
            self.entries.insert(id.clone(), validity)
        } else {
            self.entries.remove(id.as_str())
        };
        previous.unwrap_or(Validity::Unset)
    }

    /// Remove `id`, returning what it held.
    pub fn remove(&mut self, id: &str) -> Validity {
        self.entries.remove(id).unwrap_or(Validity::Unset)
    }

    /// Stored validity for `id`, `Unset` when absent.
    #[must_use]
    pub fn get(&self, id: &str) -> Validity {
        self.entries.get(id).copied().unwrap_or(Validity::Unset)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries holding exactly `validity`.
    #[must_use]
    pub fn count(&self, validity: Validity) -> usize {
        self.entries.values().filter(|v| **v == validity).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, Validity)> + '_ {
        self.entries.iter().map(|(id, v)| (id, *v))
    }

    pub fn ids(&self) -> btree_map::Keys<'_, Identifier, Validity> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = Validity> + '_ {
        self.entries.values().copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a ValidityMap {
    type Item = (&'a Identifier, &'a Validity);
    type IntoIter = btree_map::Iter<'a, Identifier, Validity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(Identifier, Validity)> for ValidityMap {
    /// Collect pairs, dropping any `Unset` values.
    fn from_iter<I: IntoIterator<Item = (Identifier, Validity)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (id, v) in iter {
            map.apply(&id, v);
        }
        map
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ValidityMap {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <BTreeMap<Identifier, Validity> as serde::Deserialize>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(name: &str) -> Identifier {
        Identifier::new(name).unwrap()
    }

    #[test]
    fn apply_inserts_and_replaces() {
        let mut map = ValidityMap::new();
        assert_eq!(map.apply(&id("a"), Validity::Valid), Validity::Unset);
        assert_eq!(map.apply(&id("a"), Validity::Invalid), Validity::Valid);
        assert_eq!(map.get("a"), Validity::Invalid);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn apply_unset_removes() {
        let mut map = ValidityMap::new();
        map.apply(&id("a"), Validity::Disabled);
        assert_eq!(map.apply(&id("a"), Validity::Unset), Validity::Disabled);
        assert!(map.is_empty());
        assert!(!map.contains("a"));
    }

    #[test]
    fn unset_for_unknown_is_noop() {
        let mut map = ValidityMap::new();
        assert_eq!(map.apply(&id("ghost"), Validity::Unset), Validity::Unset);
        assert!(map.is_empty());
    }

    #[test]
    fn iteration_is_sorted() {
        let map: ValidityMap = [
            (id("zeta"), Validity::Valid),
            (id("alpha"), Validity::Invalid),
            (id("mid"), Validity::Unset),
        ]
        .into_iter()
        .collect();
        let names: Vec<&str> = map.ids().map(Identifier::as_str).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(map.count(Validity::Valid), 1);
    }

    fn op_strategy() -> impl Strategy<Value = (usize, Validity)> {
        (
            0usize..4,
            prop_oneof![
                Just(Validity::Unset),
                Just(Validity::Disabled),
                Just(Validity::Valid),
                Just(Validity::Invalid),
            ],
        )
    }

    proptest! {
        #[test]
        fn never_stores_unset(ops in proptest::collection::vec(op_strategy(), 0..64)) {
            let names = ["a", "b", "c", "d"];
            let mut map = ValidityMap::new();
            for (idx, v) in ops {
                let key = id(names[idx]);
                map.apply(&key, v);
                prop_assert_eq!(map.get(names[idx]), v);
                prop_assert_eq!(map.contains(names[idx]), v.is_set());
            }
            prop_assert!(map.values().all(Validity::is_set));
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_object() {
        let map: ValidityMap = [(id("b"), Validity::Invalid), (id("a"), Validity::Valid)]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"a":"valid","b":"invalid"}"#);

        let back: ValidityMap = serde_json::from_str(r#"{"a":"valid","x":"unset"}"#).unwrap();
        assert_eq!(back.len(), 1);
        assert!(!back.contains("x"));
    }
}
