//! Slice values and their in-memory state.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// An entry with a stable identity inside a list slice.
pub trait Keyed {
    /// Identity used for additive merges. Compared verbatim.
    fn key(&self) -> String;
}

/// A value that can be persisted as one slice.
pub trait SliceData: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static {
    /// Number of top-level items, checked against the size ceiling.
    fn item_count(&self) -> usize;

    /// Add every entry of `other` whose key is absent from `self`.
    ///
    /// Never removes or overwrites existing entries. Returns how many
    /// entries were added.
    fn merge_missing(&mut self, other: Self) -> usize;

    /// Drop every entry whose key is present in `covered`.
    ///
    /// Returns how many entries remain.
    fn retain_uncovered(&mut self, covered: &Self) -> usize;
}

impl<V> SliceData for Vec<V>
where
    V: Keyed + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn item_count(&self) -> usize {
        self.len()
    }

    fn merge_missing(&mut self, other: Self) -> usize {
        let mut seen: HashSet<String> = self.iter().map(Keyed::key).collect();
        let before = self.len();
        for item in other {
            if seen.insert(item.key()) {
                self.push(item);
            }
        }
        self.len() - before
    }

    fn retain_uncovered(&mut self, covered: &Self) -> usize {
        let keys: HashSet<String> = covered.iter().map(Keyed::key).collect();
        self.retain(|item| !keys.contains(&item.key()));
        self.len()
    }
}

impl<V> SliceData for BTreeMap<String, V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn item_count(&self) -> usize {
        self.len()
    }

    fn merge_missing(&mut self, other: Self) -> usize {
        let mut added = 0;
        for (key, value) in other {
            if let std::collections::btree_map::Entry::Vacant(slot) = self.entry(key) {
                slot.insert(value);
                added += 1;
            }
        }
        added
    }

    fn retain_uncovered(&mut self, covered: &Self) -> usize {
        self.retain(|key, _| !covered.contains_key(key));
        self.len()
    }
}

/// Observable state of one slice: value plus load/error status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceState<T> {
    /// Current in-memory value (authoritative for the process).
    pub value: T,
    /// Whether a load is in flight.
    pub loading: bool,
    /// Last surfaced error, cleared on the next successful load.
    pub last_error: Option<String>,
}

impl<T: Default> Default for SliceState<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            loading: false,
            last_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        body: String,
    }

    impl Keyed for Item {
        fn key(&self) -> String {
            self.id.clone()
        }
    }

    fn item(id: &str, body: &str) -> Item {
        Item {
            id: id.into(),
            body: body.into(),
        }
    }

    #[test]
    fn list_merge_adds_only_missing() {
        let mut remote = vec![item("a", "remote"), item("b", "remote")];
        let local = vec![item("b", "local"), item("c", "local")];

        let added = remote.merge_missing(local);

        assert_eq!(added, 1);
        assert_eq!(remote.len(), 3);
        // Existing entries are never overwritten
        assert_eq!(remote[1].body, "remote");
        assert_eq!(remote[2], item("c", "local"));
    }

    #[test]
    fn list_merge_dedupes_within_other() {
        let mut remote: Vec<Item> = Vec::new();
        let added = remote.merge_missing(vec![item("x", "1"), item("x", "2")]);
        assert_eq!(added, 1);
        assert_eq!(remote, vec![item("x", "1")]);
    }

    #[test]
    fn map_merge_is_additive() {
        let mut remote: BTreeMap<String, u32> = BTreeMap::from([("q1".into(), 1)]);
        let local = BTreeMap::from([("q1".into(), 99), ("q2".into(), 2)]);

        assert_eq!(remote.merge_missing(local), 1);
        assert_eq!(remote["q1"], 1);
        assert_eq!(remote["q2"], 2);
        assert_eq!(remote.item_count(), 2);
    }

    #[test]
    fn retain_uncovered_keeps_only_unwritten_entries() {
        let mut pending = vec![item("q1", "pending"), item("q2", "pending")];
        let written = vec![item("q0", "remote"), item("q1", "remote")];

        assert_eq!(pending.retain_uncovered(&written), 1);
        assert_eq!(pending, vec![item("q2", "pending")]);

        let mut map: BTreeMap<String, u32> = BTreeMap::from([("a".into(), 1)]);
        assert_eq!(map.retain_uncovered(&BTreeMap::from([("a".into(), 7)])), 0);
    }

    #[test]
    fn default_state_is_idle() {
        let state: SliceState<Vec<Item>> = SliceState::default();
        assert!(state.value.is_empty());
        assert!(!state.loading);
        assert!(state.last_error.is_none());
    }
}
