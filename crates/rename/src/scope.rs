//! Name tables for one allocation or conflict-detection scope.
//!
//! A [`ScopeTable`] maps `(descriptor key, assigned name)` to the original name that
//! holds it. Two members with different descriptor keys may share a name; two members
//! with the same key may only share a name if they also share the original name.

use crate::naming::NameFactory;
use std::collections::HashMap;

/// How firmly an entry holds its name, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hold {
    /// The member keeps its original name.
    Kept,
    /// The name was forced by an applied mapping.
    Fixed,
    /// The name was allocated.
    Assigned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeEntry {
    pub original: String,
    pub hold: Hold,
}

impl ScopeEntry {
    /// Whether this entry wins over another for the same `(key, name)`.
    fn beats(&self, other: &Self) -> bool {
        (self.hold, &self.original) < (other.hold, &other.original)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScopeTable {
    entries: HashMap<String, HashMap<String, ScopeEntry>>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `name` is used under `key` by `original`.
    ///
    /// When the pair is already taken, the stronger entry stays: kept before fixed
    /// before assigned, then the lexicographically smaller original name.
    pub fn insert(&mut self, key: &str, name: &str, original: &str, hold: Hold) {
        let entry = ScopeEntry {
            original: original.to_string(),
            hold,
        };
        let names = self.entries.entry(key.to_string()).or_default();
        match names.get(name) {
            Some(existing) if !entry.beats(existing) => {}
            _ => {
                names.insert(name.to_string(), entry);
            }
        }
    }

    pub fn get(&self, key: &str, name: &str) -> Option<&ScopeEntry> {
        self.entries.get(key)?.get(name)
    }

    pub fn contains(&self, key: &str, name: &str) -> bool {
        self.get(key, name).is_some()
    }

    /// Pulls names from a freshly reset factory until one is free under `key`.
    pub fn next_free(&self, factory: &mut dyn NameFactory, key: &str) -> String {
        factory.reset();
        loop {
            let candidate = factory.next_name();
            if !self.contains(key, &candidate) {
                return candidate;
            }
        }
    }

    /// Number of `(key, name)` pairs in the table.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
