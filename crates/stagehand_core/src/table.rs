//! Ordered key/value tables with a derived lookup map
//!
//! The ordered entry list is the single source of truth and is what gets
//! serialized. The lookup map is a cache built on first access and thrown
//! away on every mutation.
//!
//! Duplicate keys are allowed in the list. The derived map resolves them
//! last-write-wins; use [`KeyValueTable::from_entries_strict`] to reject
//! them up front instead.

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::OnceLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TableError;

/// A single table entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue<K, V> {
    key: K,
    value: V,
}

impl<K, V> KeyValue<K, V> {
    /// Create a new entry
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    /// Entry key
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Entry value
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Split into key and value
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> From<(K, V)> for KeyValue<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// Ordered key/value list with a lazily derived unique-key map
pub struct KeyValueTable<K, V> {
    /// Entries in insertion order
    entries: Vec<KeyValue<K, V>>,
    /// Key -> index of the last entry carrying that key
    lookup: OnceLock<HashMap<K, usize>>,
}

impl<K, V> KeyValueTable<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            lookup: OnceLock::new(),
        }
    }

    /// Create a table from entries, keeping duplicates
    pub fn from_entries<I, E>(entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<KeyValue<K, V>>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
            lookup: OnceLock::new(),
        }
    }

    /// Create a table from entries, failing on the first repeated key
    pub fn from_entries_strict<I, E>(entries: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = E>,
        E: Into<KeyValue<K, V>>,
        K: fmt::Debug,
    {
        let table = Self::from_entries(entries);
        let mut seen = HashSet::with_capacity(table.entries.len());
        for entry in &table.entries {
            if !seen.insert(&entry.key) {
                return Err(TableError::DuplicateKey(format!("{:?}", entry.key)));
            }
        }
        Ok(table)
    }

    /// Append an entry
    pub fn push(&mut self, key: K, value: V) {
        self.entries.push(KeyValue::new(key, value));
        self.invalidate();
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.invalidate();
    }

    /// Look up a value by key
    pub fn get<Q>(&self, key: &Q) -> Result<&V, TableError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        self.lookup()
            .get(key)
            .map(|&index| &self.entries[index].value)
            .ok_or_else(|| TableError::KeyNotFound(format!("{:?}", key)))
    }

    /// Check whether a key is present
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup().contains_key(key)
    }

    /// Number of entries, duplicates included
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at a position in insertion order
    pub fn entry_at(&self, index: isize) -> Result<&KeyValue<K, V>, TableError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .ok_or(TableError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    /// Recompute the lookup map from the current entries
    pub fn rebuild(&mut self) {
        self.lookup = OnceLock::from(Self::build_lookup(&self.entries));
    }

    /// The derived lookup map (key -> entry index), built on demand
    pub fn lookup(&self) -> &HashMap<K, usize> {
        self.lookup.get_or_init(|| Self::build_lookup(&self.entries))
    }

    /// Number of distinct keys
    pub fn distinct_count(&self) -> usize {
        self.lookup().len()
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[KeyValue<K, V>] {
        &self.entries
    }

    /// Iterate over `(key, value)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|e| (&e.key, &e.value))
    }

    fn invalidate(&mut self) {
        self.lookup = OnceLock::new();
    }

    fn build_lookup(entries: &[KeyValue<K, V>]) -> HashMap<K, usize> {
        let mut map = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            // Later entries overwrite earlier ones
            map.insert(entry.key.clone(), index);
        }
        map
    }
}

impl<K, V> Default for KeyValueTable<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for KeyValueTable<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn clone(&self) -> Self {
        Self::from_entries(self.entries.iter().cloned())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for KeyValueTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyValueTable")
            .field("entries", &self.entries)
            .field("cached", &self.lookup.get().is_some())
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for KeyValueTable<K, V>
where
    K: Hash + Eq + Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

impl<K: Serialize, V: Serialize> Serialize for KeyValueTable<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de, K, V> Deserialize<'de> for KeyValueTable<K, V>
where
    K: Deserialize<'de> + Hash + Eq + Clone,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<KeyValue<K, V>>::deserialize(deserializer).map(Self::from_entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KeyValueTable<String, u32> {
        KeyValueTable::from_entries([
            ("sfx_jump".to_string(), 1),
            ("sfx_land".to_string(), 2),
            ("sfx_jump".to_string(), 3),
        ])
    }

    #[test]
    fn test_last_duplicate_wins() {
        let table = sample();
        assert_eq!(table.get("sfx_jump"), Ok(&3));
        assert_eq!(table.get("sfx_land"), Ok(&2));
        assert_eq!(table.count(), 3);
        assert_eq!(table.distinct_count(), 2);
    }

    #[test]
    fn test_missing_key() {
        let table = sample();
        assert!(matches!(table.get("bgm_title"), Err(TableError::KeyNotFound(_))));
        assert!(!table.contains_key("bgm_title"));
    }

    #[test]
    fn test_entry_at_bounds() {
        let table = sample();
        assert_eq!(table.entry_at(1).unwrap().value(), &2);
        assert_eq!(
            table.entry_at(3),
            Err(TableError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(
            table.entry_at(-1),
            Err(TableError::IndexOutOfRange { index: -1, len: 3 })
        );
    }

    #[test]
    fn test_mutation_invalidates_cache() {
        let mut table = sample();
        assert_eq!(table.get("sfx_jump"), Ok(&3));

        table.push("sfx_jump".to_string(), 4);
        assert_eq!(table.get("sfx_jump"), Ok(&4));

        table.clear();
        assert!(table.is_empty());
        assert!(table.get("sfx_jump").is_err());
    }

    #[test]
    fn test_rebuild_matches_last_occurrence() {
        let mut table = sample();
        table.rebuild();
        for (key, _) in table.iter() {
            let last = table
                .entries()
                .iter()
                .rev()
                .find(|e| e.key() == key)
                .map(|e| *e.value());
            assert_eq!(table.get(key.as_str()).ok().copied(), last);
        }
    }

    #[test]
    fn test_strict_rejects_duplicates() {
        let result = KeyValueTable::<&str, u32>::from_entries_strict([("a", 1), ("a", 2)]);
        assert!(matches!(result, Err(TableError::DuplicateKey(_))));

        let table = KeyValueTable::<&str, u32>::from_entries_strict([("a", 1), ("b", 2)]).unwrap();
        assert_eq!(table.get("b"), Ok(&2));
    }

    #[test]
    fn test_serde_keeps_order_only() {
        let table = sample();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(
            json,
            r#"[{"key":"sfx_jump","value":1},{"key":"sfx_land","value":2},{"key":"sfx_jump","value":3}]"#
        );

        let back: KeyValueTable<String, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.count(), 3);
        assert_eq!(back.get("sfx_jump"), Ok(&3));
    }
}
