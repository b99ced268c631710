//! # Memtable
//!
//! The active, mutable write buffer: an ordered map from [`Key`] to [`Value`].
//! Iteration order is the key order, which is also the record order of any
//! SSTable flushed from it.
//!
//! The memtable is value-agnostic: a tombstone is stored as
//! [`Value::TOMBSTONE`] and returned by [`Memtable::get`] like any other value.

use codec::{Key, Value, ENTRY_BYTES};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct Memtable {
    map: BTreeMap<Key, Value>,
}

impl Memtable {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Inserts or overwrites. Last write wins.
    pub fn put(&mut self, key: Key, value: Value) {
        self.map.insert(key, value);
    }

    /// Records a tombstone for `key`.
    pub fn delete(&mut self, key: Key) {
        self.put(key, Value::TOMBSTONE);
    }

    /// Current value for `key`, tombstones included.
    pub fn get(&self, key: &Key) -> Option<Value> {
        self.map.get(key).copied()
    }

    /// Ordered iterator over all entries. Cloneable, so a flush can walk it
    /// once to build the filter and again to write the data.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> + Clone {
        self.map.iter()
    }

    /// Point-in-time view of the full ordered contents, for flushing.
    pub fn snapshot(&self) -> &BTreeMap<Key, Value> {
        &self.map
    }

    /// Moves the contents out, leaving an empty table behind.
    pub fn take(&mut self) -> BTreeMap<Key, Value> {
        std::mem::take(&mut self.map)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Serialized size of the entries when written as an SSTable data block.
    pub fn approx_size(&self) -> usize {
        self.map.len() * ENTRY_BYTES
    }
}

impl FromIterator<(Key, Value)> for Memtable {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        let mut m = Memtable::new();
        for (k, v) in iter {
            m.put(k, v);
        }
        m
    }
}
