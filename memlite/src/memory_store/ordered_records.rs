use crate::cache::cache::{KeyType, Record};
use linked_hash_map::LinkedHashMap;

/// Key to record map that remembers insertion order.
///
/// The earliest inserted key sits at the front of the list and is
/// evicted in O(1). Overwriting a key keeps its original position.
#[derive(Default)]
pub struct OrderedRecords {
    records: LinkedHashMap<KeyType, Record>,
}

impl OrderedRecords {
    pub fn new() -> OrderedRecords {
        OrderedRecords::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_key(&self, key: &KeyType) -> bool {
        self.records.contains_key(key)
    }

    pub fn get(&self, key: &KeyType) -> Option<&Record> {
        self.records.get(key)
    }

    /// Inserts or overwrites, returns true if the key was not present
    pub fn insert(&mut self, key: KeyType, record: Record) -> bool {
        // LinkedHashMap::insert would move an existing key to the back
        if let Some(existing) = self.records.get_mut(&key) {
            *existing = record;
            return false;
        }
        self.records.insert(key, record);
        true
    }

    pub fn remove(&mut self, key: &KeyType) -> Option<Record> {
        self.records.remove(key)
    }

    /// Removes the earliest inserted entry
    pub fn pop_oldest(&mut self) -> Option<(KeyType, Record)> {
        self.records.pop_front()
    }

    /// Keeps only the records for which `keep` returns true,
    /// returns the number of removed entries
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Record) -> bool,
    {
        let rejected: Vec<KeyType> = self
            .records
            .iter()
            .filter(|(_key, record)| !keep(*record))
            .map(|(key, _record)| key.clone())
            .collect();
        for key in &rejected {
            self.records.remove(key);
        }
        rejected.len()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
