//! MemTable implementation
//!
//! BTreeMap of string keys to JSON values.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value;

/// In-memory key-value map
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemTable {
    data: BTreeMap<String, Value>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Insert or overwrite a key, returning the previous value
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.data.insert(key, value)
    }

    /// Remove a key, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Pairs whose key contains a match for `pattern`, in key order
    pub fn scan(&self, pattern: &Regex) -> Vec<(String, Value)> {
        self.data
            .iter()
            .filter(|(key, _)| pattern.is_match(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}
