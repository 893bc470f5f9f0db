//! MemTable Tests
//!
//! Tests verify:
//! - Basic insert/get/remove
//! - Last write wins
//! - Regex scans use search semantics
//! - Sorted iteration

use regex::Regex;
use ringkv::memtable::MemTable;
use serde_json::json;

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::new();
    assert_eq!(memtable.len(), 0);
    assert!(memtable.is_empty());
}

#[test]
fn test_insert_and_get() {
    let mut memtable = MemTable::new();

    memtable.insert("a".into(), json!({"x": 1}));

    assert_eq!(memtable.get("a"), Some(&json!({"x": 1})));
    assert_eq!(memtable.get("b"), None);
}

#[test]
fn test_insert_overwrites() {
    let mut memtable = MemTable::new();

    assert_eq!(memtable.insert("a".into(), json!(1)), None);
    assert_eq!(memtable.insert("a".into(), json!(2)), Some(json!(1)));

    assert_eq!(memtable.get("a"), Some(&json!(2)));
    assert_eq!(memtable.len(), 1);
}

#[test]
fn test_remove_returns_value() {
    let mut memtable = MemTable::new();
    memtable.insert("a".into(), json!("v"));

    assert_eq!(memtable.remove("a"), Some(json!("v")));
    assert_eq!(memtable.remove("a"), None);
    assert!(memtable.is_empty());
}

#[test]
fn test_clear() {
    let mut memtable = MemTable::new();
    memtable.insert("a".into(), json!(1));
    memtable.insert("b".into(), json!(2));

    memtable.clear();

    assert!(memtable.is_empty());
}

// =============================================================================
// Scan Tests
// =============================================================================

fn people() -> MemTable {
    let mut memtable = MemTable::new();
    for (name, age) in [("Kristen", 20), ("Kelly", 25), ("Matt", 23), ("Leigh", 57), ("Bill", 58)] {
        memtable.insert(name.into(), json!({"age": age}));
    }
    memtable
}

#[test]
fn test_scan_anchored_pattern() {
    let memtable = people();

    let keys: Vec<String> = memtable
        .scan(&Regex::new("^K.*").unwrap())
        .into_iter()
        .map(|(k, _)| k)
        .collect();

    assert_eq!(keys, vec!["Kelly", "Kristen"]);
}

#[test]
fn test_scan_searches_anywhere_in_key() {
    let memtable = people();

    let keys: Vec<String> = memtable
        .scan(&Regex::new("i").unwrap())
        .into_iter()
        .map(|(k, _)| k)
        .collect();

    assert_eq!(keys, vec!["Bill", "Kristen", "Leigh"]);
}

#[test]
fn test_scan_returns_values() {
    let memtable = people();

    let matches = memtable.scan(&Regex::new("^Matt$").unwrap());

    assert_eq!(matches, vec![("Matt".to_string(), json!({"age": 23}))]);
}

#[test]
fn test_scan_no_matches() {
    let memtable = people();
    assert!(memtable.scan(&Regex::new("^Z").unwrap()).is_empty());
}

// =============================================================================
// Iteration Tests
// =============================================================================

#[test]
fn test_iter_is_sorted() {
    let memtable = people();

    let keys: Vec<&String> = memtable.iter().map(|(k, _)| k).collect();

    assert_eq!(keys, vec!["Bill", "Kelly", "Kristen", "Leigh", "Matt"]);
}
