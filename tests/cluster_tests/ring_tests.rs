//! Ring Tests
//!
//! Shard placement and replica sets.

use std::collections::HashSet;

use ringkv::cluster::{Ring, UNHASHABLE_SHARD};
use serde_json::json;

#[test]
fn test_known_primaries() {
    let ring = Ring::new(5, 1);

    // First 8 bytes of SHA-256, big-endian, mod 5
    assert_eq!(ring.shard_for_str("a"), 0);
    assert_eq!(ring.shard_for_str("b"), 1);
    assert_eq!(ring.shard_for_str("hello"), 2);
    assert_eq!(ring.shard_for_str(""), 2);
}

#[test]
fn test_primary_depends_on_server_count() {
    assert_eq!(Ring::new(3, 1).shard_for_str("key0"), 0);
    assert_eq!(Ring::new(7, 1).shard_for_str("key0"), 6);
    assert_eq!(Ring::new(7, 1).shard_for_str("user:1"), 4);
}

#[test]
fn test_replicas_wrap_around() {
    let ring = Ring::new(5, 3);

    assert_eq!(ring.replicas_from(4), vec![4, 0, 1]);
    assert_eq!(ring.replicas_from(0), vec![0, 1, 2]);
}

#[test]
fn test_replicas_of_key_start_at_primary() {
    let ring = Ring::new(7, 3);

    // "a" hashes to 4 on seven servers
    assert_eq!(ring.replicas(&json!("a")), vec![4, 5, 6]);
    assert_eq!(ring.replicas(&json!("b")), vec![0, 1, 2]);
}

#[test]
fn test_replica_count_capped_at_servers() {
    let ring = Ring::new(3, 5);

    let replicas = ring.replicas(&json!("hello"));
    let distinct: HashSet<_> = replicas.iter().collect();

    assert_eq!(replicas.len(), 3);
    assert_eq!(distinct.len(), 3);
}

#[test]
fn test_replicas_distinct_and_in_range() {
    let ring = Ring::new(6, 4);

    for i in 0..200 {
        let replicas = ring.replicas(&json!(format!("key{i}")));
        let distinct: HashSet<_> = replicas.iter().collect();

        assert_eq!(replicas.len(), 4);
        assert_eq!(distinct.len(), 4);
        assert!(replicas.iter().all(|&s| s < 6));
        assert_eq!(replicas[0], ring.shard_for(&json!(format!("key{i}"))));
    }
}

#[test]
fn test_same_primary_same_replica_set() {
    let ring = Ring::new(4, 2);

    for i in 0..50 {
        for j in 0..50 {
            let a = json!(format!("k{i}"));
            let b = json!(format!("k{j}"));
            if ring.shard_for(&a) == ring.shard_for(&b) {
                assert_eq!(ring.replicas(&a), ring.replicas(&b));
            }
        }
    }
}

#[test]
fn test_non_string_keys_use_fixed_shard() {
    let ring = Ring::new(5, 2);

    assert_eq!(ring.shard_for(&json!(42)), UNHASHABLE_SHARD);
    assert_eq!(ring.shard_for(&json!(null)), UNHASHABLE_SHARD);
    assert_eq!(ring.replicas(&json!([1])), vec![0, 1]);
}

#[test]
fn test_zero_sizes_are_clamped() {
    let ring = Ring::new(0, 0);

    assert_eq!(ring.servers(), 1);
    assert_eq!(ring.replication_factor(), 1);
    assert_eq!(ring.replicas(&json!("anything")), vec![0]);
}

#[test]
fn test_keys_spread_over_all_servers() {
    let ring = Ring::new(4, 1);

    let used: HashSet<_> = (0..200).map(|i| ring.shard_for_str(&format!("key{i}"))).collect();

    assert_eq!(used.len(), 4);
}
