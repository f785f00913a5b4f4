//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check key classification and facade round trips over the
//! in-memory backend.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{Cache, ExistenceSet};

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Generates valid cache keys
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:]{1,32}".prop_map(|s| s)
}

fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,256}".prop_map(|s| s)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Every input position lands in exactly one side, order preserved.
    #[test]
    fn prop_partition_covers_input(
        entries in prop::collection::vec((valid_key_strategy(), any::<bool>()), 0..50)
    ) {
        let (keys, flags): (Vec<String>, Vec<bool>) = entries.iter().cloned().unzip();
        let set = ExistenceSet::partition(keys.clone(), flags.clone()).unwrap();

        prop_assert_eq!(set.len(), keys.len());

        let expected_present: Vec<String> = entries
            .iter()
            .filter(|(_, exists)| *exists)
            .map(|(key, _)| key.clone())
            .collect();
        let expected_missing: Vec<String> = entries
            .iter()
            .filter(|(_, exists)| !*exists)
            .map(|(key, _)| key.clone())
            .collect();
        prop_assert_eq!(set.present, expected_present);
        prop_assert_eq!(set.missing, expected_missing);
    }

    // existing_keys and missing_keys together cover the input exactly once.
    #[test]
    fn prop_existing_and_missing_disjoint(
        stored in prop::collection::hash_set(valid_key_strategy(), 0..20),
        probed in prop::collection::hash_set(valid_key_strategy(), 1..20),
    ) {
        let rt = runtime();
        let cache = Cache::in_memory();

        let (existing, missing) = rt.block_on(async {
            for key in &stored {
                cache.set(key, "v", TEST_TTL).await.unwrap();
            }
            let probed: Vec<&String> = probed.iter().collect();
            (
                cache.existing_keys(&probed).await.unwrap(),
                cache.missing_keys(&probed).await.unwrap(),
            )
        });

        prop_assert_eq!(existing.len() + missing.len(), probed.len());

        let existing: HashSet<String> = existing.into_iter().collect();
        let missing: HashSet<String> = missing.into_iter().collect();
        prop_assert!(existing.is_disjoint(&missing));

        for key in &probed {
            prop_assert_eq!(existing.contains(key), stored.contains(key));
            prop_assert_eq!(missing.contains(key), !stored.contains(key));
        }
    }

    // A stored text value reads back unchanged.
    #[test]
    fn prop_set_get_roundtrip(key in valid_key_strategy(), value in valid_value_strategy()) {
        let rt = runtime();
        let cache = Cache::in_memory();

        let retrieved = rt.block_on(async {
            cache.set(&key, &value, TEST_TTL).await.unwrap();
            cache.get(&key).await.unwrap()
        });

        prop_assert_eq!(retrieved, value);
    }

    // Deleted keys are gone, absent keys in the same call are ignored.
    #[test]
    fn prop_del_removes_entries(
        keys in prop::collection::hash_set(valid_key_strategy(), 1..20),
        absent in valid_key_strategy(),
    ) {
        prop_assume!(!keys.contains(&absent));

        let rt = runtime();
        let cache = Cache::in_memory();

        let remaining = rt.block_on(async {
            for key in &keys {
                cache.set(key, "v", Duration::ZERO).await.unwrap();
            }
            let mut targets: Vec<&String> = keys.iter().collect();
            targets.push(&absent);
            cache.del(&targets).await.unwrap();
            cache.existing_keys(&targets).await.unwrap()
        });

        prop_assert!(remaining.is_empty());
    }
}
