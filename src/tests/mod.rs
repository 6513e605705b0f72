use super::hash::{KeyEq, WordHasher};
use super::{BuildError, GenericHasher, NaturalEq, PerfectSet};
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use alloc::{format, vec};
use core::cell::Cell;

/// Hash word = the key itself. Handy for steering keys into chosen
/// buckets and slices.
#[derive(Clone, Copy, Debug, Default)]
struct IdentityHasher;

impl WordHasher<u64> for IdentityHasher {
    fn hash_word(&self, key: &u64) -> u64 {
        *key
    }
}

/// Maps every key to one word, so any two keys collide.
#[derive(Clone, Copy, Debug, Default)]
struct ConstantHasher;

impl WordHasher<u64> for ConstantHasher {
    fn hash_word(&self, _key: &u64) -> u64 {
        0x5185_85bc_9f3e_7d12
    }
}

/// Equality that counts how often it is consulted.
#[derive(Clone, Debug, Default)]
struct CountingEq {
    calls: Rc<Cell<usize>>,
}

impl KeyEq<u64> for CountingEq {
    fn eq(&self, a: &u64, b: &u64) -> bool {
        self.calls.set(self.calls.get() + 1);
        a == b
    }
}

type IdentitySet = PerfectSet<u64, IdentityHasher, NaturalEq>;

/// Pseudo-random keys: well-mixed words from a seeded [`GenericHasher`],
/// deduplicated so builds cannot trip on duplicates.
fn random_keys(seed: u64, count: usize) -> Vec<u64> {
    let mixer = GenericHasher::with_seed(seed);
    let mut keys: Vec<u64> = (0..count as u64).map(|i| mixer.hash_word(&i)).collect();
    keys.sort_unstable();
    keys.dedup();
    keys
}

#[test]
fn empty_input() {
    let set: IdentitySet = PerfectSet::from_keys(vec![]).unwrap();
    assert_eq!(set.len(), 0);
    assert!(set.is_empty());
    assert_eq!(set.find(&0), None);
    assert_eq!(set.find(&u64::MAX), None);
}

#[test]
fn single_key() {
    let set: IdentitySet = PerfectSet::from_keys(vec![42]).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.find(&42), Some(&42));
    assert_eq!(set.find(&0), None);
}

#[test]
fn two_keys() {
    let set: IdentitySet = PerfectSet::from_keys(vec![1, u64::MAX]).unwrap();
    assert_eq!(set.find(&1), Some(&1));
    assert_eq!(set.find(&u64::MAX), Some(&u64::MAX));
    assert_eq!(set.find(&2), None);
}

#[test]
fn eight_consecutive_keys() {
    let keys: Vec<u64> = (1..=8).collect();
    let set: IdentitySet = PerfectSet::from_keys(keys.clone()).unwrap();
    for key in &keys {
        assert_eq!(set.find(key), Some(key));
    }
    assert_eq!(set.find(&0), None);
    assert_eq!(set.find(&9), None);
}

#[test]
fn thousand_keys_mixing_hash() {
    let keys: Vec<u64> = (0..1000).collect();
    let set: PerfectSet<u64> = PerfectSet::from_keys(keys.clone()).unwrap();
    assert_eq!(set.len(), 1000);
    for key in &keys {
        assert_eq!(set.find(key), Some(key));
    }
    for absent in 1000..1100 {
        assert_eq!(set.find(&absent), None);
    }
}

#[test]
fn string_keys() {
    let keys: Vec<String> = ["alpha", "beta", "gamma", "delta"]
        .iter()
        .map(|&s| String::from(s))
        .collect();
    let set: PerfectSet<String> = PerfectSet::from_keys(keys).unwrap();
    assert_eq!(set.find("alpha").map(String::as_str), Some("alpha"));
    assert!(set.contains("delta"));
    assert_eq!(set.find("epsilon"), None);
    assert_eq!(set.find(""), None);
}

#[test]
fn hash_collision_detected() {
    let result: Result<PerfectSet<u64, ConstantHasher>, _> = PerfectSet::from_keys(vec![1, 2]);
    assert_eq!(result.unwrap_err(), BuildError::HashCollision);
}

#[test]
fn duplicate_keys_detected() {
    let result: Result<IdentitySet, _> = PerfectSet::from_keys(vec![5, 5]);
    assert_eq!(result.unwrap_err(), BuildError::DuplicateKey);

    // The diagnosis does not depend on the hasher, only on key equality.
    let result: Result<PerfectSet<u64>, _> = PerfectSet::from_keys(vec![7, 7]);
    assert_eq!(result.unwrap_err(), BuildError::DuplicateKey);
}

#[test]
fn lambda_zero_fails() {
    let result: Result<PerfectSet<u64>, _> = PerfectSet::from_keys_with_lambda(vec![1, 2, 3], 0);
    assert_eq!(result.unwrap_err(), BuildError::ConstructionFailure);
}

#[test]
fn membership_round_trip() {
    for (seed, count) in [(0x243f_6a88, 100), (0x85a3_08d3, 1_000), (0x1319_8a2e, 10_000)] {
        let keys = random_keys(seed, count);
        let set: PerfectSet<u64> = PerfectSet::from_keys(keys.clone()).unwrap();
        assert_eq!(set.len(), keys.len());

        for key in &keys {
            assert_eq!(set.find(key), Some(key));
        }

        let probe = GenericHasher::with_seed(!seed);
        for i in 0..count as u64 {
            let query = probe.hash_word(&i);
            assert_eq!(
                set.find(&query).is_some(),
                keys.binary_search(&query).is_ok()
            );
        }
    }
}

#[test]
fn positional_uniqueness() {
    let keys = random_keys(0x0370_7344, 500);
    let set: PerfectSet<u64> = PerfectSet::from_keys(keys.clone()).unwrap();
    let mut slots: Vec<*const u64> = keys.iter().map(|key| {
        let stored: &u64 = set.find(key).unwrap();
        stored as *const u64
    }).collect();
    slots.sort_unstable();
    slots.dedup();
    assert_eq!(slots.len(), keys.len());
}

#[test]
fn deterministic_build() {
    let keys = random_keys(0xa409_3822, 2_000);
    let first: PerfectSet<u64> = PerfectSet::from_keys(keys.clone()).unwrap();
    let second: PerfectSet<u64> = PerfectSet::from_keys(keys).unwrap();
    let first_order: Vec<u64> = first.iter().copied().collect();
    let second_order: Vec<u64> = second.iter().copied().collect();
    assert_eq!(first_order, second_order);
}

#[test]
fn single_probe_lookup() {
    let eq = CountingEq::default();
    let calls = Rc::clone(&eq.calls);
    let keys: Vec<u64> = (1..=8).collect();
    let set = PerfectSet::from_keys_with_hasher(keys, IdentityHasher, eq, 4).unwrap();

    // Present, absent-but-in-range and absent-in-an-empty-bucket queries
    // all consult the equality predicate at most once.
    for query in [5, 9, 1 << 40, u64::MAX] {
        calls.set(0);
        let _ = set.find(&query);
        assert!(calls.get() <= 1, "lookup of {query} probed {} slots", calls.get());
    }
}

#[test]
fn retry_monotonicity() {
    let keys = random_keys(0x0a31_9810, 200);
    for lambda in [4, 2, 1] {
        let set: Result<PerfectSet<u64>, _> =
            PerfectSet::from_keys_with_lambda(keys.clone(), lambda);
        assert!(set.is_ok(), "build failed at lambda = {lambda}");
    }
}

#[test]
fn iteration_covers_every_key_once() {
    let keys = random_keys(0x2299_f31d, 300);
    let set: PerfectSet<u64> = PerfectSet::from_keys(keys.clone()).unwrap();
    let mut stored: Vec<u64> = set.iter().copied().collect();
    stored.sort_unstable();
    assert_eq!(stored, keys);

    let borrowed: Vec<&u64> = (&set).into_iter().collect();
    assert_eq!(borrowed.len(), keys.len());
}

#[test]
fn custom_seed_changes_the_layout_but_not_the_answers() {
    let keys = random_keys(0x0082_efa9, 400);
    let set = PerfectSet::from_keys_with_hasher(
        keys.clone(),
        GenericHasher::with_seed(0x9e37_79b9_7f4a_7c15),
        NaturalEq,
        4,
    )
    .unwrap();
    for key in &keys {
        assert_eq!(set.find(key), Some(key));
    }
}

#[test]
fn clones_answer_like_the_original() {
    let keys = random_keys(0x6a26_7e96, 150);
    let set: PerfectSet<u64> = PerfectSet::from_keys(keys.clone()).unwrap();
    let copy = set.clone();

    for key in &keys {
        assert_eq!(copy.find(key), set.find(key));
        assert_eq!(copy.find(key), Some(key));
    }
    let probe = GenericHasher::with_seed(0x6a26_7e96 ^ u64::MAX);
    for i in 0..150u64 {
        let query = probe.hash_word(&i);
        assert_eq!(copy.find(&query), set.find(&query));
    }

    let order: Vec<u64> = set.iter().copied().collect();
    let copied_order: Vec<u64> = copy.iter().copied().collect();
    assert_eq!(order, copied_order);
}

#[test]
fn debug_formats_as_a_set() {
    let set: IdentitySet = PerfectSet::from_keys(vec![1]).unwrap();
    assert_eq!(format!("{set:?}"), "{1}");
}

#[test]
#[ignore = "slow in debug builds"]
fn build_200k_integers() {
    let keys = random_keys(0x4528_21e6, 200_000);
    let set: PerfectSet<u64> = PerfectSet::from_keys(keys.clone()).unwrap();
    for key in keys.iter().step_by(97) {
        assert_eq!(set.find(key), Some(key));
    }
    assert_eq!(set.find(&0), None);
}

#[cfg(feature = "serde")]
mod serde_support {
    use super::*;

    #[test]
    fn round_trip() {
        let keys = random_keys(0x38d0_1377, 64);
        let set: PerfectSet<u64> = PerfectSet::from_keys(keys.clone()).unwrap();

        let encoded = serde_json::to_string(&set).unwrap();
        let decoded: PerfectSet<u64> = serde_json::from_str(&encoded).unwrap();

        for key in &keys {
            assert_eq!(decoded.find(key), Some(key));
        }
        let order: Vec<u64> = set.iter().copied().collect();
        let decoded_order: Vec<u64> = decoded.iter().copied().collect();
        assert_eq!(order, decoded_order);
    }

    #[test]
    fn rejects_swapped_elements() {
        let keys = random_keys(0xbe54_66cf, 64);
        let set: PerfectSet<u64> = PerfectSet::from_keys(keys).unwrap();

        let mut value = serde_json::to_value(&set).unwrap();
        let elements = value["elements"].as_array_mut().unwrap();
        elements.swap(0, 1);

        let decoded: Result<PerfectSet<u64>, _> = serde_json::from_value(value);
        assert!(decoded.is_err());
    }

    #[test]
    fn rejects_overflowing_jump_base() {
        // An empty element array skips the per-element placement check, so
        // the jump records must be rejected on their own merits.
        let set: PerfectSet<u64> = PerfectSet::from_keys(vec![]).unwrap();

        let mut value = serde_json::to_value(&set).unwrap();
        value["jumps"][0] = serde_json::json!({
            "base": u64::MAX,
            "shift": 1,
            "width": 1,
        });

        let decoded: Result<PerfectSet<u64>, _> = serde_json::from_value(value);
        assert!(decoded.is_err());
    }

    #[test]
    fn rejects_wrong_jump_count() {
        let set: PerfectSet<u64> = PerfectSet::from_keys(vec![1, 2, 3]).unwrap();

        let mut value = serde_json::to_value(&set).unwrap();
        value["jumps"].as_array_mut().unwrap().pop();

        let decoded: Result<PerfectSet<u64>, _> = serde_json::from_value(value);
        assert!(decoded.is_err());
    }
}
