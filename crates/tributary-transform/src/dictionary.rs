//! Transformers that build, alter, or take apart `BTreeMap`s.
//!
//! Maps are ordered by key, so every output here is deterministic.

use std::collections::BTreeMap;
use std::fmt::Display;

use crate::{Reversible, Transformer, from_fn, from_fns};

// ── Creating ────────────────────────────────────────────────────────────

/// Key each element by `key`. Later elements win on duplicate keys.
pub fn keyed_by<K, V, F>(key: F) -> impl Transformer<Vec<V>, BTreeMap<K, V>>
where
    K: Ord,
    F: Fn(&V) -> K,
{
    from_fn(move |values: Vec<V>| values.into_iter().map(|v| (key(&v), v)).collect())
}

/// Zip a vector with a fixed list of `keys`, position by position.
///
/// Extra values or extra keys are dropped. Reversing reads the keys back in
/// order and skips any the map does not contain.
pub fn keyed_with<K, V>(keys: Vec<K>) -> impl Reversible<Vec<V>, BTreeMap<K, V>>
where
    K: Ord + Clone,
{
    let read_keys = keys.clone();
    from_fns(
        move |values: Vec<V>| keys.iter().cloned().zip(values).collect(),
        move |mut map: BTreeMap<K, V>| {
            read_keys.iter().filter_map(|k| map.remove(k)).collect()
        },
    )
}

// ── Altering ────────────────────────────────────────────────────────────

/// Keep entries matching `predicate`.
pub fn filter_entries<K, V, F>(predicate: F) -> impl Transformer<BTreeMap<K, V>, BTreeMap<K, V>>
where
    K: Ord,
    F: Fn(&K, &V) -> bool,
{
    from_fn(move |mut map: BTreeMap<K, V>| {
        map.retain(|k, v| predicate(k, v));
        map
    })
}

/// Apply `transformer` to every value, keeping keys.
pub fn map_values<K, A, B, X>(transformer: X) -> impl Transformer<BTreeMap<K, A>, BTreeMap<K, B>>
where
    K: Ord,
    X: Transformer<A, B>,
{
    from_fn(move |map: BTreeMap<K, A>| {
        map.into_iter()
            .map(|(k, v)| (k, transformer.transform(v)))
            .collect()
    })
}

/// Edit the map in place with `f`.
pub fn mutate_entries<K, V, F>(f: F) -> impl Transformer<BTreeMap<K, V>, BTreeMap<K, V>>
where
    F: Fn(&mut BTreeMap<K, V>),
{
    from_fn(move |mut map: BTreeMap<K, V>| {
        f(&mut map);
        map
    })
}

// ── Disposing ───────────────────────────────────────────────────────────

/// Render each entry as `"{key}{separator}{value}"`, in key order.
pub fn join_pairs<K, V>(separator: impl Into<String>) -> impl Transformer<BTreeMap<K, V>, Vec<String>>
where
    K: Display,
    V: Display,
{
    let separator: String = separator.into();
    from_fn(move |map: BTreeMap<K, V>| {
        map.iter()
            .map(|(k, v)| format!("{k}{separator}{v}"))
            .collect()
    })
}

/// The value stored under `key`, if any.
pub fn value_for_key<K, V>(key: K) -> impl Transformer<BTreeMap<K, V>, Option<V>>
where
    K: Ord,
{
    from_fn(move |mut map: BTreeMap<K, V>| map.remove(&key))
}

/// Every key whose value equals `value`, in key order.
pub fn keys_for_value<K, V>(value: V) -> impl Transformer<BTreeMap<K, V>, Vec<K>>
where
    V: PartialEq,
{
    from_fn(move |map: BTreeMap<K, V>| {
        map.into_iter()
            .filter_map(|(k, v)| (v == value).then_some(k))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores() -> BTreeMap<&'static str, u32> {
        BTreeMap::from([("ann", 3), ("bob", 5), ("cy", 3)])
    }

    #[test]
    fn keyed_by_last_duplicate_wins() {
        let by_len = keyed_by(|s: &&str| s.len());
        let map = by_len.transform(vec!["a", "bb", "c"]);
        assert_eq!(map, BTreeMap::from([(1, "c"), (2, "bb")]));
    }

    #[test]
    fn keyed_with_round_trips_and_truncates() {
        let fields = keyed_with(vec!["x", "y", "z"]);
        let map = fields.transform(vec![1, 2]);
        assert_eq!(map, BTreeMap::from([("x", 1), ("y", 2)]));
        assert_eq!(fields.reverse(map), vec![1, 2]);

        let sparse = BTreeMap::from([("z", 9), ("x", 7), ("w", 0)]);
        assert_eq!(fields.reverse(sparse), vec![7, 9]);
    }

    #[test]
    fn filter_and_map_values() {
        let passing = filter_entries(|_: &&str, v: &u32| *v > 3)
            .then(map_values(from_fn(|v: u32| v * 10)));
        assert_eq!(passing.transform(scores()), BTreeMap::from([("bob", 50)]));
    }

    #[test]
    fn mutate_entries_edits_in_place() {
        let drop_bob = mutate_entries(|m: &mut BTreeMap<&'static str, u32>| {
            m.remove("bob");
        });
        assert_eq!(drop_bob.transform(scores()).len(), 2);
    }

    #[test]
    fn join_pairs_in_key_order() {
        let pairs = join_pairs("=");
        assert_eq!(pairs.transform(scores()), vec!["ann=3", "bob=5", "cy=3"]);
    }

    #[test]
    fn lookups() {
        assert_eq!(value_for_key("bob").transform(scores()), Some(5));
        assert_eq!(value_for_key("dee").transform(scores()), None);
        assert_eq!(keys_for_value(3).transform(scores()), vec!["ann", "cy"]);
        assert_eq!(keys_for_value(4).transform(scores()), Vec::<&str>::new());
    }
}
