#![forbid(unsafe_code)]

//! Property-based tests for the transformer catalog.
//!
//! 1. `join_with` reversed splits back to the original parts whenever no part
//!    contains the separator and the input is not `[""]`.
//! 2. `keyed_with` reversed returns the values that fit the key list.
//! 3. Subsetting never panics and never invents elements.
//! 4. Negative and positive indexes agree: `at_index(i - len) == at_index(i)`.
//! 5. `branch` output length equals the number of branches.

use proptest::prelude::*;
use tributary_transform::{Reversible, Transformer, array, dictionary, from_fn, general};

// ── Strategies ──────────────────────────────────────────────────────────

fn part() -> impl Strategy<Value = String> {
    "[a-z0-9]{0,6}"
}

fn parts() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(part(), 0..8)
        .prop_filter("[\"\"] joins to the empty string", |p| p != &vec![String::new()])
}

fn ints() -> impl Strategy<Value = Vec<i32>> {
    proptest::collection::vec(any::<i32>(), 0..32)
}

// ═════════════════════════════════════════════════════════════════════════
// 1–2. Reversible transformers undo themselves
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn join_then_split_is_identity(parts in parts()) {
        let join = array::join_with::<String>("|");
        let joined = join.transform(parts.clone());
        prop_assert_eq!(join.reverse(joined), parts);
    }

    #[test]
    fn keyed_with_reverse_keeps_fitting_values(values in ints(), nkeys in 0usize..10) {
        let keys: Vec<usize> = (0..nkeys).collect();
        let fields = dictionary::keyed_with(keys);
        let map = fields.transform(values.clone());
        prop_assert_eq!(map.len(), values.len().min(nkeys));
        prop_assert_eq!(fields.reverse(map), values.into_iter().take(nkeys).collect::<Vec<_>>());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3–4. Subsetting
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn subsetting_only_returns_existing_elements(
        v in ints(),
        a in -40isize..40,
        len in 0usize..40,
    ) {
        for out in [
            array::prefix_to(a).transform(v.clone()),
            array::suffix_from(a).transform(v.clone()),
            array::sub_range(a, len).transform(v.clone()),
            array::at_indexes(vec![a, -a]).transform(v.clone()),
        ] {
            prop_assert!(out.len() <= v.len().max(2));
            prop_assert!(out.iter().all(|x| v.contains(x)));
        }
        let prefix = array::prefix_to(a).transform(v.clone());
        let suffix = array::suffix_from(a).transform(v.clone());
        prop_assert_eq!([prefix, suffix].concat(), v);
    }

    #[test]
    fn negative_index_mirrors_positive(v in ints(), i in 0usize..32) {
        let i = (i % v.len().max(1)) as isize;
        let len = v.len() as isize;
        prop_assert_eq!(
            array::at_index(i - len).transform(v.clone()),
            array::at_index(i).transform(v)
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Branching
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn branch_yields_one_output_per_branch(v in ints(), n in 0usize..6) {
        let branches: Vec<Box<dyn Transformer<Vec<i32>, usize>>> = (0..n)
            .map(|k| -> Box<dyn Transformer<Vec<i32>, usize>> {
                Box::new(from_fn(move |v: Vec<i32>| v.len() + k))
            })
            .collect();
        let out = general::branch(branches).transform(v.clone());
        prop_assert_eq!(out, (0..n).map(|k| v.len() + k).collect::<Vec<_>>());
    }
}
