//! Transformers over `Vec<T>`.
//!
//! Index arguments are `isize`: non-negative values count from the front,
//! negative values count from the back (`-1` is the last element). Range-like
//! operations clamp to the vector's bounds instead of panicking.

use std::borrow::Borrow;

use rand::seq::SliceRandom;

use crate::{Reversible, Transformer, from_fn, from_fns};

/// Resolve `index` against `len`, or `None` if it falls outside.
fn resolve(index: isize, len: usize) -> Option<usize> {
    if index >= 0 {
        let i = index.unsigned_abs();
        (i < len).then_some(i)
    } else {
        len.checked_sub(index.unsigned_abs())
    }
}

/// Resolve `index` against `len`, clamping into `0..=len`.
fn clamp(index: isize, len: usize) -> usize {
    if index >= 0 {
        index.unsigned_abs().min(len)
    } else {
        len.saturating_sub(index.unsigned_abs())
    }
}

// ── Subarrays ───────────────────────────────────────────────────────────

/// Elements at `indexes`, in the order given. Out-of-range indexes are skipped.
pub fn at_indexes<T: Clone>(indexes: Vec<isize>) -> impl Transformer<Vec<T>, Vec<T>> {
    from_fn(move |v: Vec<T>| {
        indexes
            .iter()
            .filter_map(|&i| resolve(i, v.len()).map(|i| v[i].clone()))
            .collect()
    })
}

/// Elements before `index`.
pub fn prefix_to<T>(index: isize) -> impl Transformer<Vec<T>, Vec<T>> {
    from_fn(move |mut v: Vec<T>| {
        let end = clamp(index, v.len());
        v.truncate(end);
        v
    })
}

/// Elements from `index` on.
pub fn suffix_from<T>(index: isize) -> impl Transformer<Vec<T>, Vec<T>> {
    from_fn(move |mut v: Vec<T>| {
        let start = clamp(index, v.len());
        v.split_off(start)
    })
}

/// Up to `len` elements starting at `start`.
pub fn sub_range<T>(start: isize, len: usize) -> impl Transformer<Vec<T>, Vec<T>> {
    from_fn(move |mut v: Vec<T>| {
        let from = clamp(start, v.len());
        let to = from.saturating_add(len).min(v.len());
        v.drain(from..to).collect()
    })
}

// ── Altering ────────────────────────────────────────────────────────────

/// Apply `transformer` to every element.
pub fn map_each<A, B, X>(transformer: X) -> impl Transformer<Vec<A>, Vec<B>>
where
    X: Transformer<A, B>,
{
    from_fn(move |v: Vec<A>| v.into_iter().map(|a| transformer.transform(a)).collect())
}

/// Keep elements matching `predicate`.
pub fn filter<T, F>(predicate: F) -> impl Transformer<Vec<T>, Vec<T>>
where
    F: Fn(&T) -> bool,
{
    from_fn(move |mut v: Vec<T>| {
        v.retain(|x| predicate(x));
        v
    })
}

/// Stable sort by the key `key` extracts.
pub fn sort_by_key<T, K, F>(key: F) -> impl Transformer<Vec<T>, Vec<T>>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    from_fn(move |mut v: Vec<T>| {
        v.sort_by_key(|x| key(x));
        v
    })
}

/// Stable sort in natural order.
pub fn sorted<T: Ord>() -> impl Transformer<Vec<T>, Vec<T>> {
    from_fn(|mut v: Vec<T>| {
        v.sort();
        v
    })
}

/// Concatenate nested vectors one level deep.
pub fn flatten<T>() -> impl Transformer<Vec<Vec<T>>, Vec<T>> {
    from_fn(|v: Vec<Vec<T>>| v.into_iter().flatten().collect())
}

/// An arbitrarily deep tree of vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nested<T> {
    Leaf(T),
    List(Vec<Nested<T>>),
}

impl<T> Nested<T> {
    fn collect_leaves(self, out: &mut Vec<T>) {
        match self {
            Self::Leaf(value) => out.push(value),
            Self::List(items) => {
                for item in items {
                    item.collect_leaves(out);
                }
            }
        }
    }
}

/// Collect every leaf of a nested tree, depth first, in order.
pub fn flatten_recursively<T>() -> impl Transformer<Vec<Nested<T>>, Vec<T>> {
    from_fn(|v: Vec<Nested<T>>| {
        let mut out = Vec::new();
        for item in v {
            item.collect_leaves(&mut out);
        }
        out
    })
}

/// Shuffle into a uniformly random order.
pub fn shuffled<T>() -> impl Transformer<Vec<T>, Vec<T>> {
    from_fn(|mut v: Vec<T>| {
        v.shuffle(&mut rand::rng());
        v
    })
}

/// Drop `None`s and unwrap the rest.
pub fn remove_nones<T>() -> impl Transformer<Vec<Option<T>>, Vec<T>> {
    from_fn(|v: Vec<Option<T>>| v.into_iter().flatten().collect())
}

/// Edit the vector in place with `f`.
pub fn mutate<T, F>(f: F) -> impl Transformer<Vec<T>, Vec<T>>
where
    F: Fn(&mut Vec<T>),
{
    from_fn(move |mut v: Vec<T>| {
        f(&mut v);
        v
    })
}

// ── Disposing ───────────────────────────────────────────────────────────

/// The element at `index`, if present.
pub fn at_index<T>(index: isize) -> impl Transformer<Vec<T>, Option<T>> {
    from_fn(move |v: Vec<T>| {
        let i = resolve(index, v.len())?;
        v.into_iter().nth(i)
    })
}

/// Join strings with `separator`.
///
/// Reversing splits on `separator`. An empty string reverses to an empty
/// vector, so `[""]` does not survive a round trip.
pub fn join_with<S>(separator: impl Into<String>) -> impl Reversible<Vec<S>, String>
where
    S: Borrow<str> + From<String>,
{
    let separator: String = separator.into();
    let split_on = separator.clone();
    from_fns(
        move |parts: Vec<S>| parts.join(separator.as_str()),
        move |joined: String| {
            if joined.is_empty() {
                return Vec::new();
            }
            joined
                .split(split_on.as_str())
                .map(|part| S::from(part.to_owned()))
                .collect()
        },
    )
}

/// Join strings with `separator`, using `last` before the final element
/// (`"a, b and c"`).
pub fn join_with_last(
    separator: impl Into<String>,
    last: impl Into<String>,
) -> impl Transformer<Vec<String>, String> {
    let separator: String = separator.into();
    let last: String = last.into();
    from_fn(move |mut parts: Vec<String>| match parts.len() {
        0 => String::new(),
        1 => parts.remove(0),
        _ => {
            let tail = parts.pop().unwrap_or_default();
            let mut head = parts.join(separator.as_str());
            head.push_str(&last);
            head.push_str(&tail);
            head
        }
    })
}
