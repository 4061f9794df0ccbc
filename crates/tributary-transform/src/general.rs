//! Transformers that work on any value.

use crate::{Transformer, from_fn};

/// Number of items in a collection.
pub fn count<C: IntoIterator>() -> impl Transformer<C, usize> {
    from_fn(|items: C| items.into_iter().count())
}

/// Wrap a single value in a one-element vector.
pub fn wrap_in_vec<T>() -> impl Transformer<T, Vec<T>> {
    from_fn(|value: T| vec![value])
}

/// Fan one value out to several transformers and collect their outputs in
/// order.
pub fn branch<T: Clone, O>(branches: Vec<Box<dyn Transformer<T, O>>>) -> impl Transformer<T, Vec<O>> {
    from_fn(move |value: T| {
        branches
            .iter()
            .map(|b| b.transform(value.clone()))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_any_collection() {
        assert_eq!(count().transform(vec![1, 2, 3]), 3);
        assert_eq!(count().transform("héllo".chars()), 5);
        assert_eq!(count::<Vec<u8>>().transform(Vec::new()), 0);
    }

    #[test]
    fn wrap_makes_singleton() {
        assert_eq!(wrap_in_vec().transform(7), vec![7]);
    }

    #[test]
    fn branch_runs_each_in_order() {
        let stats = branch::<Vec<i32>, i32>(vec![
            Box::new(from_fn(|v: Vec<i32>| v.iter().copied().min().unwrap_or(0))),
            Box::new(from_fn(|v: Vec<i32>| v.iter().copied().max().unwrap_or(0))),
            Box::new(from_fn(|v: Vec<i32>| v.iter().sum())),
        ]);
        assert_eq!(stats.transform(vec![4, -1, 9]), vec![-1, 9, 12]);
        assert!(branch::<u8, u8>(Vec::new()).transform(1).is_empty());
    }
}
