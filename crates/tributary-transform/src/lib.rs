#![forbid(unsafe_code)]

//! Composable value transformers.
//!
//! A [`Transformer`] is a pure function "value → value". A [`Reversible`]
//! transformer also maps back, "value ⇄ value", so it can be used as a two-way
//! binding. Transformers chain with [`Transformer::then`].
//!
//! The catalog is split by the shape of the value it works on:
//!
//! - [`general`]: counting, wrapping, branching.
//! - [`array`]: subsetting, altering, and disposing of `Vec`s.
//! - [`dictionary`]: building, altering, and disposing of `BTreeMap`s.
//!
//! Nothing here knows about producers or connections. Transformers are fed
//! values that have already been delivered.
//!
//! # Example
//!
//! ```
//! use tributary_transform::{Transformer, array};
//!
//! let shout = array::filter(|s: &String| !s.is_empty())
//!     .then(array::map_each(tributary_transform::from_fn(|s: String| s.to_uppercase())))
//!     .then(array::join_with(", "));
//!
//! let words = vec!["a".to_string(), String::new(), "b".to_string()];
//! assert_eq!(shout.transform(words), "A, B");
//! ```

use std::fmt;
use std::marker::PhantomData;

pub mod array;
pub mod dictionary;
pub mod general;

/// A pure function from `I` to `O`.
pub trait Transformer<I, O> {
    fn transform(&self, input: I) -> O;

    /// Feed this transformer's output into `next`.
    fn then<P, X>(self, next: X) -> Chain<Self, X, O>
    where
        Self: Sized,
        X: Transformer<O, P>,
    {
        Chain {
            first: self,
            second: next,
            _mid: PhantomData,
        }
    }
}

/// A transformer that can also map its output back to an input.
pub trait Reversible<I, O>: Transformer<I, O> {
    fn reverse(&self, output: O) -> I;

    /// Swap directions: `transform` becomes `reverse` and vice versa.
    fn inverted(self) -> Inverted<Self>
    where
        Self: Sized,
    {
        Inverted(self)
    }
}

impl<I, O, X: Transformer<I, O> + ?Sized> Transformer<I, O> for Box<X> {
    fn transform(&self, input: I) -> O {
        (**self).transform(input)
    }
}

impl<I, O, X: Transformer<I, O> + ?Sized> Transformer<I, O> for &X {
    fn transform(&self, input: I) -> O {
        (**self).transform(input)
    }
}

// ─── Closures ────────────────────────────────────────────────────────────────

/// Transformer wrapping a closure.
#[derive(Clone, Copy)]
pub struct FnTransformer<F>(F);

/// Wrap a closure as a [`Transformer`].
pub fn from_fn<I, O, F: Fn(I) -> O>(f: F) -> FnTransformer<F> {
    FnTransformer(f)
}

impl<I, O, F: Fn(I) -> O> Transformer<I, O> for FnTransformer<F> {
    fn transform(&self, input: I) -> O {
        (self.0)(input)
    }
}

impl<F> fmt::Debug for FnTransformer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnTransformer")
    }
}

/// Two-way transformer built from a pair of closures.
#[derive(Clone, Copy)]
pub struct FnReversible<F, G> {
    forward: F,
    backward: G,
}

/// Wrap a pair of closures as a [`Reversible`] transformer.
///
/// The caller is responsible for `backward` undoing `forward`.
pub fn from_fns<I, O, F, G>(forward: F, backward: G) -> FnReversible<F, G>
where
    F: Fn(I) -> O,
    G: Fn(O) -> I,
{
    FnReversible { forward, backward }
}

impl<I, O, F, G> Transformer<I, O> for FnReversible<F, G>
where
    F: Fn(I) -> O,
    G: Fn(O) -> I,
{
    fn transform(&self, input: I) -> O {
        (self.forward)(input)
    }
}

impl<I, O, F, G> Reversible<I, O> for FnReversible<F, G>
where
    F: Fn(I) -> O,
    G: Fn(O) -> I,
{
    fn reverse(&self, output: O) -> I {
        (self.backward)(output)
    }
}

impl<F, G> fmt::Debug for FnReversible<F, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnReversible")
    }
}

// ─── Combinators ─────────────────────────────────────────────────────────────

/// Two transformers run back to back. Built by [`Transformer::then`].
pub struct Chain<A, B, M> {
    first: A,
    second: B,
    _mid: PhantomData<fn(M) -> M>,
}

impl<I, M, O, A, B> Transformer<I, O> for Chain<A, B, M>
where
    A: Transformer<I, M>,
    B: Transformer<M, O>,
{
    fn transform(&self, input: I) -> O {
        self.second.transform(self.first.transform(input))
    }
}

impl<I, M, O, A, B> Reversible<I, O> for Chain<A, B, M>
where
    A: Reversible<I, M>,
    B: Reversible<M, O>,
{
    fn reverse(&self, output: O) -> I {
        self.first.reverse(self.second.reverse(output))
    }
}

impl<A: Clone, B: Clone, M> Clone for Chain<A, B, M> {
    fn clone(&self) -> Self {
        Self {
            first: self.first.clone(),
            second: self.second.clone(),
            _mid: PhantomData,
        }
    }
}

impl<A: fmt::Debug, B: fmt::Debug, M> fmt::Debug for Chain<A, B, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("first", &self.first)
            .field("second", &self.second)
            .finish()
    }
}

/// A reversible transformer run backwards. Built by [`Reversible::inverted`].
#[derive(Debug, Clone, Copy)]
pub struct Inverted<X>(X);

impl<I, O, X: Reversible<O, I>> Transformer<I, O> for Inverted<X> {
    fn transform(&self, input: I) -> O {
        self.0.reverse(input)
    }
}

impl<I, O, X: Reversible<O, I>> Reversible<I, O> for Inverted<X> {
    fn reverse(&self, output: O) -> I {
        self.0.transform(output)
    }
}

/// Passes values through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T> Transformer<T, T> for Identity {
    fn transform(&self, input: T) -> T {
        input
    }
}

impl<T> Reversible<T, T> for Identity {
    fn reverse(&self, output: T) -> T {
        output
    }
}
