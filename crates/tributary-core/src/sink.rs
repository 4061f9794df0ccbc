#![forbid(unsafe_code)]

//! Consumer sinks.
//!
//! A [`Sink`] receives every value delivered to its connection and, at most
//! once, the terminal [`Completion`]. Sinks are invoked synchronously on the
//! producing thread, so they should return quickly: a slow sink stalls the
//! rest of the broadcast round.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::status::Completion;

/// Consumer side of a connection.
pub trait Sink<T, E>: Send + Sync {
    /// Called once per delivered value.
    fn on_value(&self, value: &T);

    /// Called at most once, when the producer finishes.
    fn on_completion(&self, completion: &Completion<E>) {
        let _ = completion;
    }
}

/// A sink built from closures.
pub struct FnSink<V, C> {
    on_value: V,
    on_completion: C,
}

impl<T, E, V, C> Sink<T, E> for FnSink<V, C>
where
    V: Fn(&T) + Send + Sync,
    C: Fn(&Completion<E>) + Send + Sync,
{
    fn on_value(&self, value: &T) {
        (self.on_value)(value);
    }

    fn on_completion(&self, completion: &Completion<E>) {
        (self.on_completion)(completion);
    }
}

impl<V, C> fmt::Debug for FnSink<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSink").finish_non_exhaustive()
    }
}

/// A sink built from a value closure. Completion is ignored.
pub struct ValueSink<V> {
    on_value: V,
}

impl<T, E, V> Sink<T, E> for ValueSink<V>
where
    V: Fn(&T) + Send + Sync,
{
    fn on_value(&self, value: &T) {
        (self.on_value)(value);
    }
}

impl<V> fmt::Debug for ValueSink<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueSink").finish_non_exhaustive()
    }
}

/// Sink that only handles values and ignores completion.
pub fn from_fn<T, V>(on_value: V) -> ValueSink<V>
where
    V: Fn(&T) + Send + Sync,
{
    ValueSink { on_value }
}

/// Sink with separate value and completion handlers.
pub fn from_fns<T, E, V, C>(on_value: V, on_completion: C) -> FnSink<V, C>
where
    V: Fn(&T) + Send + Sync,
    C: Fn(&Completion<E>) + Send + Sync,
{
    FnSink {
        on_value,
        on_completion,
    }
}

impl<T, E, S: Sink<T, E> + ?Sized> Sink<T, E> for Arc<S> {
    fn on_value(&self, value: &T) {
        (**self).on_value(value);
    }

    fn on_completion(&self, completion: &Completion<E>) {
        (**self).on_completion(completion);
    }
}

// ─── Recorder ────────────────────────────────────────────────────────────────

/// One observation made by a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent<T, E> {
    Value(T),
    Completed(Completion<E>),
}

/// A sink that records everything it observes.
///
/// Cloning a `Recorder` creates a new handle to the **same** log, so one clone
/// can be handed to a producer while another is inspected.
pub struct Recorder<T, E> {
    events: Arc<Mutex<Vec<SinkEvent<T, E>>>>,
}

impl<T, E> Recorder<T, E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of recorded events (values and completions).
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Discard everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl<T: Clone, E: Clone> Recorder<T, E> {
    /// Snapshot of all recorded events, in arrival order.
    #[must_use]
    pub fn events(&self) -> Vec<SinkEvent<T, E>> {
        self.events.lock().clone()
    }

    /// Only the recorded values, in arrival order.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Value(value) => Some(value.clone()),
                SinkEvent::Completed(_) => None,
            })
            .collect()
    }

    /// Only the recorded completions. A well-behaved producer sends at most one.
    #[must_use]
    pub fn completions(&self) -> Vec<Completion<E>> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Value(_) => None,
                SinkEvent::Completed(completion) => Some(completion.clone()),
            })
            .collect()
    }
}

impl<T, E> Clone for Recorder<T, E> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
        }
    }
}

impl<T, E> Default for Recorder<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Recorder<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("events", &*self.events.lock())
            .finish()
    }
}

impl<T, E> Sink<T, E> for Recorder<T, E>
where
    T: Clone + Send,
    E: Clone + Send,
{
    fn on_value(&self, value: &T) {
        self.events.lock().push(SinkEvent::Value(value.clone()));
    }

    fn on_completion(&self, completion: &Completion<E>) {
        self.events
            .lock()
            .push(SinkEvent::Completed(completion.clone()));
    }
}
