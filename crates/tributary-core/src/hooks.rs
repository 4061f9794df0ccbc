#![forbid(unsafe_code)]

//! Extension points invoked around the producer's fixed core routines.
//!
//! A producer variant implements [`ProducerHooks`] instead of overriding the
//! attach, detach, produce, and finish operations themselves. The core always
//! performs the state update and the broadcast. Hooks only observe it from
//! before and after, so a variant cannot desynchronise observers from
//! producer state by forgetting a step.
//!
//! Hooks run on the calling thread while the producer's lock is held. They may
//! read producer state but should not block.
//!
//! | Routine   | Before         | After          |
//! |-----------|----------------|----------------|
//! | attach    | `will_add`     | `did_add`      |
//! | detach    | `will_remove`  | `did_remove`   |
//! | produce   | `will_produce` | `did_produce`  |
//! | finish    | `will_finish`  | `did_finish`   |
//!
//! `did_add` runs after the replay of the latest value, so the new connection
//! has already caught up when the hook sees it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::registry::ConnectionId;
use crate::status::Completion;

/// Observation hooks around producer lifecycle routines.
///
/// Every method defaults to a no-op.
pub trait ProducerHooks<T, E>: Send + Sync {
    /// Before a connection is registered. Runs even when the producer has
    /// already finished and the connection will be completed immediately.
    fn will_add(&self, connection: ConnectionId) {
        let _ = connection;
    }

    /// After a connection became active and received its replay.
    fn did_add(&self, connection: ConnectionId) {
        let _ = connection;
    }

    /// Before a registered connection is excised.
    fn will_remove(&self, connection: ConnectionId) {
        let _ = connection;
    }

    /// After a connection was excised and marked removed.
    fn did_remove(&self, connection: ConnectionId) {
        let _ = connection;
    }

    /// Before an accepted value is stored and broadcast.
    fn will_produce(&self, value: &T) {
        let _ = value;
    }

    /// After every connection received `value`.
    fn did_produce(&self, value: &T) {
        let _ = value;
    }

    /// Before the terminal transition.
    fn will_finish(&self, completion: &Completion<E>) {
        let _ = completion;
    }

    /// After every connection was completed and removed.
    fn did_finish(&self, completion: &Completion<E>) {
        let _ = completion;
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<T, E> ProducerHooks<T, E> for NoHooks {}

// ─── SubscriberCount ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Counts {
    live: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

/// Tracks how many consumers are attached.
///
/// Cloning creates a new handle to the **same** counters, so keep one clone and
/// hand the other to [`Producer::with_hooks`](crate::Producer::with_hooks).
#[derive(Debug, Clone, Default)]
pub struct SubscriberCount {
    counts: Arc<Counts>,
}

impl SubscriberCount {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connections currently attached.
    #[must_use]
    pub fn live(&self) -> usize {
        self.counts.live.load(Ordering::Acquire)
    }

    /// Highest number of simultaneously attached connections.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.counts.peak.load(Ordering::Acquire)
    }

    /// Connections ever activated.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.total.load(Ordering::Acquire)
    }
}

impl<T, E> ProducerHooks<T, E> for SubscriberCount {
    fn did_add(&self, _connection: ConnectionId) {
        let live = self.counts.live.fetch_add(1, Ordering::AcqRel) + 1;
        self.counts.peak.fetch_max(live, Ordering::AcqRel);
        self.counts.total.fetch_add(1, Ordering::AcqRel);
    }

    fn did_remove(&self, _connection: ConnectionId) {
        // Saturating: a removal is only reported for a connection that was added.
        let _ = self
            .counts
            .live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

// ─── SingleSubscriber ────────────────────────────────────────────────────────

/// Enforces at most one attached consumer at a time.
///
/// Attaching a second consumer while the first is still active is a programmer
/// error and panics in `will_add`, before any state changes.
#[derive(Debug, Default)]
pub struct SingleSubscriber {
    occupied: AtomicBool,
}

impl SingleSubscriber {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.occupied.load(Ordering::Acquire)
    }
}

impl<T, E> ProducerHooks<T, E> for SingleSubscriber {
    fn will_add(&self, connection: ConnectionId) {
        assert!(
            !self.occupied.load(Ordering::Acquire),
            "single-subscriber producer already has a consumer; refusing {connection}"
        );
    }

    fn did_add(&self, _connection: ConnectionId) {
        self.occupied.store(true, Ordering::Release);
    }

    fn did_remove(&self, _connection: ConnectionId) {
        self.occupied.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    fn ids(n: usize) -> Vec<ConnectionId> {
        let mut registry: Registry<(), ()> = Registry::new();
        (0..n).map(|_| registry.allocate_id()).collect()
    }

    #[test]
    fn subscriber_count_tracks_live_and_peak() {
        let count = SubscriberCount::new();
        let hooks: &dyn ProducerHooks<(), ()> = &count;
        let ids = ids(3);

        hooks.did_add(ids[0]);
        hooks.did_add(ids[1]);
        hooks.did_remove(ids[0]);
        hooks.did_add(ids[2]);

        assert_eq!(count.live(), 2);
        assert_eq!(count.peak(), 2);
        assert_eq!(count.total(), 3);
    }

    #[test]
    fn subscriber_count_never_underflows() {
        let count = SubscriberCount::new();
        let hooks: &dyn ProducerHooks<(), ()> = &count;
        hooks.did_remove(ids(1)[0]);
        assert_eq!(count.live(), 0);
    }

    #[test]
    fn single_subscriber_frees_on_remove() {
        let single = SingleSubscriber::new();
        let hooks: &dyn ProducerHooks<(), ()> = &single;
        let ids = ids(2);

        hooks.will_add(ids[0]);
        hooks.did_add(ids[0]);
        assert!(single.is_occupied());

        hooks.did_remove(ids[0]);
        assert!(!single.is_occupied());
        hooks.will_add(ids[1]);
    }

    #[test]
    #[should_panic(expected = "single-subscriber producer already has a consumer")]
    fn single_subscriber_rejects_second_consumer() {
        let single = SingleSubscriber::new();
        let hooks: &dyn ProducerHooks<(), ()> = &single;
        let ids = ids(2);

        hooks.will_add(ids[0]);
        hooks.did_add(ids[0]);
        hooks.will_add(ids[1]);
    }
}
