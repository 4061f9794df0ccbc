#![forbid(unsafe_code)]

//! Producer-owned connection registry.
//!
//! Connections are referenced by stable [`ConnectionId`]s inside a registry
//! owned by the producer and guarded by the producer's lock. Each entry is a
//! [`Slot`]: the shared cell holding a connection's status and sink. The
//! consumer-facing [`Connection`](crate::Connection) handle keeps its own
//! reference to the slot so it can read its status without the producer.
//!
//! # Invariants
//!
//! 1. Entries are kept in insertion (attachment) order.
//! 2. An id appears at most once.
//! 3. Ids are never reused within one producer.
//! 4. A slot's status moves `Pending -> Active -> Removed` (or straight
//!    `Pending -> Removed`) and never back.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use smallvec::SmallVec;

use crate::connection::ConnectionStatus;
use crate::sink::Sink;
use crate::status::Completion;

/// Stable identifier of a connection within its producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

const PENDING: u8 = 0;
const ACTIVE: u8 = 1;
const REMOVED: u8 = 2;

fn decode(raw: u8) -> ConnectionStatus {
    match raw {
        PENDING => ConnectionStatus::Pending,
        ACTIVE => ConnectionStatus::Active,
        _ => ConnectionStatus::Removed,
    }
}

// ─── Slot ────────────────────────────────────────────────────────────────────

/// Shared cell behind one connection.
pub(crate) struct Slot<T, E> {
    id: ConnectionId,
    status: AtomicU8,
    /// Set once the completion signal has been handed to the sink.
    completed: AtomicBool,
    sink: Box<dyn Sink<T, E>>,
}

impl<T, E> Slot<T, E> {
    pub(crate) fn new(id: ConnectionId, sink: Box<dyn Sink<T, E>>) -> Self {
        Self {
            id,
            status: AtomicU8::new(PENDING),
            completed: AtomicBool::new(false),
            sink,
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }

    #[inline]
    pub(crate) fn status(&self) -> ConnectionStatus {
        decode(self.status.load(Ordering::Acquire))
    }

    /// `Pending -> Active`. Returns `false` (and changes nothing) from any
    /// other state.
    pub(crate) fn activate(&self) -> bool {
        self.status
            .compare_exchange(PENDING, ACTIVE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Hand `value` to the sink if the connection is still active.
    pub(crate) fn deliver(&self, value: &T) -> bool {
        if self.status() != ConnectionStatus::Active {
            return false;
        }
        self.sink.on_value(value);
        true
    }

    /// Hand the completion to the sink, at most once and never after removal.
    pub(crate) fn complete_delivery(&self, completion: &Completion<E>) -> bool {
        if self.status() == ConnectionStatus::Removed {
            return false;
        }
        if self.completed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.sink.on_completion(completion);
        true
    }

    /// Move to the terminal state. Returns `true` on the first call only.
    pub(crate) fn mark_removed(&self) -> bool {
        self.status.swap(REMOVED, Ordering::AcqRel) != REMOVED
    }
}

impl<T, E> fmt::Debug for Slot<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("completed", &self.completed.load(Ordering::Relaxed))
            .finish()
    }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// Snapshot of the registry taken at the start of a broadcast round.
pub(crate) type Targets<T, E> = SmallVec<[Arc<Slot<T, E>>; 8]>;

/// Ordered set of active connection slots.
pub(crate) struct Registry<T, E> {
    next_id: u64,
    entries: Vec<Arc<Slot<T, E>>>,
}

impl<T, E> Registry<T, E> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }

    /// Reserve a fresh id. Ids are monotonic and never reused.
    pub(crate) fn allocate_id(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a slot. Inserting an id that is already present is a no-op.
    pub(crate) fn insert(&mut self, slot: Arc<Slot<T, E>>) -> bool {
        if self.contains(slot.id()) {
            return false;
        }
        self.entries.push(slot);
        true
    }

    /// Excise the slot with `id`, preserving the order of the rest.
    pub(crate) fn remove(&mut self, id: ConnectionId) -> Option<Arc<Slot<T, E>>> {
        let index = self.entries.iter().position(|slot| slot.id() == id)?;
        Some(self.entries.remove(index))
    }

    #[must_use]
    pub(crate) fn contains(&self, id: ConnectionId) -> bool {
        self.entries.iter().any(|slot| slot.id() == id)
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub(crate) fn ids(&self) -> Vec<ConnectionId> {
        self.entries.iter().map(|slot| slot.id()).collect()
    }

    /// Take every entry, leaving the registry empty.
    pub(crate) fn drain(&mut self) -> Vec<Arc<Slot<T, E>>> {
        std::mem::take(&mut self.entries)
    }

    /// Clone the current entries, in attachment order.
    #[must_use]
    pub(crate) fn snapshot(&self) -> Targets<T, E> {
        self.entries.iter().cloned().collect()
    }
}

impl<T, E> fmt::Debug for Registry<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("next_id", &self.next_id)
            .field("entries", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Recorder;

    fn slot(registry: &mut Registry<i32, ()>, recorder: &Recorder<i32, ()>) -> Arc<Slot<i32, ()>> {
        Arc::new(Slot::new(registry.allocate_id(), Box::new(recorder.clone())))
    }

    #[test]
    fn ids_are_monotonic() {
        let mut registry: Registry<i32, ()> = Registry::new();
        let a = registry.allocate_id();
        let b = registry.allocate_id();
        assert!(a < b);
        assert_eq!(a.get() + 1, b.get());
        assert_eq!(a.to_string(), "conn#1");
    }

    #[test]
    fn insert_preserves_order_and_rejects_duplicates() {
        let mut registry = Registry::new();
        let rec = Recorder::new();
        let first = slot(&mut registry, &rec);
        let second = slot(&mut registry, &rec);

        assert!(registry.insert(Arc::clone(&first)));
        assert!(registry.insert(Arc::clone(&second)));
        assert!(!registry.insert(Arc::clone(&first)));

        assert_eq!(registry.ids(), vec![first.id(), second.id()]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = Registry::new();
        let rec = Recorder::new();
        let a = slot(&mut registry, &rec);
        let b = slot(&mut registry, &rec);
        let c = slot(&mut registry, &rec);
        for s in [&a, &b, &c] {
            registry.insert(Arc::clone(s));
        }

        assert!(registry.remove(b.id()).is_some());
        assert!(registry.remove(b.id()).is_none());
        assert_eq!(registry.ids(), vec![a.id(), c.id()]);
    }

    #[test]
    fn drain_empties_and_keeps_ids_fresh() {
        let mut registry = Registry::new();
        let rec = Recorder::new();
        let a = slot(&mut registry, &rec);
        registry.insert(Arc::clone(&a));

        let taken = registry.drain();
        assert_eq!(taken.len(), 1);
        assert_eq!(registry.len(), 0);
        assert!(registry.allocate_id() > a.id());
    }

    #[test]
    fn slot_delivers_only_while_active() {
        let mut registry = Registry::new();
        let rec = Recorder::new();
        let s = slot(&mut registry, &rec);

        assert!(!s.deliver(&1), "pending slots do not deliver");
        assert!(s.activate());
        assert!(!s.activate(), "activation happens once");
        assert!(s.deliver(&2));
        assert!(s.mark_removed());
        assert!(!s.mark_removed());
        assert!(!s.deliver(&3));
        assert!(!s.activate(), "removed slots never reactivate");

        assert_eq!(rec.values(), vec![2]);
    }

    #[test]
    fn completion_is_delivered_once() {
        let mut registry = Registry::new();
        let rec = Recorder::new();
        let s = slot(&mut registry, &rec);
        s.activate();

        assert!(s.complete_delivery(&Completion::Finished));
        assert!(!s.complete_delivery(&Completion::Finished));
        assert_eq!(rec.completions().len(), 1);
    }

    #[test]
    fn no_completion_after_removal() {
        let mut registry = Registry::new();
        let rec = Recorder::new();
        let s = slot(&mut registry, &rec);
        s.activate();
        s.mark_removed();

        assert!(!s.complete_delivery(&Completion::Finished));
        assert!(rec.is_empty());
    }
}
