#![forbid(unsafe_code)]

//! Connections: one attachment between a producer and a sink.
//!
//! A [`Connection`] is returned by [`Producer::connect`](crate::Producer::connect)
//! and is either `Active` or, if the producer had already finished, `Removed`
//! with its completion already delivered.
//!
//! The handle refers to its producer **weakly**. Holding a connection never
//! keeps a producer alive, and detaching after the producer was dropped is a
//! harmless no-op (the producer removed every connection on its way out).
//!
//! Dropping a `Connection` does **not** detach it; detaching is always
//! explicit. Use [`Connection::guard`] for scope-bound attachment.

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::trace;

use crate::registry::{ConnectionId, Slot};

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Constructed, not yet registered with its producer.
    Pending,
    /// Registered and receiving values.
    Active,
    /// Terminal; no further delivery.
    Removed,
}

/// Lookup-only view of a producer, as seen from its connections.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: ConnectionId);
}

/// Consumer handle for one attachment.
pub struct Connection<T, E> {
    slot: Arc<Slot<T, E>>,
    producer: Weak<dyn Detach>,
}

impl<T, E> Connection<T, E> {
    pub(crate) fn new(slot: Arc<Slot<T, E>>, producer: Weak<dyn Detach>) -> Self {
        Self { slot, producer }
    }

    /// Identifier of this connection within its producer.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.slot.id()
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.slot.status()
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status() == ConnectionStatus::Active
    }

    /// Stop receiving values.
    ///
    /// Routes through the producer's remove protocol, so its `will_remove` /
    /// `did_remove` hooks run. Idempotent: detaching a removed connection, or
    /// one whose producer is gone, does nothing.
    pub fn detach(&self) {
        if self.status() == ConnectionStatus::Removed {
            trace!(connection = %self.id(), "detach absorbed: already removed");
            return;
        }
        match self.producer.upgrade() {
            Some(producer) => producer.detach(self.id()),
            None => {
                self.slot.mark_removed();
            }
        }
    }

    /// Convert into a guard that detaches when dropped.
    #[must_use]
    pub fn guard(self) -> ConnectionGuard<T, E> {
        ConnectionGuard { connection: self }
    }

    pub(crate) fn producer_ptr(&self) -> *const () {
        self.producer.as_ptr() as *const ()
    }
}

impl<T, E> fmt::Debug for Connection<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id())
            .field("status", &self.status())
            .finish()
    }
}

// ─── ConnectionGuard ─────────────────────────────────────────────────────────

/// RAII guard that detaches its connection on drop.
#[must_use = "dropping the guard detaches the connection immediately"]
pub struct ConnectionGuard<T, E> {
    connection: Connection<T, E>,
}

impl<T, E> ConnectionGuard<T, E> {
    #[must_use]
    pub fn connection(&self) -> &Connection<T, E> {
        &self.connection
    }

    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }
}

impl<T, E> Drop for ConnectionGuard<T, E> {
    fn drop(&mut self) {
        self.connection.detach();
    }
}

impl<T, E> fmt::Debug for ConnectionGuard<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("connection", &self.connection)
            .finish()
    }
}
