#![forbid(unsafe_code)]

//! Producers: the authoritative state of one value stream.
//!
//! # Design
//!
//! [`Producer<T, E>`] is a cheaply cloneable handle to shared state guarded by
//! a single re-entrant lock. The state holds the last produced value, the
//! [`Status`], and the connection registry.
//!
//! Every public operation is a fixed core routine. Variants customise it with
//! [`ProducerHooks`] invoked before and after the routine, never instead of it.
//!
//! # Concurrency
//!
//! Calls from different threads serialise on the lock, so a broadcast round
//! happens entirely before or entirely after any given attach or detach.
//!
//! Calls made from inside a sink (same thread, lock already held) are allowed:
//!
//! - `detach` takes effect immediately; the detached connection is skipped for
//!   the remainder of the round.
//! - `connect` registers the new connection and replays the latest value to it,
//!   but excludes it from the round in progress.
//! - `produce` / `finish` are queued and run after the current round
//!   completes, so every connection still sees values in production order.
//!
//! A sink that panics aborts the round in progress. Submissions queued from
//! inside that round are discarded; the producer itself stays usable. If the
//! aborted round was the finish round, the producer is still `Finished` and
//! every connection it had not yet completed is removed without a signal.
//!
//! # Lifetime
//!
//! Connections refer to their producer weakly. When the last `Producer` handle
//! is dropped the producer finishes successfully, completing and removing every
//! connection before its state is freed.
//!
//! # Invariants
//!
//! 1. `last_value` is replaced exactly once per accepted value.
//! 2. `Status` is monotonic; `Finished` absorbs further `produce`/`finish`.
//! 3. After the finish round, the registry is empty.
//! 4. Each connection sees at most one completion.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;
use tracing::{debug, trace, warn};

use crate::config::{ProducerConfig, Replay, ValueKind};
use crate::connection::{Connection, Detach};
use crate::error::{ProduceError, StreamError};
use crate::hooks::{NoHooks, ProducerHooks};
use crate::registry::{ConnectionId, Registry, Slot};
use crate::sink::Sink;
use crate::status::{Completion, Status};

static NEXT_PRODUCER_ID: AtomicU64 = AtomicU64::new(1);

fn next_producer_id() -> u64 {
    NEXT_PRODUCER_ID.fetch_add(1, Ordering::Relaxed)
}

// ─── Inner shared state ──────────────────────────────────────────────────────

/// A submission waiting for the drain loop.
enum Op<T, E> {
    Produce(T),
    Finish(Completion<E>),
}

impl<T, E> Op<T, E> {
    fn name(&self) -> &'static str {
        match self {
            Self::Produce(_) => "produce",
            Self::Finish(_) => "finish",
        }
    }
}

struct State<T, E> {
    last_value: Option<T>,
    status: Status<E>,
    registry: Registry<T, E>,
    /// A finish was submitted. Later submissions are absorbed.
    closing: bool,
    /// A frame on the lock-holding thread is running the drain loop.
    draining: bool,
    queue: VecDeque<Op<T, E>>,
}

/// Resets the drain flag when the drain loop exits, including by unwinding.
///
/// If a sink unwinds out of the finish round, the connections it had not yet
/// reached are excised here without a completion signal or remove hooks, so a
/// finished producer never keeps a registered connection.
struct DrainGuard<'a, T, E> {
    cell: &'a RefCell<State<T, E>>,
}

impl<T, E> Drop for DrainGuard<'_, T, E> {
    fn drop(&mut self) {
        let stranded = {
            let Ok(mut state) = self.cell.try_borrow_mut() else {
                return;
            };
            state.draining = false;
            if !std::thread::panicking() {
                return;
            }
            state.queue.clear();
            state.closing = state.status.is_finished();
            if !state.closing {
                return;
            }
            state.registry.drain()
        };
        for slot in &stranded {
            slot.mark_removed();
        }
    }
}

struct Shared<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    id: u64,
    label: String,
    replay: Replay,
    value_kind: ValueKind<T>,
    hooks: Box<dyn ProducerHooks<T, E>>,
    state: ReentrantMutex<RefCell<State<T, E>>>,
}

impl<T, E> Shared<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    // ── Attach ───────────────────────────────────────────────────────

    fn connect(&self, sink: Box<dyn Sink<T, E>>) -> Arc<Slot<T, E>> {
        let guard = self.state.lock();
        let id = guard.borrow_mut().registry.allocate_id();
        let slot = Arc::new(Slot::new(id, sink));
        self.add(&guard, &slot);
        slot
    }

    fn add(&self, cell: &RefCell<State<T, E>>, slot: &Arc<Slot<T, E>>) {
        self.hooks.will_add(slot.id());

        let admitted = {
            let mut borrowed = cell.borrow_mut();
            let state = &mut *borrowed;
            match &state.status {
                Status::Finished(completion) => Err(completion.clone()),
                Status::Active => {
                    state.registry.insert(Arc::clone(slot));
                    slot.activate();
                    let replay = match self.replay {
                        Replay::Latest => state.last_value.clone(),
                        Replay::Off => None,
                    };
                    Ok((replay, state.registry.len()))
                }
            }
        };

        match admitted {
            Err(completion) => {
                slot.complete_delivery(&completion);
                slot.mark_removed();
                trace!(
                    producer = %self.label,
                    connection = %slot.id(),
                    "attach after finish; completed immediately"
                );
            }
            Ok((replay, connections)) => {
                debug!(
                    producer = %self.label,
                    connection = %slot.id(),
                    connections,
                    "connection added"
                );
                if let Some(value) = replay {
                    slot.deliver(&value);
                }
                self.hooks.did_add(slot.id());
            }
        }
    }

    // ── Detach ───────────────────────────────────────────────────────

    fn remove(&self, cell: &RefCell<State<T, E>>, id: ConnectionId) {
        if !cell.borrow().registry.contains(id) {
            trace!(producer = %self.label, connection = %id, "remove absorbed: not registered");
            return;
        }

        self.hooks.will_remove(id);
        let (removed, connections) = {
            let mut state = cell.borrow_mut();
            let removed = state.registry.remove(id);
            (removed, state.registry.len())
        };
        let Some(slot) = removed else {
            return;
        };
        slot.mark_removed();
        debug!(
            producer = %self.label,
            connection = %id,
            connections,
            "connection removed"
        );
        self.hooks.did_remove(id);
    }

    // ── Produce / finish ─────────────────────────────────────────────

    fn submit(&self, op: Op<T, E>) {
        let guard = self.state.lock();
        let cell: &RefCell<State<T, E>> = &guard;
        {
            let mut state = cell.borrow_mut();
            if state.closing {
                trace!(producer = %self.label, op = op.name(), "absorbed: producer finished");
                return;
            }
            if matches!(op, Op::Finish(_)) {
                state.closing = true;
            }
            state.queue.push_back(op);
            if state.draining {
                trace!(
                    producer = %self.label,
                    queued = state.queue.len(),
                    "re-entrant submission queued"
                );
                return;
            }
            state.draining = true;
        }

        let _drain = DrainGuard { cell };
        loop {
            let next = cell.borrow_mut().queue.pop_front();
            match next {
                Some(Op::Produce(value)) => self.broadcast(cell, value),
                Some(Op::Finish(completion)) => self.complete(cell, completion),
                None => break,
            }
        }
    }

    fn broadcast(&self, cell: &RefCell<State<T, E>>, value: T) {
        self.hooks.will_produce(&value);
        let targets = {
            let mut state = cell.borrow_mut();
            state.last_value = Some(value.clone());
            state.registry.snapshot()
        };
        trace!(producer = %self.label, connections = targets.len(), "broadcast");
        for slot in &targets {
            slot.deliver(&value);
        }
        self.hooks.did_produce(&value);
    }

    fn complete(&self, cell: &RefCell<State<T, E>>, completion: Completion<E>) {
        self.hooks.will_finish(&completion);
        let targets = {
            let mut state = cell.borrow_mut();
            state.status = Status::Finished(completion.clone());
            state.registry.snapshot()
        };
        if completion.is_failure() {
            warn!(producer = %self.label, connections = targets.len(), "producer failed");
        } else {
            debug!(producer = %self.label, connections = targets.len(), "producer finished");
        }

        for slot in &targets {
            slot.complete_delivery(&completion);
            self.remove(cell, slot.id());
        }
        self.hooks.did_finish(&completion);
    }
}

impl<T, E> Detach for Shared<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn detach(&self, id: ConnectionId) {
        let guard = self.state.lock();
        self.remove(&guard, id);
    }
}

impl<T, E> Drop for Shared<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn drop(&mut self) {
        if self.state.get_mut().get_mut().status.is_finished() {
            return;
        }
        debug!(producer = %self.label, "producer dropped while active; finishing");
        self.submit(Op::Finish(Completion::Finished));
    }
}

// ─── Producer ────────────────────────────────────────────────────────────────

/// Emits values to every attached [`Connection`].
///
/// Cloning a `Producer` creates a new handle to the **same** stream.
///
/// # Example
///
/// ```
/// use tributary_core::{Producer, Recorder};
///
/// let producer: Producer<i32> = Producer::new();
/// let early = Recorder::new();
/// producer.connect(early.clone());
///
/// producer.produce(1);
///
/// let late = Recorder::new();
/// producer.connect(late.clone());
/// producer.produce(2);
///
/// assert_eq!(early.values(), vec![1, 2]);
/// assert_eq!(late.values(), vec![1, 2]); // replay of 1, then 2
/// ```
pub struct Producer<T, E = StreamError>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Producer<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    // ── Constructors ─────────────────────────────────────────────────

    /// Create an active producer with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ProducerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ProducerConfig<T>) -> Self {
        Self::with_hooks(config, NoHooks)
    }

    /// Create a producer whose lifecycle routines are observed by `hooks`.
    #[must_use]
    pub fn with_hooks(config: ProducerConfig<T>, hooks: impl ProducerHooks<T, E> + 'static) -> Self {
        let id = next_producer_id();
        let label = config.label.unwrap_or_else(|| format!("producer#{id}"));
        let shared = Shared {
            id,
            label,
            replay: config.replay,
            value_kind: config.value_kind,
            hooks: Box::new(hooks),
            state: ReentrantMutex::new(RefCell::new(State {
                last_value: None,
                status: Status::Active,
                registry: Registry::new(),
                closing: false,
                draining: false,
                queue: VecDeque::new(),
            })),
        };
        trace!(producer = %shared.label, "producer created");
        Self {
            shared: Arc::new(shared),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Process-unique identifier of this producer.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    #[must_use]
    pub fn value_kind(&self) -> &ValueKind<T> {
        &self.shared.value_kind
    }

    /// The most recently produced value, if any.
    #[must_use]
    pub fn last_value(&self) -> Option<T> {
        let guard = self.shared.state.lock();
        let value = guard.borrow().last_value.clone();
        value
    }

    #[must_use]
    pub fn status(&self) -> Status<E> {
        let guard = self.shared.state.lock();
        let status = guard.borrow().status.clone();
        status
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        let guard = self.shared.state.lock();
        let finished = guard.borrow().status.is_finished();
        finished
    }

    /// Number of currently active connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        let guard = self.shared.state.lock();
        let count = guard.borrow().registry.len();
        count
    }

    /// Ids of currently active connections, in attachment order.
    #[must_use]
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        let guard = self.shared.state.lock();
        let ids = guard.borrow().registry.ids();
        ids
    }

    // ── Connections ──────────────────────────────────────────────────

    /// Attach `sink`.
    ///
    /// The returned connection is `Active` and has already received the replay
    /// of the latest value (unless replay is off). If the producer has
    /// finished, the sink has already received the completion and the
    /// connection is `Removed`.
    pub fn connect(&self, sink: impl Sink<T, E> + 'static) -> Connection<T, E> {
        let slot = self.shared.connect(Box::new(sink));
        let weak = Arc::downgrade(&self.shared);
        let producer: Weak<dyn Detach> = weak;
        Connection::new(slot, producer)
    }

    /// Remove `connection` if it belongs to this producer and is attached.
    ///
    /// Unknown, foreign, and already-removed connections are ignored.
    pub fn disconnect(&self, connection: &Connection<T, E>) {
        if connection.producer_ptr() != Arc::as_ptr(&self.shared) as *const () {
            trace!(
                producer = %self.shared.label,
                connection = %connection.id(),
                "disconnect absorbed: foreign connection"
            );
            return;
        }
        self.shared.detach(connection.id());
    }

    // ── Production ───────────────────────────────────────────────────

    /// Store `value` as the last value and deliver it to every connection.
    ///
    /// Absorbed silently once the producer has finished.
    ///
    /// # Panics
    ///
    /// Panics if `value` does not conform to the producer's [`ValueKind`].
    /// Use [`try_produce`](Self::try_produce) to check instead.
    pub fn produce(&self, value: T) {
        if let Err(err) = self.try_produce(value) {
            panic!("precondition failed: {err}");
        }
    }

    /// Like [`produce`](Self::produce), but reports a kind mismatch as an
    /// error instead of panicking.
    pub fn try_produce(&self, value: T) -> Result<(), ProduceError> {
        let kind = &self.shared.value_kind;
        if !kind.accepts(&value) {
            return Err(ProduceError::kind_mismatch(
                kind.name(),
                self.shared.label.as_str(),
            ));
        }
        self.shared.submit(Op::Produce(value));
        Ok(())
    }

    /// Finish successfully.
    pub fn finish(&self) {
        self.finish_with(None);
    }

    /// Finish with `error`.
    pub fn fail(&self, error: E) {
        self.finish_with(Some(error));
    }

    /// Terminal transition. `None` is success, `Some` is failure.
    ///
    /// The first call completes and removes every connection; later calls
    /// are absorbed.
    pub fn finish_with(&self, error: Option<E>) {
        self.shared.submit(Op::Finish(Completion::from_error(error)));
    }
}

impl<T, E> Clone for Producer<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> Default for Producer<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Producer<T, E>
where
    T: Clone + Send + fmt::Debug + 'static,
    E: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.shared.state.lock();
        let state = guard.borrow();
        f.debug_struct("Producer")
            .field("id", &self.shared.id)
            .field("label", &self.shared.label)
            .field("last_value", &state.last_value)
            .field("finished", &state.status.is_finished())
            .field("connections", &state.registry)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
