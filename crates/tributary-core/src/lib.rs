#![forbid(unsafe_code)]

//! Core: producers, connections, and the broadcast/finish lifecycle.
//!
//! A [`Producer`] emits a time-ordered sequence of values to an open set of
//! [`Connection`]s. Each connection bridges the producer to one consumer
//! [`Sink`].
//!
//! # Architecture
//!
//! All producer state (last value, status, connection registry) lives behind
//! one re-entrant lock per producer. Connections are stored in a
//! producer-owned [`registry`] keyed by stable [`ConnectionId`]s, and each
//! `Connection` handle refers back to its producer weakly, so a connection
//! never keeps a producer alive.
//!
//! Variants customise behaviour through [`ProducerHooks`], which are invoked
//! around fixed core routines. A hook cannot skip the state update or the
//! broadcast.
//!
//! # Invariants
//!
//! 1. A connection receives values only while it is `Active`.
//! 2. Values are delivered in production order, to connections in attachment
//!    order.
//! 3. `last_value` changes exactly once per accepted `produce`.
//! 4. Finishing is terminal: later `produce`/`finish` calls are absorbed.
//! 5. Every connection observes at most one completion signal.

pub mod config;
pub mod connection;
pub mod error;
pub mod hooks;
pub mod producer;
pub mod registry;
pub mod sink;
pub mod status;

pub use config::{ProducerConfig, Replay, ValueKind};
pub use connection::{Connection, ConnectionGuard, ConnectionStatus};
pub use error::{ProduceError, StreamError};
pub use hooks::{NoHooks, ProducerHooks, SingleSubscriber, SubscriberCount};
pub use producer::Producer;
pub use registry::ConnectionId;
pub use sink::{Recorder, Sink, SinkEvent};
pub use status::{Completion, Status};
