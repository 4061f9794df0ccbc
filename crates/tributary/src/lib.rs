#![forbid(unsafe_code)]

//! Tributary public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users: the core
//! producer/connection types, the transformer catalog, and [`Bridge`], which
//! derives one producer from another through a transformer.

pub mod bridge;

pub use bridge::{Bridge, map_producer};
pub use tributary_core::{
    Completion, Connection, ConnectionGuard, ConnectionId, ConnectionStatus, NoHooks, ProduceError,
    Producer, ProducerConfig, ProducerHooks, Recorder, Replay, SingleSubscriber, Sink, SinkEvent,
    Status, StreamError, SubscriberCount, ValueKind,
};
pub use tributary_transform::{Reversible, Transformer};

pub mod prelude {
    pub use tributary_core as core;
    pub use tributary_transform as transform;

    pub use crate::bridge::{Bridge, map_producer};
    pub use tributary_core::{Completion, Connection, Producer, Sink, Status};
    pub use tributary_transform::{Reversible, Transformer};
}
