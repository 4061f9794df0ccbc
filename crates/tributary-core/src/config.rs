#![forbid(unsafe_code)]

//! Producer configuration.
//!
//! [`ProducerConfig`] is built with `with_*` methods and consumed by
//! [`Producer::with_config`](crate::Producer::with_config). The defaults give
//! replay-latest semantics, an auto-generated label, and a value kind that
//! accepts every value of the producer's type.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// What a newly attached connection receives before live values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Replay {
    /// Replay the most recent value (if any) exactly once on attach.
    #[default]
    Latest,
    /// Deliver only values produced after attach.
    Off,
}

/// The declared kind of values a producer emits.
///
/// The Rust type `T` already fixes the shape of every value. A `ValueKind`
/// narrows it further with a conformance predicate checked at the production
/// boundary (for example "non-negative" or "non-empty").
pub struct ValueKind<T> {
    name: Cow<'static, str>,
    accepts: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> ValueKind<T> {
    /// A kind that accepts every value of `T`, named after the type.
    #[must_use]
    pub fn any() -> Self {
        Self {
            name: Cow::Borrowed(std::any::type_name::<T>()),
            accepts: Arc::new(|_| true),
        }
    }

    /// A named kind accepting values for which `accepts` returns `true`.
    #[must_use]
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        accepts: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            accepts: Arc::new(accepts),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `value` conforms to this kind.
    #[inline]
    #[must_use]
    pub fn accepts(&self, value: &T) -> bool {
        (self.accepts)(value)
    }
}

impl<T> Clone for ValueKind<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            accepts: Arc::clone(&self.accepts),
        }
    }
}

impl<T> Default for ValueKind<T> {
    fn default() -> Self {
        Self::any()
    }
}

impl<T> fmt::Debug for ValueKind<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueKind").field("name", &self.name).finish()
    }
}

/// Construction-time settings for a producer.
#[derive(Debug, Clone)]
pub struct ProducerConfig<T> {
    /// Label used in log fields and error messages. Defaults to
    /// `producer#<id>`.
    pub label: Option<String>,
    /// Replay policy for late connections.
    pub replay: Replay,
    /// Conformance check applied to every produced value.
    pub value_kind: ValueKind<T>,
}

impl<T> Default for ProducerConfig<T> {
    fn default() -> Self {
        Self {
            label: None,
            replay: Replay::Latest,
            value_kind: ValueKind::any(),
        }
    }
}

impl<T> ProducerConfig<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_replay(mut self, replay: Replay) -> Self {
        self.replay = replay;
        self
    }

    #[must_use]
    pub fn with_value_kind(mut self, kind: ValueKind<T>) -> Self {
        self.value_kind = kind;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_replay_latest_and_accept_everything() {
        let config = ProducerConfig::<i32>::default();
        assert_eq!(config.replay, Replay::Latest);
        assert!(config.label.is_none());
        assert!(config.value_kind.accepts(&-7));
        assert_eq!(config.value_kind.name(), "i32");
    }

    #[test]
    fn builder_overrides() {
        let config = ProducerConfig::new()
            .with_label("temperature")
            .with_replay(Replay::Off)
            .with_value_kind(ValueKind::new("non-negative", |v: &i64| *v >= 0));

        assert_eq!(config.label.as_deref(), Some("temperature"));
        assert_eq!(config.replay, Replay::Off);
        assert!(config.value_kind.accepts(&0));
        assert!(!config.value_kind.accepts(&-1));
    }

    #[test]
    fn value_kind_debug_shows_name() {
        let kind = ValueKind::new("even", |v: &u8| v % 2 == 0);
        let dbg = format!("{kind:?}");
        assert!(dbg.contains("even"));
    }
}
