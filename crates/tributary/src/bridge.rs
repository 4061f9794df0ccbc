//! Producers derived from other producers.
//!
//! A [`Bridge`] connects to a source producer and re-emits every delivered
//! value, passed through a [`Transformer`], on its own output producer. The
//! source's completion is forwarded unchanged.
//!
//! The bridge owns its input connection. Dropping the bridge detaches from the
//! source; the output then finishes once its last handle is gone.

use std::fmt;

use tracing::debug;
use tributary_core::{Completion, ConnectionGuard, Producer, ProducerConfig, Sink};
use tributary_transform::Transformer;

/// Sink feeding transformed values into an output producer.
struct Forward<X, O, E>
where
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    transformer: X,
    output: Producer<O, E>,
}

impl<I, O, E, X> Sink<I, E> for Forward<X, O, E>
where
    I: Clone,
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
    X: Transformer<I, O> + Send + Sync,
{
    fn on_value(&self, value: &I) {
        self.output.produce(self.transformer.transform(value.clone()));
    }

    fn on_completion(&self, completion: &Completion<E>) {
        self.output.finish_with(completion.error().cloned());
    }
}

/// An output producer fed from a source producer through a transformer.
///
/// # Invariants
///
/// 1. Every value the source delivers to the bridge (including the replay on
///    attach) is transformed and produced on the output, in order.
/// 2. When the source finishes, the output finishes with the same completion.
/// 3. Dropping the bridge detaches it from the source.
pub struct Bridge<I, O, E>
where
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    output: Producer<O, E>,
    input: ConnectionGuard<I, E>,
}

impl<I, O, E> Bridge<I, O, E>
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Bridge `source` into a new output producer with default configuration.
    pub fn new<X>(source: &Producer<I, E>, transformer: X) -> Self
    where
        X: Transformer<I, O> + Send + Sync + 'static,
    {
        Self::with_config(source, transformer, ProducerConfig::default())
    }

    /// Bridge `source` into a new output producer built from `config`.
    ///
    /// # Panics
    ///
    /// Panics if a transformed value does not conform to `config`'s value
    /// kind.
    pub fn with_config<X>(source: &Producer<I, E>, transformer: X, config: ProducerConfig<O>) -> Self
    where
        X: Transformer<I, O> + Send + Sync + 'static,
    {
        let output = Producer::with_config(config);
        let input = source
            .connect(Forward {
                transformer,
                output: output.clone(),
            })
            .guard();
        debug!(
            source = source.label(),
            output = output.label(),
            connection = %input.id(),
            "bridge attached"
        );
        Self { output, input }
    }

    /// The derived producer. Connect consumers here.
    #[must_use]
    pub fn output(&self) -> &Producer<O, E> {
        &self.output
    }

    /// Whether the bridge is still attached to its source.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.input.connection().is_active()
    }
}

impl<I, O, E> fmt::Debug for Bridge<I, O, E>
where
    O: Clone + Send + fmt::Debug + 'static,
    E: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("output", &self.output)
            .field("input", &self.input)
            .finish()
    }
}

/// Derive a producer from `source` through `transformer`.
///
/// Shorthand for [`Bridge::new`].
pub fn map_producer<I, O, E, X>(source: &Producer<I, E>, transformer: X) -> Bridge<I, O, E>
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
    X: Transformer<I, O> + Send + Sync + 'static,
{
    Bridge::new(source, transformer)
}
