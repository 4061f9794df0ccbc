use std::sync::Arc;

use thiserror::Error;

/// Default error type carried by a failed stream.
///
/// Cheap to clone so the same error can be handed to every connection.
pub type StreamError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors reported by [`Producer::try_produce`](crate::Producer::try_produce).
///
/// Producing after finish is not an error: such values are absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProduceError {
    #[error("value does not conform to kind `{kind}` declared by {producer}")]
    KindMismatch { kind: String, producer: String },
}

impl ProduceError {
    #[must_use]
    pub fn kind_mismatch(kind: impl Into<String>, producer: impl Into<String>) -> Self {
        Self::KindMismatch {
            kind: kind.into(),
            producer: producer.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_mismatch_message_names_kind_and_producer() {
        let err = ProduceError::kind_mismatch("positive", "prices");
        assert_eq!(
            err.to_string(),
            "value does not conform to kind `positive` declared by prices"
        );
    }
}
