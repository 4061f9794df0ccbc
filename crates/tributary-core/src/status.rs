#![forbid(unsafe_code)]

//! Producer status and the terminal completion signal.

use std::fmt;

/// How a stream ended.
///
/// Consumers must branch on this: `Finished` is the expected end of a stream,
/// `Failed` carries the error the producer was finished with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<E> {
    /// The producer finished without an error.
    Finished,
    /// The producer finished with an error.
    Failed(E),
}

impl<E> Completion<E> {
    /// Build a completion from an optional error (`None` means success).
    #[must_use]
    pub fn from_error(error: Option<E>) -> Self {
        match error {
            Some(error) => Self::Failed(error),
            None => Self::Finished,
        }
    }

    /// The error, if the stream failed.
    #[must_use]
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Finished => None,
            Self::Failed(error) => Some(error),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl<E: fmt::Display> fmt::Display for Completion<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finished => write!(f, "finished"),
            Self::Failed(error) => write!(f, "failed: {error}"),
        }
    }
}

/// Lifetime state of a producer.
///
/// Monotonic: once `Finished`, a producer never reports `Active` again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status<E> {
    /// Accepting values and connections.
    Active,
    /// Terminal. Carries the completion every connection was sent.
    Finished(Completion<E>),
}

impl<E> Status<E> {
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }

    /// The completion, once finished.
    #[must_use]
    pub fn completion(&self) -> Option<&Completion<E>> {
        match self {
            Self::Active => None,
            Self::Finished(completion) => Some(completion),
        }
    }
}
