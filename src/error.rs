//! Outcome and failure types shared by every combinator.
//!
//! A task resolves to exactly one of three terminal states: success, fault,
//! or cancellation. [`Outcome`] encodes that taxonomy as a plain `Result`
//! whose error side is [`Failure`], so combinators can propagate failures
//! with `?` and callers can pattern-match on the outcome kind.
//!
//! Faults carry the original error object behind an [`Arc`]. Combinators
//! clone the handle, never re-wrap it, so a fault observed at the end of a
//! pipeline is pointer-identical to the one raised at the start.

use std::any::Any;
use std::error::Error;
use std::sync::Arc;

use thiserror::Error;

/// Shared handle to the error object carried by a faulted task.
///
/// Identity is `Arc` pointer identity; use [`Arc::ptr_eq`] to assert that a
/// fault survived a pipeline unchanged.
pub type FaultObject = Arc<dyn Error + Send + Sync + 'static>;

/// Boxed value carried by the type-erased task form ([`crate::AnyTask`]).
pub type AnyValue = Box<dyn Any + Send + 'static>;

/// Result of awaiting a task: the success value or the terminal failure.
pub type Outcome<T> = Result<T, Failure>;

/// Terminal failure of a task.
///
/// Cancellation is a distinct outcome, not a fault. Combinators that forward
/// outcomes must preserve the distinction; collapsing `Cancelled` into
/// `Faulted` is a bug.
#[derive(Debug, Clone, Error)]
pub enum Failure {
    /// The task failed with an error. The original error object is shared,
    /// not copied, so its identity is preserved end-to-end.
    #[error("{0}")]
    Faulted(FaultObject),

    /// The task was cancelled before producing a value.
    #[error("task was cancelled")]
    Cancelled,
}

impl Failure {
    /// Wraps a concrete error into a fault.
    pub fn fault<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Failure::Faulted(Arc::new(error))
    }

    /// Returns `true` for the cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Failure::Cancelled)
    }

    /// Returns the shared error object for a fault, or `None` for
    /// cancellation.
    pub fn fault_object(&self) -> Option<&FaultObject> {
        match self {
            Failure::Faulted(error) => Some(error),
            Failure::Cancelled => None,
        }
    }
}

/// Raised by [`crate::Task::cast`] and friends when the runtime value is not
/// of the requested type.
#[derive(Debug, Error)]
#[error("task value is not of type {expected}")]
pub struct CastError {
    /// Name of the type the caller asked for.
    pub expected: &'static str,
}

/// Raised by the unseeded fold over an empty sequence.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("cannot aggregate an empty task sequence")]
    Empty,
}

/// Raised by [`crate::ValueTask::when_any`] when given no tasks to race.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("when_any requires at least one task")]
    Empty,
}
