//! Low-overhead task variant and its parity combinators.
//!
//! [`ValueTask<T>`] avoids boxing when a result is already available
//! synchronously: a ready outcome is stored inline, and only genuinely
//! asynchronous work defers to a heap-allocated [`Task`]. Every combinator
//! behaves identically to its [`Task`] counterpart, and conversions in
//! either direction preserve the outcome (value, fault identity, or
//! cancellation) exactly without re-running user code.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::{AnyValue, Failure, FaultObject, Outcome, SelectError};
use crate::seq::TaskIterExt;
use crate::task::{cast_value, Task};
use crate::unit::Unit;

/// A task that may hold its outcome inline instead of behind an allocation.
///
/// # Examples
///
/// ```rust
/// use task_helpers::ValueTask;
///
/// # async fn example() {
/// let task = ValueTask::from_result(2).map(|v| v + 40);
/// assert!(task.is_ready()); // no allocation happened
/// assert_eq!(task.await.unwrap(), 42);
/// # }
/// ```
pub struct ValueTask<T> {
    inner: ValueInner<T>,
}

enum ValueInner<T> {
    /// Outcome available now. The `Option` is taken by `poll`.
    Ready(Option<Outcome<T>>),
    Deferred(Task<T>),
}

impl ValueTask<Unit> {
    /// An already-completed unit task.
    pub fn completed() -> Self {
        ValueTask::from_result(Unit::VALUE)
    }

    /// Resolves after `duration`, via the host runtime's timer.
    pub fn delay(duration: Duration) -> Self {
        ValueTask::deferred(Task::from_future(async move {
            tokio::time::sleep(duration).await;
            Ok(Unit::VALUE)
        }))
    }

    /// Like [`ValueTask::delay`], resolving as `Cancelled` if `token` fires
    /// before the duration elapses.
    pub fn delay_cancellable(duration: Duration, token: CancellationToken) -> Self {
        ValueTask::deferred(Task::from_future(async move {
            tokio::select! {
                _ = tokio::time::sleep(duration) => Ok(Unit::VALUE),
                _ = token.cancelled() => Err(Failure::Cancelled),
            }
        }))
    }
}

impl<T: Send + 'static> ValueTask<T> {
    /// An already-succeeded task; the value is stored inline.
    pub fn from_result(value: T) -> Self {
        Self::from_outcome(Ok(value))
    }

    /// An already-resolved task holding the given outcome.
    pub fn from_outcome(outcome: Outcome<T>) -> Self {
        Self {
            inner: ValueInner::Ready(Some(outcome)),
        }
    }

    /// An already-faulted task carrying the given error object.
    pub fn from_error(error: FaultObject) -> Self {
        Self::from_outcome(Err(Failure::Faulted(error)))
    }

    /// An already-cancelled task.
    pub fn cancelled() -> Self {
        Self::from_outcome(Err(Failure::Cancelled))
    }

    pub(crate) fn deferred(task: Task<T>) -> Self {
        Self {
            inner: ValueInner::Deferred(task),
        }
    }

    /// `true` when the outcome is available without awaiting.
    pub fn is_ready(&self) -> bool {
        matches!(self.inner, ValueInner::Ready(_))
    }

    /// Applies `mapper` to the success value; no allocation when the
    /// outcome is already available.
    pub fn map<U, F>(self, mapper: F) -> ValueTask<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self.inner {
            ValueInner::Ready(outcome) => ValueTask {
                inner: ValueInner::Ready(outcome.map(|o| o.map(mapper))),
            },
            ValueInner::Deferred(task) => ValueTask::deferred(task.map(mapper)),
        }
    }

    /// Monadic bind; a ready success invokes `binder` immediately.
    pub fn and_then<U, F>(self, binder: F) -> ValueTask<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> ValueTask<U> + Send + 'static,
    {
        match self.inner {
            ValueInner::Ready(Some(Ok(value))) => binder(value),
            ValueInner::Ready(Some(Err(failure))) => ValueTask::from_outcome(Err(failure)),
            ValueInner::Ready(None) => ValueTask {
                inner: ValueInner::Ready(None),
            },
            ValueInner::Deferred(task) => {
                ValueTask::deferred(task.and_then(move |value| binder(value).into_task()))
            }
        }
    }

    /// Checked runtime cast of the success value; see [`Task::cast`].
    pub fn cast<U>(self) -> ValueTask<U>
    where
        T: Any,
        U: Any + Send + 'static,
    {
        match self.inner {
            ValueInner::Ready(outcome) => ValueTask {
                inner: ValueInner::Ready(outcome.map(|o| o.and_then(cast_value))),
            },
            ValueInner::Deferred(task) => ValueTask::deferred(task.cast()),
        }
    }

    /// Erases the result type; see [`Task::into_any`].
    pub fn into_any(self) -> ValueTask<AnyValue>
    where
        T: Any,
    {
        match self.inner {
            ValueInner::Ready(outcome) => ValueTask {
                inner: ValueInner::Ready(outcome.map(|o| o.map(|v| Box::new(v) as AnyValue))),
            },
            ValueInner::Deferred(task) => ValueTask::deferred(task.into_any()),
        }
    }

    /// Discards the success value, keeping only the outcome kind.
    pub fn into_unit(self) -> ValueTask<Unit> {
        self.map(|_| Unit::VALUE)
    }

    /// Converts to the heavy task representation.
    ///
    /// The outcome is carried over exactly; no user code runs again.
    ///
    /// # Panics
    ///
    /// Panics if this task was already polled to completion.
    pub fn into_task(self) -> Task<T> {
        match self.inner {
            ValueInner::Ready(Some(outcome)) => Task::from_outcome(outcome),
            ValueInner::Ready(None) => panic!("ValueTask converted after completion"),
            ValueInner::Deferred(task) => task,
        }
    }

    /// Fans out every input concurrently and fans back in, preserving input
    /// order in the result. Semantics are identical to
    /// [`TaskIterExt::join_all`]; the lightweight tasks are bridged through
    /// [`Task`] internally.
    pub fn when_all<I>(tasks: I) -> ValueTask<Vec<T>>
    where
        I: IntoIterator<Item = ValueTask<T>>,
    {
        let tasks: Vec<Task<T>> = tasks.into_iter().map(ValueTask::into_task).collect();
        ValueTask::deferred(tasks.join_all())
    }

    /// Resolves as soon as any input resolves, successfully or not.
    ///
    /// The payload is a resolved handle to the winner; await it to learn
    /// which outcome occurred. Faults with [`SelectError::Empty`] when
    /// given no tasks.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use task_helpers::ValueTask;
    ///
    /// # async fn example() {
    /// let fast = ValueTask::from_result(1);
    /// let slow = ValueTask::delay(std::time::Duration::from_secs(60)).map(|_| 2);
    /// let winner = ValueTask::when_any(vec![fast, slow]).await.unwrap();
    /// assert_eq!(winner.await.unwrap(), 1);
    /// # }
    /// ```
    pub fn when_any<I>(tasks: I) -> ValueTask<ValueTask<T>>
    where
        I: IntoIterator<Item = ValueTask<T>>,
    {
        let tasks: Vec<Task<T>> = tasks.into_iter().map(ValueTask::into_task).collect();
        if tasks.is_empty() {
            return ValueTask::from_outcome(Err(Failure::fault(SelectError::Empty)));
        }
        ValueTask::deferred(Task::from_future(async move {
            let (outcome, index, _rest) = futures::future::select_all(tasks).await;
            trace!(index, "task won the when_any race");
            Ok(ValueTask::from_outcome(outcome))
        }))
    }
}

// `poll` only ever moves the ready outcome out or re-pins the boxed task;
// neither arm pins `T` itself, so the handle is movable regardless of `T`.
impl<T> Unpin for ValueTask<T> {}

impl<T> Future for ValueTask<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            ValueInner::Ready(outcome) => {
                Poll::Ready(outcome.take().expect("ValueTask polled after completion"))
            }
            ValueInner::Deferred(task) => Pin::new(task).poll(cx),
        }
    }
}

impl<T> fmt::Debug for ValueTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.inner {
            ValueInner::Ready(_) => "ready",
            ValueInner::Deferred(_) => "deferred",
        };
        f.debug_struct("ValueTask").field("state", &state).finish()
    }
}
