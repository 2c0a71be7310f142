//! The three-state task handle and its single-task combinators.
//!
//! [`Task<T>`] is an opaque, awaitable handle to an asynchronous computation
//! that resolves to an [`Outcome<T>`]: success, fault, or cancellation. The
//! handle owns no scheduler; it is a boxed future driven by whoever awaits
//! it. Combinators react to completion and never start concurrent work on
//! their own. Eager execution on the host runtime is opt-in via
//! [`Task::spawn`].
//!
//! # Examples
//!
//! ```rust
//! use task_helpers::Task;
//!
//! # async fn example() {
//! let task = Task::from_result(21).map(|v| v * 2);
//! assert_eq!(task.await.unwrap(), 42);
//! # }
//! ```

use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{BoxFuture, FutureExt};

use crate::completion::CompletionSource;
use crate::error::{AnyValue, CastError, Failure, FaultObject, Outcome};
use crate::seq::TaskSequence;
use crate::unit::Unit;
use crate::value::ValueTask;

/// A task whose result type has been erased to a boxed value.
///
/// Produced by [`Task::into_any`]; recover a typed task with
/// [`Task::downcast`].
pub type AnyTask = Task<AnyValue>;

/// Handle to an asynchronous computation yielding an [`Outcome<T>`].
pub struct Task<T> {
    inner: BoxFuture<'static, Outcome<T>>,
}

impl<T: Send + 'static> Task<T> {
    /// Wraps an outcome-producing future.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Outcome<T>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
        }
    }

    /// An already-resolved task holding the given outcome.
    pub fn from_outcome(outcome: Outcome<T>) -> Self {
        Self::from_future(futures::future::ready(outcome))
    }

    /// An already-succeeded task.
    pub fn from_result(value: T) -> Self {
        Self::from_outcome(Ok(value))
    }

    /// An already-faulted task carrying the given error object.
    ///
    /// The object is shared, not copied: awaiting the task (or anything
    /// derived from it) observes the same instance.
    pub fn from_error(error: FaultObject) -> Self {
        Self::from_outcome(Err(Failure::Faulted(error)))
    }

    /// An already-failed task with the given failure.
    pub fn from_failure(failure: Failure) -> Self {
        Self::from_outcome(Err(failure))
    }

    /// An already-cancelled task.
    pub fn cancelled() -> Self {
        Self::from_outcome(Err(Failure::Cancelled))
    }

    /// Spawns an infallible future on the host runtime and returns the
    /// handle to its result.
    ///
    /// The work starts immediately. An aborted task resolves as
    /// `Cancelled`; a panicked task faults with the join error as the
    /// fault object.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        Self::from_future(async move {
            match handle.await {
                Ok(value) => Ok(value),
                Err(join) if join.is_cancelled() => Err(Failure::Cancelled),
                Err(join) => Err(Failure::Faulted(Arc::new(join))),
            }
        })
    }

    /// Applies `mapper` to the success value.
    ///
    /// Faults and cancellation pass through untouched; `mapper` never runs
    /// on a failed task.
    pub fn map<U, F>(self, mapper: F) -> Task<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Task::from_future(async move { self.await.map(mapper) })
    }

    /// Monadic bind: passes the success value to `binder` and resolves with
    /// the inner task's outcome.
    ///
    /// This is also the async-mapper form of [`Task::map`]: mapping with an
    /// asynchronous function and binding are the same operation.
    pub fn and_then<U, F>(self, binder: F) -> Task<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Task<U> + Send + 'static,
    {
        Task::from_future(async move {
            let value = self.await?;
            binder(value).await
        })
    }

    /// Bind with a result-combining projection, in the shape of a query
    /// comprehension: `binder` sees the original value, and `combine` joins
    /// the original and bound values into the final result.
    ///
    /// An asynchronous projection composes as
    /// `task.and_then_map(binder, combine).and_then(..)`.
    pub fn and_then_map<U, V, F, G>(self, binder: F, combine: G) -> Task<V>
    where
        U: Send + 'static,
        V: Send + 'static,
        F: FnOnce(&T) -> Task<U> + Send + 'static,
        G: FnOnce(T, U) -> V + Send + 'static,
    {
        Task::from_future(async move {
            let value = self.await?;
            let bound = binder(&value).await?;
            Ok(combine(value, bound))
        })
    }

    /// Reinterprets the success value as type `U`, checked at the boundary.
    ///
    /// Faults with [`CastError`] when the runtime value is not a `U`.
    /// Failures of the source task pass through untouched.
    pub fn cast<U>(self) -> Task<U>
    where
        T: Any,
        U: Any + Send + 'static,
    {
        Task::from_future(async move {
            let value = self.await?;
            cast_value(value)
        })
    }

    /// Erases the result type, yielding an [`AnyTask`].
    pub fn into_any(self) -> AnyTask
    where
        T: Any,
    {
        Task::from_future(async move {
            let value = self.await?;
            Ok(Box::new(value) as AnyValue)
        })
    }

    /// Discards the success value, keeping only the outcome kind.
    pub fn into_unit(self) -> Task<Unit> {
        Task::from_future(async move {
            self.await?;
            Ok(Unit::VALUE)
        })
    }

    /// Drains this task's outcome into an external completion source.
    ///
    /// Success resolves the source, cancellation cancels it, and a fault
    /// faults it with the original error object. All three use try-settle
    /// semantics: if the source was already settled the outcome is dropped
    /// silently. The returned task reports only that the forwarding ran; it
    /// always resolves to `Ok(Unit)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use task_helpers::{CompletionSource, Task};
    ///
    /// # async fn example() {
    /// let (source, target) = CompletionSource::new();
    /// Task::from_result(42).settle_into(source).await.unwrap();
    /// assert_eq!(target.await.unwrap(), 42);
    /// # }
    /// ```
    pub fn settle_into(self, source: CompletionSource<T>) -> Task<Unit> {
        Task::from_future(async move {
            match self.await {
                Ok(value) => {
                    source.try_resolve(value);
                }
                Err(Failure::Cancelled) => {
                    source.try_cancel();
                }
                Err(Failure::Faulted(error)) => {
                    source.try_fault(error);
                }
            }
            Ok(Unit::VALUE)
        })
    }

    /// Like [`Task::settle_into`], transforming the success value with
    /// `mapper` before resolving the source.
    pub fn settle_into_map<U, F>(self, source: CompletionSource<U>, mapper: F) -> Task<Unit>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Task::from_future(async move {
            match self.await {
                Ok(value) => {
                    source.try_resolve(mapper(value));
                }
                Err(Failure::Cancelled) => {
                    source.try_cancel();
                }
                Err(Failure::Faulted(error)) => {
                    source.try_fault(error);
                }
            }
            Ok(Unit::VALUE)
        })
    }

    /// Like [`Task::settle_into`] with an asynchronous mapper: `binder`'s
    /// task is awaited and its failure, if any, settles the source.
    pub fn settle_into_then<U, F>(self, source: CompletionSource<U>, binder: F) -> Task<Unit>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Task<U> + Send + 'static,
    {
        Task::from_future(async move {
            let outcome = match self.await {
                Ok(value) => binder(value).await,
                Err(failure) => Err(failure),
            };
            match outcome {
                Ok(mapped) => {
                    source.try_resolve(mapped);
                }
                Err(Failure::Cancelled) => {
                    source.try_cancel();
                }
                Err(Failure::Faulted(error)) => {
                    source.try_fault(error);
                }
            }
            Ok(Unit::VALUE)
        })
    }

    /// Converts to the low-overhead task representation.
    pub fn into_value(self) -> ValueTask<T> {
        ValueTask::deferred(self)
    }
}

impl<C> Task<C>
where
    C: IntoIterator + Send + 'static,
    C::Item: Send + 'static,
{
    /// Bridges a future-of-collection into a lazy sequence of per-element
    /// tasks.
    ///
    /// The first iteration step **blocks the calling thread** until this
    /// task resolves; see [`TaskSequence`] for the full contract.
    pub fn into_sequence(self) -> TaskSequence<C> {
        TaskSequence::new(self)
    }
}

impl AnyTask {
    /// Recovers a typed task from a type-erased one.
    ///
    /// The counterpart of [`Task::cast`] for sources whose result type is
    /// only known at runtime. Faults with [`CastError`] on a type mismatch.
    pub fn downcast<U>(self) -> Task<U>
    where
        U: Any + Send + 'static,
    {
        Task::from_future(async move {
            let boxed = self.await?;
            match boxed.downcast::<U>() {
                Ok(value) => Ok(*value),
                Err(_) => Err(Failure::fault(CastError {
                    expected: type_name::<U>(),
                })),
            }
        })
    }
}

impl<T> Future for Task<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

/// Checked runtime cast of an owned value, shared by the task and
/// value-task cast paths.
pub(crate) fn cast_value<T, U>(value: T) -> Outcome<U>
where
    T: Any + Send + 'static,
    U: Any,
{
    let boxed: AnyValue = Box::new(value);
    match boxed.downcast::<U>() {
        Ok(cast) => Ok(*cast),
        Err(_) => Err(Failure::fault(CastError {
            expected: type_name::<U>(),
        })),
    }
}
