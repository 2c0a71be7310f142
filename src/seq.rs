//! Combinators over ordered sequences of tasks, and the bridges between
//! future-of-collection and collection-of-futures representations.
//!
//! Two families live here:
//!
//! - **Sequential** combinators (`aggregate*`, `all*`, `any*`, `exists`)
//!   await one element fully before touching the next, in input order, and
//!   short-circuit as soon as the answer is known.
//! - **Fan-in** ([`TaskIterExt::join_all`]) drives every input concurrently
//!   and preserves input order in the output regardless of completion
//!   order.
//!
//! [`TaskSequence`] is the deliberate odd one out: a *lazily blocking*
//! bridge from one future-of-collection to an iterator of per-element
//! tasks. See its documentation before using it.

use std::any::Any;
use std::iter;

use tracing::{debug, trace};

use crate::error::{AggregateError, Failure};
use crate::task::{AnyTask, Task};

/// Sequence combinators for anything that iterates over [`Task<T>`].
///
/// Implemented for every `IntoIterator<Item = Task<T>>`, so plain `Vec`s
/// and arrays of tasks pick these up directly.
///
/// # Examples
///
/// ```rust
/// use task_helpers::{Task, TaskIterExt};
///
/// # async fn example() {
/// let tasks = vec![
///     Task::from_result(123),
///     Task::from_result(456),
///     Task::from_result(789),
/// ];
/// let sum = tasks.aggregate(|a, b| a + b).await.unwrap();
/// assert_eq!(sum, 1368);
/// # }
/// ```
pub trait TaskIterExt<T>: IntoIterator<Item = Task<T>> + Sized
where
    T: Send + 'static,
{
    /// Unseeded left fold: the first two values combine via `step`, the
    /// result combines with the third, and so on.
    ///
    /// Strictly sequential: element `i + 1` is not awaited until the fold
    /// through element `i` has resolved. Faults with
    /// [`AggregateError::Empty`] on an empty sequence.
    fn aggregate<F>(self, mut step: F) -> Task<T>
    where
        Self::IntoIter: Send + 'static,
        F: FnMut(T, T) -> T + Send + 'static,
    {
        let mut tasks = self.into_iter();
        Task::from_future(async move {
            let Some(first) = tasks.next() else {
                return Err(Failure::fault(AggregateError::Empty));
            };
            let mut acc = first.await?;
            for task in tasks {
                let value = task.await?;
                acc = step(acc, value);
            }
            Ok(acc)
        })
    }

    /// Unseeded left fold with an asynchronous step.
    fn aggregate_async<F>(self, mut step: F) -> Task<T>
    where
        Self::IntoIter: Send + 'static,
        F: FnMut(T, T) -> Task<T> + Send + 'static,
    {
        let mut tasks = self.into_iter();
        Task::from_future(async move {
            let Some(first) = tasks.next() else {
                return Err(Failure::fault(AggregateError::Empty));
            };
            let mut acc = first.await?;
            for task in tasks {
                let value = task.await?;
                acc = step(acc, value).await?;
            }
            Ok(acc)
        })
    }

    /// Seeded left fold starting from `seed`.
    ///
    /// A finalizer composes as `.map(..)` (or `.and_then(..)` for an
    /// asynchronous one) on the returned task.
    fn aggregate_with<A, F>(self, seed: A, mut step: F) -> Task<A>
    where
        Self::IntoIter: Send + 'static,
        A: Send + 'static,
        F: FnMut(A, T) -> A + Send + 'static,
    {
        let tasks = self.into_iter();
        Task::from_future(async move {
            let mut acc = seed;
            for task in tasks {
                let value = task.await?;
                acc = step(acc, value);
            }
            Ok(acc)
        })
    }

    /// Seeded left fold with an asynchronous step.
    fn aggregate_with_async<A, F>(self, seed: A, mut step: F) -> Task<A>
    where
        Self::IntoIter: Send + 'static,
        A: Send + 'static,
        F: FnMut(A, T) -> Task<A> + Send + 'static,
    {
        let tasks = self.into_iter();
        Task::from_future(async move {
            let mut acc = seed;
            for task in tasks {
                let value = task.await?;
                acc = step(acc, value).await?;
            }
            Ok(acc)
        })
    }

    /// `true` if every element satisfies `predicate`; `true` for an empty
    /// sequence.
    ///
    /// Sequential and short-circuiting: the first mismatch returns `false`
    /// without awaiting the remaining tasks.
    fn all<F>(self, mut predicate: F) -> Task<bool>
    where
        Self::IntoIter: Send + 'static,
        F: FnMut(&T) -> bool + Send + 'static,
    {
        let tasks = self.into_iter();
        Task::from_future(async move {
            for task in tasks {
                let value = task.await?;
                if !predicate(&value) {
                    return Ok(false);
                }
            }
            Ok(true)
        })
    }

    /// [`TaskIterExt::all`] with an asynchronous predicate.
    fn all_async<F>(self, mut predicate: F) -> Task<bool>
    where
        Self::IntoIter: Send + 'static,
        F: FnMut(&T) -> Task<bool> + Send + 'static,
    {
        let tasks = self.into_iter();
        Task::from_future(async move {
            for task in tasks {
                let value = task.await?;
                if !predicate(&value).await? {
                    return Ok(false);
                }
            }
            Ok(true)
        })
    }

    /// `true` if any element satisfies `predicate`; `false` for an empty
    /// sequence. Sequential, short-circuits on the first match.
    fn any<F>(self, mut predicate: F) -> Task<bool>
    where
        Self::IntoIter: Send + 'static,
        F: FnMut(&T) -> bool + Send + 'static,
    {
        let tasks = self.into_iter();
        Task::from_future(async move {
            for task in tasks {
                let value = task.await?;
                if predicate(&value) {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    /// [`TaskIterExt::any`] with an asynchronous predicate.
    fn any_async<F>(self, mut predicate: F) -> Task<bool>
    where
        Self::IntoIter: Send + 'static,
        F: FnMut(&T) -> Task<bool> + Send + 'static,
    {
        let tasks = self.into_iter();
        Task::from_future(async move {
            for task in tasks {
                let value = task.await?;
                if predicate(&value).await? {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    /// Existence check: `true` iff the sequence is non-empty.
    ///
    /// Awaits exactly the first element when one exists (so its fault or
    /// cancellation still surfaces); an empty sequence resolves to `false`
    /// without awaiting anything.
    fn exists(self) -> Task<bool>
    where
        Self::IntoIter: Send + 'static,
    {
        let mut tasks = self.into_iter();
        Task::from_future(async move {
            match tasks.next() {
                Some(task) => {
                    task.await?;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    /// Replays the sequence, then yields one more task. Nothing is awaited
    /// to build the extended sequence.
    fn append(self, task: Task<T>) -> iter::Chain<Self::IntoIter, iter::Once<Task<T>>> {
        self.into_iter().chain(iter::once(task))
    }

    /// Replays the sequence, then yields `value` wrapped as an
    /// already-resolved task.
    fn append_value(self, value: T) -> iter::Chain<Self::IntoIter, iter::Once<Task<T>>> {
        self.append(Task::from_result(value))
    }

    /// Lazily lifts [`Task::map`] over every element.
    fn map_each<U, F>(self, mapper: F) -> impl Iterator<Item = Task<U>>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Clone + Send + 'static,
    {
        self.into_iter().map(move |task| task.map(mapper.clone()))
    }

    /// Lazily lifts [`Task::and_then`] over every element.
    fn then_each<U, F>(self, binder: F) -> impl Iterator<Item = Task<U>>
    where
        U: Send + 'static,
        F: FnMut(T) -> Task<U> + Clone + Send + 'static,
    {
        self.into_iter()
            .map(move |task| task.and_then(binder.clone()))
    }

    /// Lazily lifts [`Task::cast`] over every element.
    fn cast_each<U>(self) -> impl Iterator<Item = Task<U>>
    where
        T: Any,
        U: Any + Send + 'static,
    {
        self.into_iter().map(|task| task.cast::<U>())
    }

    /// Fans out every input concurrently and fans back in to a single task
    /// holding all results in input order, regardless of completion order.
    ///
    /// If any input fails, the combined task fails with the first failure
    /// **by input index** (not by completion time).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use task_helpers::{Task, TaskIterExt};
    ///
    /// # async fn example() {
    /// let tasks = vec![Task::from_result(1), Task::from_result(2)];
    /// assert_eq!(tasks.join_all().await.unwrap(), vec![1, 2]);
    /// # }
    /// ```
    fn join_all(self) -> Task<Vec<T>> {
        let tasks: Vec<Task<T>> = self.into_iter().collect();
        Task::from_future(async move {
            debug!(count = tasks.len(), "fanning in task collection");
            let outcomes = futures::future::join_all(tasks).await;
            let mut values = Vec::with_capacity(outcomes.len());
            for outcome in outcomes {
                values.push(outcome?);
            }
            Ok(values)
        })
    }
}

impl<T, I> TaskIterExt<T> for I
where
    T: Send + 'static,
    I: IntoIterator<Item = Task<T>>,
{
}

/// Lifts plain values into already-resolved tasks.
pub trait IntoTasks<T>: IntoIterator<Item = T> + Sized
where
    T: Send + 'static,
{
    /// Wraps each value in [`Task::from_result`], producing a sequence the
    /// task combinators accept.
    fn into_tasks(self) -> impl Iterator<Item = Task<T>> {
        self.into_iter().map(Task::from_result)
    }
}

impl<T, I> IntoTasks<T> for I
where
    T: Send + 'static,
    I: IntoIterator<Item = T>,
{
}

/// Typed recovery over sequences of type-erased tasks.
pub trait AnyTaskIterExt: IntoIterator<Item = AnyTask> + Sized {
    /// Lazily lifts [`AnyTask::downcast`] over every element.
    fn downcast_each<U>(self) -> impl Iterator<Item = Task<U>>
    where
        U: Any + Send + 'static,
    {
        self.into_iter().map(|task| task.downcast::<U>())
    }
}

impl<I> AnyTaskIterExt for I where I: IntoIterator<Item = AnyTask> {}

/// Lazily *blocking* view of a future-of-collection as a sequence of
/// per-element tasks.
///
/// Produced by [`Task::into_sequence`]. The first call to `next()` blocks
/// the calling thread until the underlying collection task resolves; after
/// that, every element is handed out as an already-resolved task, in the
/// collection's original order. "Lazy" here means lazily *blocking*, not
/// lazily asynchronous, so do not iterate one of these on a thread that
/// must not block. Prefer awaiting the collection task directly (or
/// [`TaskIterExt::join_all`] for the reverse bridge) when an async-friendly
/// form is needed.
///
/// If the collection task failed, iteration yields exactly one task
/// carrying that failure (fault identity preserved), then ends. The
/// sequence is single-pass.
pub struct TaskSequence<C: IntoIterator> {
    state: SequenceState<C>,
}

enum SequenceState<C: IntoIterator> {
    Waiting(Task<C>),
    Draining(C::IntoIter),
    Finished,
}

impl<C> TaskSequence<C>
where
    C: IntoIterator + Send + 'static,
    C::Item: Send + 'static,
{
    pub(crate) fn new(task: Task<C>) -> Self {
        Self {
            state: SequenceState::Waiting(task),
        }
    }
}

impl<C> Iterator for TaskSequence<C>
where
    C: IntoIterator + Send + 'static,
    C::Item: Send + 'static,
{
    type Item = Task<C::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, SequenceState::Finished) {
                SequenceState::Waiting(task) => {
                    trace!("blocking until the collection task resolves");
                    match futures::executor::block_on(task) {
                        Ok(collection) => {
                            self.state = SequenceState::Draining(collection.into_iter());
                        }
                        // One failed element stands in for the whole
                        // collection; the state stays Finished.
                        Err(failure) => return Some(Task::from_failure(failure)),
                    }
                }
                SequenceState::Draining(mut values) => {
                    let next = values.next().map(Task::from_result);
                    self.state = SequenceState::Draining(values);
                    return next;
                }
                SequenceState::Finished => return None,
            }
        }
    }
}
