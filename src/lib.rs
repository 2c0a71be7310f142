//! LINQ-style combinators and conversions for Tokio task pipelines.
//!
//! This crate layers sequence-query operations over futures driven by a
//! host runtime. It owns no scheduler, no event loop, and no I/O: every
//! combinator either performs a single await-and-continue step, or fans a
//! known finite set of tasks out and back in through the runtime's own
//! machinery.
//!
//! # Architecture
//!
//! - [`Task<T>`]: awaitable handle that resolves to a success value or an
//!   identity-preserving failure, plus the single-task combinators
//!   (`map`, `and_then`, `cast`, `settle_into`).
//! - [`ValueTask<T>`]: low-overhead variant that stores ready outcomes
//!   inline, with the same combinator semantics, `delay`, `when_all`, and
//!   `when_any`.
//! - [`CompletionSource<T>`]: write-once externally-resolvable slot with
//!   idempotent try-settle calls.
//! - [`TaskIterExt`]: ordered-sequence combinators (`aggregate`, `all`,
//!   `any`, `append`, `join_all`) and the bridges between
//!   future-of-collection and collection-of-futures forms.
//!
//! # Modules
//!
//! - `task`: the task handle and single-task combinators
//! - `value`: the lightweight parity layer
//! - `completion`: completion sources
//! - `seq`: sequence combinators and bridges
//! - `error`: outcome and failure types
//! - `unit`: the zero-information success marker
//!
//! # Examples
//!
//! ```rust
//! use task_helpers::{Task, TaskIterExt};
//!
//! # async fn example() {
//! let tasks = vec![
//!     Task::from_result(123),
//!     Task::from_result(456),
//!     Task::from_result(789),
//! ];
//! let total = tasks.aggregate_with(100, |acc, v| acc + v).await.unwrap();
//! assert_eq!(total, 1468);
//! # }
//! ```

pub mod completion;
pub mod error;
pub mod seq;
pub mod task;
pub mod unit;
pub mod value;

pub use completion::CompletionSource;
pub use error::{AggregateError, AnyValue, CastError, Failure, FaultObject, Outcome, SelectError};
pub use seq::{AnyTaskIterExt, IntoTasks, TaskIterExt, TaskSequence};
pub use task::{AnyTask, Task};
pub use unit::Unit;
pub use value::ValueTask;
