//! Write-once, externally-resolvable completion sources.

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{Failure, FaultObject, Outcome};
use crate::task::Task;

/// A write-once slot backing a [`Task`].
///
/// Created together with the task it resolves via [`CompletionSource::new`].
/// The first settle call wins; later attempts return `false` and are
/// silently ignored, which makes the source safe to hand to multiple
/// racing settlers. This is the only piece of shared mutable state in the
/// crate.
///
/// Dropping every clone without settling resolves the backing task as
/// `Cancelled`: an abandoned source behaves like a cancelled computation.
///
/// # Examples
///
/// ```rust
/// use task_helpers::CompletionSource;
///
/// # async fn example() {
/// let (source, task) = CompletionSource::new();
/// assert!(source.try_resolve(7));
/// assert!(!source.try_resolve(8)); // already settled, ignored
/// assert_eq!(task.await.unwrap(), 7);
/// # }
/// ```
pub struct CompletionSource<T> {
    sender: Arc<Mutex<Option<oneshot::Sender<Outcome<T>>>>>,
}

impl<T: Send + 'static> CompletionSource<T> {
    /// Creates a source and the pending task it will resolve.
    pub fn new() -> (Self, Task<T>) {
        let (tx, rx) = oneshot::channel();
        let source = Self {
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        let task = Task::from_future(async move {
            match rx.await {
                Ok(outcome) => outcome,
                // Every source handle dropped without settling.
                Err(_) => Err(Failure::Cancelled),
            }
        });
        (source, task)
    }

    /// Resolves the backing task with `value`. Returns `false` if the
    /// source was already settled.
    pub fn try_resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Faults the backing task with the given error object, preserving its
    /// identity. Returns `false` if the source was already settled.
    pub fn try_fault(&self, error: FaultObject) -> bool {
        self.settle(Err(Failure::Faulted(error)))
    }

    /// Cancels the backing task. Returns `false` if the source was already
    /// settled.
    pub fn try_cancel(&self) -> bool {
        self.settle(Err(Failure::Cancelled))
    }

    /// Returns `true` once any settle call has succeeded.
    pub fn is_settled(&self) -> bool {
        self.sender.lock().unwrap().is_none()
    }

    fn settle(&self, outcome: Outcome<T>) -> bool {
        let sender = self.sender.lock().unwrap().take();
        match sender {
            Some(tx) => {
                // The receiver may already be gone; the settle still counts.
                let _ = tx.send(outcome);
                true
            }
            None => {
                trace!("completion source already settled, ignoring");
                false
            }
        }
    }
}

impl<T> Clone for CompletionSource<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T> fmt::Debug for CompletionSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSource").finish_non_exhaustive()
    }
}
