//! Cancellable scope for async countdown work.
//!
//! This module provides [`TaskPool`], which encapsulates the pattern of:
//! - Spawning tasks that observe a shared cancellation token
//! - Tracking active tasks
//! - Tearing the scope down, either synchronously (signal only) or
//!   asynchronously (signal and wait)
//!
//! A lifecycle owner keeps one pool as its scope: every run it starts gets a
//! [`child_token()`](TaskPool::child_token), and ending the owner's lifetime
//! cancels the pool, which cancels every child.
//!
//! # Pattern
//!
//! Shutdown has three phases:
//! 1. **Signal**: Cancel all tasks via the cancellation token
//! 2. **Close**: Mark the tracker closed so waiters can finish
//! 3. **Wait**: Wait until all tracked tasks complete
//!
//! [`cancel()`](TaskPool::cancel) performs the first two phases and returns
//! immediately, which is what a teardown hook running on a UI-like delivery
//! thread needs. [`shutdown()`](TaskPool::shutdown) performs all three.
//!
//! # Example
//!
//! ```no_run
//! use countdown_async::task_pool::TaskPool;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let scope = TaskPool::new();
//! let cancel = scope.child_token();
//!
//! scope.spawn(async move {
//!     loop {
//!         tokio::select! {
//!             _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => {}
//!             _ = cancel.cancelled() => break,
//!         }
//!     }
//! });
//!
//! scope.shutdown().await;
//! # });
//! ```

/// Manages a group of cancellable tasks.
///
/// `TaskPool` combines a [`tokio_util::sync::CancellationToken`] and
/// [`tokio_util::task::TaskTracker`].
///
/// # Shutdown Guarantees
///
/// When [`shutdown()`](TaskPool::shutdown) is called:
/// - All tasks are signaled to cancel via the cancellation token
/// - The tracker is closed
/// - The method waits until all spawned tasks complete
///
/// Tasks spawned after cancellation still run, but observe a cancelled token
/// from the start. Callers that must not start work in a cancelled scope
/// check [`is_cancelled()`](TaskPool::is_cancelled) first.
pub struct TaskPool {
    cancel_token: tokio_util::sync::CancellationToken,
    task_tracker: tokio_util::task::TaskTracker,
}

impl TaskPool {
    /// Creates a new task pool.
    pub fn new() -> Self {
        Self {
            cancel_token: tokio_util::sync::CancellationToken::new(),
            task_tracker: tokio_util::task::TaskTracker::new(),
        }
    }

    /// Returns a reference to the cancellation token.
    pub fn cancel_token(&self) -> &tokio_util::sync::CancellationToken {
        &self.cancel_token
    }

    /// Creates a child cancellation token for hierarchical cancellation.
    ///
    /// Child tokens can be cancelled independently without affecting the
    /// pool. When the pool is cancelled, all child tokens are cancelled too.
    pub fn child_token(&self) -> tokio_util::sync::CancellationToken {
        self.cancel_token.child_token()
    }

    /// Spawns a task on the current runtime, tracked by this pool.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context.
    pub fn spawn<F>(&self, task: F) -> crate::JoinHandle<F::Output>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.task_tracker.spawn(task)
    }

    /// Spawns a task on the runtime behind `handle`, tracked by this pool.
    ///
    /// Unlike [`spawn()`](TaskPool::spawn) this may be called from any thread,
    /// including threads that are not part of a runtime.
    pub fn spawn_on<F>(&self, task: F, handle: &tokio::runtime::Handle) -> crate::JoinHandle<F::Output>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.task_tracker.spawn_on(task, handle)
    }

    /// Signals cancellation and closes the tracker without waiting.
    ///
    /// Idempotent.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
        self.task_tracker.close();
    }

    /// Signals cancellation and waits for all tracked tasks to complete.
    pub async fn shutdown(&self) {
        self.cancel();
        self.task_tracker.wait().await;
    }

    /// Returns true if the pool has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Returns the number of tracked tasks that have not finished yet.
    pub fn active(&self) -> usize {
        self.task_tracker.len()
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new()
    }
}
