//! The pooled background context used by the async strategies.

use super::*;
use countdown_async::{JoinHandle, TaskPool, sync::spin::Mutex};

/// A multi-threaded tokio runtime plus the pool tracking work spawned on it.
///
/// The stream producer and the cooperative routine wait out their intervals
/// here; none of them ever blocks a runtime thread, so a small pool serves
/// any number of runs.
pub struct BackgroundScheduler {
    pool: TaskPool,
    handle: tokio::runtime::Handle,
    runtime: Mutex<Option<tokio::runtime::Runtime>>,
}

impl BackgroundScheduler {
    /// Builds a dedicated runtime with `threads` worker threads.
    pub fn new(threads: core::num::NonZeroUsize) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(threads.get())
            .thread_name("countdown-background")
            .enable_all()
            .build()?;
        debug!("Background scheduler started with {threads} threads");

        Ok(Self {
            pool: TaskPool::new(),
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
        })
    }

    /// Schedules onto an existing runtime, which the caller keeps alive.
    pub fn from_handle(handle: tokio::runtime::Handle) -> Self {
        Self {
            pool: TaskPool::new(),
            handle,
            runtime: Mutex::new(None),
        }
    }

    pub fn handle(&self) -> &tokio::runtime::Handle {
        &self.handle
    }

    /// Cancelled when the scheduler shuts down.
    pub fn cancel_token(&self) -> &CancellationToken {
        self.pool.cancel_token()
    }

    pub fn is_shut_down(&self) -> bool {
        self.pool.is_cancelled()
    }

    /// Spawns `task` on the background runtime. Callable from any thread.
    pub fn spawn<F>(&self, task: F) -> Result<JoinHandle<F::Output>>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        if self.pool.is_cancelled() {
            return Err(Error::SchedulerUnavailable);
        }
        Ok(self.pool.spawn_on(task, &self.handle))
    }

    /// Cancels all spawned work and, if the runtime is owned, shuts it down
    /// without waiting. Idempotent.
    pub fn shutdown(&self) {
        if !self.pool.is_cancelled() {
            debug!("Background scheduler shutting down");
        }
        self.pool.cancel();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Drop for BackgroundScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
