//! JoinHandle abstraction for spawned background tasks.
//!
//! The stream subscription keeps the handle of its producer task so that
//! disposal can abort the producer as well as signal its token.
//!
//! # Example
//!
//! ```no_run
//! use countdown_async::JoinHandle;
//!
//! async fn example() {
//!     let pool = countdown_async::task_pool::TaskPool::new();
//!     let handle: JoinHandle<u8> = pool.spawn(async { 10 });
//!     assert_eq!(handle.await.unwrap(), 10);
//! }
//! ```

/// A handle to a spawned task that can be awaited for its result or aborted.
///
/// Currently Tokio's JoinHandle.
#[cfg(feature = "tokio")]
pub type JoinHandle<T> = tokio::task::JoinHandle<T>;
