//! Cancellation, scoping and sleep primitives for the countdown strategies.
//!
//! The countdown crate drives the same tick sequence through four very
//! different execution models. This crate collects the small primitives those
//! models share, so that each strategy only has to express *how* it advances,
//! not how cancellation is plumbed:
//!
//! - **CancellationToken**: cooperative cancellation flag, with child tokens
//! - **TaskPool**: a cancellable scope that tracks the async tasks it spawned
//! - **JoinHandle**: abstracted task handle type for runtime portability
//! - **time**: async sleeps, including a sleep that gives up on cancellation
//! - **interrupt**: an interruptible *blocking* sleep for dedicated OS threads
//!
//! # Example
//!
//! ```no_run
//! use countdown_async::{TaskPool, time};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let scope = TaskPool::new();
//! let cancel = scope.child_token();
//!
//! scope.spawn(async move {
//!     for tick in (0..=10).rev() {
//!         println!("{tick}");
//!         if !time::sleep_or_cancel(std::time::Duration::from_secs(1), &cancel).await {
//!             break;
//!         }
//!     }
//! });
//!
//! scope.shutdown().await;
//! # });
//! ```

mod spawn;

pub mod cancellation_token;
pub mod join_handle;
pub mod sync;
pub mod time;

#[cfg(feature = "tokio")]
pub mod interrupt;
#[cfg(feature = "tokio")]
pub mod task_pool;

// Re-export commonly used types at crate root
#[cfg(feature = "tokio")]
pub use cancellation_token::CancellationToken;
#[cfg(feature = "tokio")]
pub use interrupt::{Interrupt, Interrupted};
#[cfg(feature = "tokio")]
pub use join_handle::JoinHandle;
#[cfg(feature = "tokio")]
pub use task_pool::TaskPool;

/// Returns the number of available hardware threads.
///
/// Falls back to 1 when the OS cannot report it.
pub fn available_parallelism() -> core::num::NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(core::num::NonZeroUsize::MIN)
}
