//! CancellationToken abstraction for cooperative cancellation signalling.
//!
//! Every countdown run owns a token. The run's token is always a *child* of
//! the token its owner passed in, so that:
//!
//! - cancelling one run never disturbs its siblings, and
//! - cancelling the owner (lifecycle teardown) cancels every run at once.
//!
//! Strategies observe the token at their tick boundaries: the blocking worker
//! after waking, the deferred queue before running a posted callback, the
//! stream producer and the cooperative routine at each suspension point.
//!
//! # Example
//!
//! ```no_run
//! use countdown_async::CancellationToken;
//!
//! let owner = CancellationToken::new();
//! let run = owner.child_token();
//!
//! // Tearing down the owner reaches every run
//! owner.cancel();
//! assert!(run.is_cancelled());
//!
//! // Cancelling again is a no-op
//! owner.cancel();
//! ```

/// A token for cooperative cancellation of countdown runs.
///
/// This is a type alias over tokio-util's token. It is usable from plain OS
/// threads as well as async tasks: `cancel()` and `is_cancelled()` never
/// block, and `cancelled()` returns a future for use in `select!`.
///
/// # Key Methods
///
/// - `new()` - Create a new cancellation token
/// - `child_token()` - Create a child token that cancels when parent does
/// - `cancel()` - Signal cancellation (idempotent)
/// - `cancelled()` - Returns a future that completes when cancelled
/// - `is_cancelled()` - Check if cancellation has been requested
#[cfg(feature = "tokio")]
pub type CancellationToken = tokio_util::sync::CancellationToken;
