//! Async sleeps used at countdown suspension points.
//!
//! # Example
//!
//! ```no_run
//! use countdown_async::{CancellationToken, time};
//! use std::time::Duration;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let cancel = CancellationToken::new();
//!
//! if time::sleep_or_cancel(Duration::from_secs(1), &cancel).await {
//!     println!("1 second has passed");
//! }
//! # });
//! ```

use std::time::Duration;

/// Sleeps for the specified duration.
///
/// A zero duration returns immediately without touching the timer driver.
#[cfg(feature = "tokio")]
pub async fn sleep(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    tokio::time::sleep(duration).await;
}

/// Sleeps for `duration` unless `cancel_token` fires first.
///
/// Returns `true` if the full duration elapsed, `false` if cancelled. An
/// already-cancelled token wins over a zero duration, so a cancelled caller
/// never gets past a suspension point.
#[cfg(feature = "tokio")]
pub async fn sleep_or_cancel(
    duration: Duration,
    cancel_token: &crate::CancellationToken,
) -> bool {
    if cancel_token.is_cancelled() {
        return false;
    }

    tokio::select! {
        biased;
        _ = cancel_token.cancelled() => false,
        () = sleep(duration) => true,
    }
}
