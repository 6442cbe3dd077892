//! Interruptible blocking sleep for dedicated OS threads.
//!
//! A thread that blocks in [`Interrupt::sleep`] is fully occupied: it cannot
//! service anything else until the sleep ends. What it *can* do is be woken
//! early. [`Interrupt::interrupt`] sets the shared cancellation token and
//! unparks the thread, and the sleep returns [`Interrupted`].
//!
//! The interrupt is sticky: once raised, every later `sleep` on the same
//! `Interrupt` returns `Err(Interrupted)` immediately, so a worker loop that
//! checks the result at each tick boundary cannot miss it.
//!
//! # Example
//!
//! ```no_run
//! use countdown_async::{CancellationToken, Interrupt};
//! use std::time::Duration;
//!
//! let cancel = CancellationToken::new();
//! let worker = std::thread::spawn({
//!     let cancel = cancel.clone();
//!     move || {
//!         let interrupt = Interrupt::current(cancel);
//!         while interrupt.sleep(Duration::from_secs(1)).is_ok() {}
//!     }
//! });
//!
//! Interrupt::new(cancel, worker.thread().clone()).interrupt();
//! worker.join().unwrap();
//! ```

use std::time::{Duration, Instant};

/// Returned by [`Interrupt::sleep`] when the sleeping thread was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl core::fmt::Display for Interrupted {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("sleep interrupted")
    }
}

impl std::error::Error for Interrupted {}

/// Interrupt signal bound to a single OS thread.
#[derive(Debug, Clone)]
pub struct Interrupt {
    cancel_token: crate::CancellationToken,
    thread: std::thread::Thread,
}

impl Interrupt {
    /// Binds `cancel_token` to `thread`.
    pub fn new(cancel_token: crate::CancellationToken, thread: std::thread::Thread) -> Self {
        Self {
            cancel_token,
            thread,
        }
    }

    /// Binds `cancel_token` to the calling thread.
    pub fn current(cancel_token: crate::CancellationToken) -> Self {
        Self::new(cancel_token, std::thread::current())
    }

    /// Raises the interrupt and wakes the bound thread. Idempotent.
    pub fn interrupt(&self) {
        self.cancel_token.cancel();
        self.thread.unpark();
    }

    /// True once the interrupt has been raised, directly or through a
    /// cancelled parent token.
    pub fn is_interrupted(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Blocks the calling thread for `duration` or until interrupted.
    ///
    /// Must be called on the bound thread, otherwise an interrupt only takes
    /// effect when the deadline passes. Spurious wake-ups are absorbed.
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        debug_assert_eq!(
            std::thread::current().id(),
            self.thread.id(),
            "Interrupt::sleep called off the bound thread"
        );

        let deadline = Instant::now() + duration;
        loop {
            if self.is_interrupted() {
                return Err(Interrupted);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::park_timeout(deadline - now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CancellationToken;

    #[test]
    fn uninterrupted_sleep_runs_full_duration() {
        let interrupt = Interrupt::current(CancellationToken::new());
        let start = Instant::now();

        assert_eq!(interrupt.sleep(Duration::from_millis(30)), Ok(()));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn interrupt_wakes_sleeping_thread() {
        let cancel = CancellationToken::new();
        let worker = std::thread::spawn({
            let cancel = cancel.clone();
            move || {
                let start = Instant::now();
                let r = Interrupt::current(cancel).sleep(Duration::from_secs(30));
                (r, start.elapsed())
            }
        });

        std::thread::sleep(Duration::from_millis(20));
        let interrupt = Interrupt::new(cancel, worker.thread().clone());
        interrupt.interrupt();
        interrupt.interrupt();

        let (r, elapsed) = worker.join().unwrap();
        assert_eq!(r, Err(Interrupted));
        assert!(elapsed < Duration::from_secs(30));
    }

    #[test]
    fn interrupt_is_sticky() {
        let interrupt = Interrupt::current(CancellationToken::new());
        interrupt.interrupt();

        assert!(interrupt.is_interrupted());
        assert_eq!(interrupt.sleep(Duration::from_secs(30)), Err(Interrupted));
        assert_eq!(interrupt.sleep(Duration::ZERO), Err(Interrupted));
    }

    #[test]
    fn parent_cancellation_interrupts_at_next_sleep() {
        let parent = CancellationToken::new();
        let interrupt = Interrupt::current(parent.child_token());

        parent.cancel();
        assert_eq!(interrupt.sleep(Duration::from_secs(30)), Err(Interrupted));
    }
}
