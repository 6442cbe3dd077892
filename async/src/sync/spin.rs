//! Spinlock-based mutex for O(1) critical sections.
//!
//! Countdown code only ever holds these locks to take, replace or inspect a
//! handle. Use them only when:
//!
//! - All operations are O(1) (take/replace an `Option`, read a field)
//! - No blocking, thread spawning or syscalls happen while holding the lock
//! - The lock is released before any await point
//! - No nested lock acquisition
//!
//! Cancelling a run that was taken out of a slot, or starting a new one, is
//! done after the guard is dropped.
//!
//! # Example
//!
//! ```
//! use countdown_async::sync::spin::Mutex;
//!
//! let slot: Mutex<Option<u8>> = Mutex::new(None);
//!
//! let previous = slot.lock().replace(10);
//! assert_eq!(previous, None);
//! assert_eq!(slot.lock().take(), Some(10));
//! ```

// Re-export guard type from spin crate
pub use spin::MutexGuard;

/// A spinlock-based mutex for O(1) operations.
#[derive(Debug, Default)]
pub struct Mutex<T>(spin::Mutex<T>);

impl<T> Mutex<T> {
    /// Creates a new mutex wrapping `value`.
    #[inline]
    pub const fn new(value: T) -> Self {
        Self(spin::Mutex::new(value))
    }

    /// Acquires the lock, spinning until it is available.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock()
    }
}

impl<T> Mutex<Option<T>> {
    /// Takes the value out of the slot, leaving `None`.
    #[inline]
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    /// Puts `value` in the slot, returning whatever it displaced.
    #[inline]
    pub fn replace(&self, value: T) -> Option<T> {
        self.lock().replace(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutex_basic() {
        let mutex = Mutex::new(10u8);
        assert_eq!(*mutex.lock(), 10);
        *mutex.lock() = 9;
        assert_eq!(*mutex.lock(), 9);
    }

    #[test]
    fn slot_take_and_replace() {
        let slot: Mutex<Option<&str>> = Mutex::new(None);

        assert_eq!(slot.replace("first"), None);
        assert_eq!(slot.replace("second"), Some("first"));
        assert_eq!(slot.take(), Some("second"));
        assert_eq!(slot.take(), None);
    }
}
