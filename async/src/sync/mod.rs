//! Synchronization primitives for short, non-blocking critical sections.
//!
//! # Submodules
//!
//! - [`spin`] - Spinlock-based primitives for O(1) operations
//!
//! # Choosing the Right Primitive
//!
//! | Use Case | Primitive |
//! |----------|-----------|
//! | Swap a handle in or out of a slot | [`spin::Mutex`] |
//! | Anything that blocks, spawns or waits | do it outside the lock |

pub mod spin;
