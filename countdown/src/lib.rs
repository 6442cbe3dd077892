//! A cancellable ten-tick countdown, driven four different ways.
//!
//! A run emits the ticks `10, 9, ..., 0` one interval apart, delivers each to
//! a [`DeliverySink`] on a single [`DeliveryContext`], then signals
//! completion. The same contract is implemented by four interchangeable
//! [`ExecutionStrategy`] types:
//!
//! - [`BlockingWorker`]: a dedicated OS thread that sleeps between ticks
//! - [`DeferredCallbackQueue`]: a callback that re-posts itself to the
//!   delivery queue with a delay
//! - [`PushStream`]: a finite interval stream observed on the delivery context
//! - [`CooperativeTask`]: one async routine that suspends between ticks
//!
//! Whatever the strategy, a cancelled run never writes to its sink again, and
//! cancelling is idempotent.

mod error;
mod task;
mod tick;

pub mod config;
pub mod delivery;
pub mod lifecycle;
pub mod scheduler;
pub mod sink;
pub mod strategy;

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

pub use countdown_async::CancellationToken;
pub use delivery::DeliveryContext;
pub use error::{Error, Result};
pub use lifecycle::LifecycleOwner;
pub use scheduler::BackgroundScheduler;
pub use sink::DeliverySink;
pub use strategy::{
    BlockingWorker, CooperativeTask, DeferredCallbackQueue, ExecutionStrategy, PushStream,
    StrategyKind, Teardown,
};
pub use task::{CountdownHandle, CountdownTask, MIN_INTERVAL, TaskState};
pub use tick::Tick;

/// The spacing between two ticks of a run.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
