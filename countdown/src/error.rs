use thiserror::Error;

/// A specialized `Result` type for countdown operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised while scheduling or delivering a countdown.
///
/// None of these ever reach the code that started a run. Delivery errors end
/// the run quietly; scheduling errors reach the sink through
/// [`DeliverySink::on_error`](crate::DeliverySink::on_error) when the
/// strategy has an error channel, and end the run quietly otherwise.
#[derive(Debug, Error)]
pub enum Error {
    /// The delivery context has shut down and accepts no more work.
    #[error("The delivery context has shut down")]
    DeliveryClosed,

    /// A posted work item was dropped before it ran, because its tag was
    /// cancelled or the delivery context quit.
    #[error("The work item was discarded before it ran")]
    Discarded,

    /// The background scheduler has been shut down.
    #[error("The background scheduler is unavailable")]
    SchedulerUnavailable,

    /// The background timing primitive failed to produce the next tick.
    #[error("Failed to schedule the next tick: {0}")]
    Scheduling(String),

    /// A strategy name that matches no [`StrategyKind`](crate::StrategyKind).
    #[error("Unknown countdown strategy '{0}'")]
    UnknownStrategy(String),

    /// Creating a thread or runtime failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
