use super::*;
use countdown_async::{JoinHandle, sync::spin::Mutex};
use futures::{FutureExt, Stream, StreamExt};
use std::panic::AssertUnwindSafe;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::IntervalStream;

/// A finite stream yielding `start, start + 1, ...`, `count` values in all.
///
/// The first value arrives after `initial_delay`, the rest `period` apart.
/// Late values are spaced out again rather than delivered in a burst.
///
/// Must be called within a tokio runtime with timers enabled, and panics if
/// `period` is zero.
pub fn interval_range(
    start: u64,
    count: u64,
    initial_delay: Duration,
    period: Duration,
) -> impl Stream<Item = u64> + Send + 'static {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + initial_delay, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    IntervalStream::new(interval)
        .take(usize::try_from(count).unwrap_or(usize::MAX))
        .enumerate()
        .map(move |(i, _)| start + i as u64)
}

/// Drives a run as a push stream: a producer on the background scheduler
/// emits the countdown values, and the observer callbacks run on the
/// delivery context.
///
/// The stream is the only strategy with an error channel. If the producer
/// cannot be scheduled, or its timer fails, the sink receives
/// [`on_error`](DeliverySink::on_error) and nothing afterwards. Completion
/// follows the last tick immediately.
///
/// Cancelling disposes the run's [`Subscription`].
pub struct PushStream {
    delivery: DeliveryContext,
    scheduler: Arc<BackgroundScheduler>,
}

impl PushStream {
    pub fn new(delivery: DeliveryContext, scheduler: Arc<BackgroundScheduler>) -> Self {
        Self {
            delivery,
            scheduler,
        }
    }

    /// Subscribes the sink of a `Running` task to a new countdown stream.
    ///
    /// Scheduling failures are reported to the sink, not to the caller.
    pub fn subscribe(&self, task: Arc<CountdownTask>) -> Subscription {
        let id = task.id();
        let cancel_token = task.cancel_token().clone();
        let producer = AssertUnwindSafe(produce(
            task.clone(),
            self.delivery.clone(),
            self.scheduler.cancel_token().clone(),
        ))
        .catch_unwind();

        // Dropped with the producer if it never runs to its end
        let guard = RunGuard::reporting(task.clone(), self.delivery.clone());
        let delivery = self.delivery.clone();
        let spawned = countdown_async::spawn!(self.scheduler, "push_stream", (run = id), async move {
            if let Err(panic) = producer.await {
                let error = Error::Scheduling(crate::delivery::panic_message(&*panic).to_string());
                report(&task, &delivery, error);
            }
            guard.disarm();
        });
        let join = match spawned {
            Ok(join) => Some(join),
            Err(e) => {
                debug!("Countdown {id} stream not scheduled: {e}");
                None
            }
        };

        Subscription {
            cancel_token,
            join: Mutex::new(join),
        }
    }
}

/// Emits the run's ticks to the delivery context until the stream ends or
/// the run is cancelled.
async fn produce(task: Arc<CountdownTask>, delivery: DeliveryContext, shutdown: CancellationToken) {
    let cancel_token = task.cancel_token().clone();
    let ticks = interval_range(0, Tick::COUNT as u64, Duration::ZERO, task.interval())
        .filter_map(|index| futures::future::ready(Tick::from_index(index)));
    tokio::pin!(ticks);

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                trace!("Countdown {} stream disposed", task.id());
                return;
            }
            _ = shutdown.cancelled() => {
                report(&task, &delivery, Error::SchedulerUnavailable);
                return;
            }
            next = ticks.next() => next,
        };

        let t = task.clone();
        let posted = match next {
            Some(tick) => delivery.post(&cancel_token, move || {
                t.deliver(tick);
            }),
            None => delivery.post(&cancel_token, move || {
                t.complete();
            }),
        };

        if let Err(e) = posted {
            debug!("Countdown {} stream stopped: {e}", task.id());
            task.abort();
            return;
        }
        if next.is_none() {
            return;
        }
    }
}

/// The disposable link between a stream producer and its observer.
pub struct Subscription {
    cancel_token: CancellationToken,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Subscription {
    /// Stops the producer. Values already handed to the delivery context are
    /// dropped there. Idempotent.
    pub fn dispose(&self) {
        self.cancel_token.cancel();
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}

impl ExecutionStrategy for PushStream {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PushStream
    }

    fn launch(&self, task: Arc<CountdownTask>) -> Result<Box<dyn Teardown>> {
        let subscription = self.subscribe(task);
        Ok(Box::new(move || subscription.dispose()))
    }
}
