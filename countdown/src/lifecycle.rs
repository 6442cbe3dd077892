//! The owner of up to four concurrent runs, one per strategy.

use super::*;
use countdown_async::sync::spin::Mutex;

/// Holds one run slot per [`StrategyKind`] plus the scope every run is
/// started in.
///
/// Starting a run in an occupied slot cancels the previous run first, so a
/// slot never drives two runs at once. [`teardown`](Self::teardown) cancels
/// every slot and the scope itself; afterwards each new start yields a run
/// that is already `Cancelled`. Dropping the owner tears it down.
///
/// The delivery context and background scheduler may be shared with other
/// owners, so they are only stopped by [`shutdown`](Self::shutdown).
pub struct LifecycleOwner {
    scope: CancellationToken,
    slots: [Mutex<Option<CountdownHandle>>; 4],
    interval: Duration,
    delivery: DeliveryContext,
    scheduler: Arc<BackgroundScheduler>,
    blocking_worker: BlockingWorker,
    deferred_callback_queue: DeferredCallbackQueue,
    push_stream: PushStream,
    cooperative_task: CooperativeTask,
}

impl LifecycleOwner {
    pub fn new(delivery: DeliveryContext, scheduler: Arc<BackgroundScheduler>) -> Self {
        Self {
            scope: CancellationToken::new(),
            slots: Default::default(),
            interval: TICK_INTERVAL,
            blocking_worker: BlockingWorker::new(delivery.clone()),
            deferred_callback_queue: DeferredCallbackQueue::new(delivery.clone()),
            push_stream: PushStream::new(delivery.clone(), scheduler.clone()),
            cooperative_task: CooperativeTask::new(delivery.clone(), scheduler.clone()),
            delivery,
            scheduler,
        }
    }

    /// Starts a delivery thread and a background scheduler of its own.
    pub fn from_config(config: &config::Config) -> Result<Self> {
        let delivery = DeliveryContext::spawn(config.delivery_thread.clone())?;
        let scheduler = match BackgroundScheduler::new(config.background_threads) {
            Ok(scheduler) => Arc::new(scheduler),
            Err(e) => {
                delivery.join();
                return Err(e);
            }
        };

        let mut owner = Self::new(delivery, scheduler).with_interval(config.interval);
        owner.blocking_worker =
            BlockingWorker::new(owner.delivery.clone()).with_thread_name(config.worker_thread.clone());
        Ok(owner)
    }

    /// Spaces the ticks of runs started from now on `interval` apart.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn delivery(&self) -> &DeliveryContext {
        &self.delivery
    }

    pub fn scheduler(&self) -> &Arc<BackgroundScheduler> {
        &self.scheduler
    }

    pub fn strategy(&self, kind: StrategyKind) -> &dyn ExecutionStrategy {
        match kind {
            StrategyKind::BlockingWorker => &self.blocking_worker,
            StrategyKind::DeferredCallbackQueue => &self.deferred_callback_queue,
            StrategyKind::PushStream => &self.push_stream,
            StrategyKind::CooperativeTask => &self.cooperative_task,
        }
    }

    /// The run currently held in the slot for `kind`, finished or not.
    pub fn handle(&self, kind: StrategyKind) -> Option<CountdownHandle> {
        self.slots[kind.index()].lock().clone()
    }

    /// True while any slot holds a run that has not finished.
    pub fn is_busy(&self) -> bool {
        StrategyKind::ALL
            .into_iter()
            .filter_map(|kind| self.handle(kind))
            .any(|handle| !handle.is_finished())
    }

    pub fn is_torn_down(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Starts a run of `kind` writing to `sink`, replacing the slot's
    /// previous run.
    ///
    /// Never fails and never waits for a tick. May be called from any thread,
    /// including the delivery context.
    pub fn start(&self, kind: StrategyKind, sink: Arc<dyn DeliverySink>) -> CountdownHandle {
        let slot = &self.slots[kind.index()];

        // Teardowns run outside the slot lock
        if let Some(previous) = slot.take() {
            debug!("Countdown {} replaced ({kind})", previous.id());
            previous.cancel();
        }

        let handle = CountdownTask::new(sink, &self.scope)
            .with_interval(self.interval)
            .start(self.strategy(kind));

        // A concurrent start on the same slot loses its run
        if let Some(displaced) = slot.replace(handle.clone()) {
            debug!("Countdown {} displaced ({kind})", displaced.id());
            displaced.cancel();
        }
        handle
    }

    pub fn start_blocking_worker(&self, sink: Arc<dyn DeliverySink>) -> CountdownHandle {
        self.start(StrategyKind::BlockingWorker, sink)
    }

    pub fn start_deferred_callback_queue(&self, sink: Arc<dyn DeliverySink>) -> CountdownHandle {
        self.start(StrategyKind::DeferredCallbackQueue, sink)
    }

    pub fn start_push_stream(&self, sink: Arc<dyn DeliverySink>) -> CountdownHandle {
        self.start(StrategyKind::PushStream, sink)
    }

    pub fn start_cooperative_task(&self, sink: Arc<dyn DeliverySink>) -> CountdownHandle {
        self.start(StrategyKind::CooperativeTask, sink)
    }

    /// Cancels every slot and the scope. Idempotent, never fails.
    pub fn teardown(&self) {
        if !self.scope.is_cancelled() {
            debug!("Lifecycle owner tearing down");
        }
        for slot in &self.slots {
            if let Some(handle) = slot.take() {
                handle.cancel();
            }
        }
        self.scope.cancel();
    }

    /// Tears down, then stops the background scheduler and the delivery
    /// thread, waiting for the latter to exit.
    pub fn shutdown(&self) {
        self.teardown();
        self.scheduler.shutdown();
        self.delivery.join();
    }
}

impl Drop for LifecycleOwner {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl core::fmt::Debug for LifecycleOwner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LifecycleOwner")
            .field("torn_down", &self.is_torn_down())
            .field("delivery", &self.delivery)
            .field("interval", &self.interval)
            .finish()
    }
}
