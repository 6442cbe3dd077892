use super::*;
use countdown_async::sync::spin::Mutex;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// The finest spacing the tick timers can honour.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle of a run: `Idle -> Running -> {Completed | Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskState {
    Idle = 0,
    Running = 1,
    Completed = 2,
    Cancelled = 3,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Completed,
            _ => Self::Cancelled,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// One countdown run: its sink, its cancellation token and its state.
///
/// Strategies own an `Arc<CountdownTask>` for as long as they drive it, and
/// funnel every sink write through [`deliver`](Self::deliver),
/// [`complete`](Self::complete) or [`fail`](Self::fail). Those must be called
/// on the delivery context; each re-checks the token and state right before
/// touching the sink, which is what makes a cancellation final.
pub struct CountdownTask {
    id: u64,
    sink: Arc<dyn DeliverySink>,
    cancel_token: CancellationToken,
    interval: Duration,
    state: AtomicU8,
}

impl CountdownTask {
    /// Creates an idle run writing to `sink`.
    ///
    /// The run observes a child of `cancel_token`: cancelling the run leaves
    /// the caller's token alone, cancelling the caller's token ends the run.
    pub fn new(sink: Arc<dyn DeliverySink>, cancel_token: &CancellationToken) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            sink,
            cancel_token: cancel_token.child_token(),
            interval: TICK_INTERVAL,
            state: AtomicU8::new(TaskState::Idle as u8),
        }
    }

    /// Replaces the one-second spacing between ticks, for tests and demos
    /// that cannot wait ten seconds.
    ///
    /// Intervals below [`MIN_INTERVAL`] are raised to it, a zero interval
    /// included.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    /// Launches this run under `strategy`.
    ///
    /// Never fails: if the strategy cannot launch, the run ends `Cancelled`
    /// and the returned handle reports it.
    pub fn start<S>(self, strategy: &S) -> CountdownHandle
    where
        S: ExecutionStrategy + ?Sized,
    {
        let task = Arc::new(self);
        let kind = strategy.kind();

        if task.cancel_token.is_cancelled() {
            debug!("Countdown {} ({kind}) not started, owner already cancelled", task.id);
            task.abort();
            return CountdownHandle::new(task, kind, None);
        }

        task.transition(TaskState::Idle, TaskState::Running);
        match strategy.launch(task.clone()) {
            Ok(teardown) => {
                debug!("Countdown {} started ({kind})", task.id);
                CountdownHandle::new(task, kind, Some(teardown))
            }
            Err(e) => {
                warn!("Countdown {} failed to start ({kind}): {e}", task.id);
                task.abort();
                CountdownHandle::new(task, kind, None)
            }
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// The run's state. A `Running` run whose token has been cancelled
    /// settles as `Cancelled` here, even if no strategy has looked yet.
    pub fn state(&self) -> TaskState {
        let state = TaskState::from_u8(self.state.load(Ordering::Acquire));
        if state == TaskState::Running && self.cancel_token.is_cancelled() {
            self.settle_cancelled();
            return TaskState::from_u8(self.state.load(Ordering::Acquire));
        }
        state
    }

    /// True once the run can no longer write to its sink.
    pub fn is_cancelled(&self) -> bool {
        self.state() != TaskState::Running
    }

    fn transition(&self, from: TaskState, to: TaskState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Writes `tick` to the sink unless the run has been cancelled.
    ///
    /// Returns whether the write happened. Call on the delivery context.
    pub fn deliver(&self, tick: Tick) -> bool {
        if self.is_cancelled() {
            self.settle_cancelled();
            trace!("Countdown {} dropped tick {tick}", self.id);
            return false;
        }
        trace!("Countdown {} delivering tick {tick}", self.id);
        self.sink.on_tick(tick);
        true
    }

    /// Writes the completion signal and marks the run `Completed`, unless it
    /// has been cancelled. Call on the delivery context.
    pub fn complete(&self) -> bool {
        if self.cancel_token.is_cancelled() {
            self.settle_cancelled();
            return false;
        }
        if !self.transition(TaskState::Running, TaskState::Completed) {
            return false;
        }
        debug!("Countdown {} completed", self.id);
        self.sink.on_complete();
        true
    }

    /// Ends the run and reports `error` to the sink, unless the run has
    /// already ended. Call on the delivery context.
    pub fn fail(&self, error: &Error) -> bool {
        if self.cancel_token.is_cancelled() {
            self.settle_cancelled();
            return false;
        }
        if !self.transition(TaskState::Running, TaskState::Cancelled) {
            return false;
        }
        self.cancel_token.cancel();
        warn!("Countdown {} failed: {error}", self.id);
        self.sink.on_error(error);
        true
    }

    /// Ends the run without telling the sink anything.
    pub fn abort(&self) {
        self.cancel_token.cancel();
        self.settle_cancelled();
    }

    fn settle_cancelled(&self) {
        // Completed stays Completed
        if !self.transition(TaskState::Running, TaskState::Cancelled) {
            self.transition(TaskState::Idle, TaskState::Cancelled);
        }
    }
}

impl core::fmt::Debug for CountdownTask {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CountdownTask")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("interval", &self.interval)
            .finish()
    }
}

/// The caller's owning handle to one run.
///
/// Clones refer to the same run. The strategy's teardown runs at most once,
/// on the first [`cancel`](Self::cancel).
#[derive(Clone)]
pub struct CountdownHandle {
    task: Arc<CountdownTask>,
    kind: StrategyKind,
    teardown: Arc<Mutex<Option<Box<dyn Teardown>>>>,
}

impl CountdownHandle {
    fn new(task: Arc<CountdownTask>, kind: StrategyKind, teardown: Option<Box<dyn Teardown>>) -> Self {
        Self {
            task,
            kind,
            teardown: Arc::new(Mutex::new(teardown)),
        }
    }

    pub fn id(&self) -> u64 {
        self.task.id()
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn state(&self) -> TaskState {
        self.task.state()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Requests the run to stop before its next tick.
    ///
    /// Idempotent, never fails, and a no-op once the run has completed. Does
    /// not wait for the strategy's thread or task to exit; it only guarantees
    /// that the sink sees nothing more once the request is observed.
    pub fn cancel(&self) {
        self.task.abort();
        if let Some(teardown) = self.teardown.take() {
            trace!("Countdown {} tearing down ({})", self.task.id(), self.kind);
            teardown.teardown();
        }
    }
}

impl core::fmt::Debug for CountdownHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CountdownHandle")
            .field("id", &self.id())
            .field("kind", &self.kind)
            .field("state", &self.state())
            .finish()
    }
}
