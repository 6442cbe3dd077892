use super::*;

mod blocking_worker;
mod cooperative_task;
mod deferred_callback_queue;
mod guard;
mod push_stream;

use guard::{RunGuard, report};

pub use blocking_worker::BlockingWorker;
pub use cooperative_task::CooperativeTask;
pub use deferred_callback_queue::DeferredCallbackQueue;
pub use push_stream::{PushStream, Subscription, interval_range};

/// The four ways of driving a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StrategyKind {
    BlockingWorker,
    DeferredCallbackQueue,
    PushStream,
    CooperativeTask,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        Self::BlockingWorker,
        Self::DeferredCallbackQueue,
        Self::PushStream,
        Self::CooperativeTask,
    ];

    /// Position of this kind in [`StrategyKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// A short human label.
    pub fn label(self) -> &'static str {
        match self {
            Self::BlockingWorker => "Thread",
            Self::DeferredCallbackQueue => "Handler",
            Self::PushStream => "Stream",
            Self::CooperativeTask => "Coroutine",
        }
    }
}

impl core::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::BlockingWorker => "blocking-worker",
            Self::DeferredCallbackQueue => "deferred-callback-queue",
            Self::PushStream => "push-stream",
            Self::CooperativeTask => "cooperative-task",
        })
    }
}

impl core::str::FromStr for StrategyKind {
    type Err = Error;

    /// Accepts the display name, the snake case name or the short label.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| {
                let name = kind.to_string();
                s == name || s == name.replace('-', "_") || s.eq_ignore_ascii_case(kind.label())
            })
            .ok_or_else(|| Error::UnknownStrategy(s.to_string()))
    }
}

/// The strategy-specific part of cancelling a run.
///
/// Run once, after the run's token has been cancelled.
pub trait Teardown: Send {
    fn teardown(self: Box<Self>);
}

impl<F: FnOnce() + Send> Teardown for F {
    fn teardown(self: Box<Self>) {
        (*self)()
    }
}

/// A way of advancing a run, delivering its ticks and cancelling it.
pub trait ExecutionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Starts driving `task`, which is already `Running`.
    ///
    /// Must return without waiting for any tick. The returned teardown is
    /// invoked when the run's handle is cancelled.
    fn launch(&self, task: Arc<CountdownTask>) -> Result<Box<dyn Teardown>>;

    /// Starts a run writing to `sink`, cancelled along with `cancel_token`.
    fn start(&self, sink: Arc<dyn DeliverySink>, cancel_token: &CancellationToken) -> CountdownHandle {
        CountdownTask::new(sink, cancel_token).start(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_index_their_slot() {
        for (i, kind) in StrategyKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn kinds_parse_from_any_name() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse::<StrategyKind>().unwrap(), kind);
            assert_eq!(kind.label().to_lowercase().parse::<StrategyKind>().unwrap(), kind);
        }
        assert_eq!(
            "push_stream".parse::<StrategyKind>().unwrap(),
            StrategyKind::PushStream
        );
        assert!(matches!(
            "fiber".parse::<StrategyKind>(),
            Err(Error::UnknownStrategy(_))
        ));
    }

    #[test]
    fn closures_are_teardowns() {
        let fired = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let teardown: Box<dyn Teardown> = Box::new({
            let fired = fired.clone();
            move || fired.store(true, std::sync::atomic::Ordering::Relaxed)
        });

        teardown.teardown();
        assert!(fired.load(std::sync::atomic::Ordering::Relaxed));
    }
}
