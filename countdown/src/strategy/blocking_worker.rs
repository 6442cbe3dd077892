use super::*;
use countdown_async::Interrupt;

/// Drives a run on a dedicated OS thread that blocks between ticks.
///
/// Each tick is marshalled onto the delivery context and waited for, then the
/// worker sleeps for one interval. The thread is fully occupied for the whole
/// run and cannot service anything else while it sleeps.
///
/// Cancelling interrupts the worker: the sleep returns early and the loop
/// exits without further ticks or completion. A marshalled write that is
/// already queued when the interrupt arrives re-checks the run on the
/// delivery context and is dropped there.
pub struct BlockingWorker {
    delivery: DeliveryContext,
    thread_name: String,
}

impl BlockingWorker {
    pub fn new(delivery: DeliveryContext) -> Self {
        Self {
            delivery,
            thread_name: "countdown-worker".to_string(),
        }
    }

    /// Names the worker threads `{prefix}-{run id}`.
    pub fn with_thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = prefix.into();
        self
    }
}

fn run(task: Arc<CountdownTask>, delivery: DeliveryContext) {
    let interrupt = Interrupt::current(task.cancel_token().clone());

    for tick in Tick::sequence() {
        if interrupt.is_interrupted() {
            break;
        }

        let t = task.clone();
        match delivery.run_sync(move || t.deliver(tick)) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                debug!("Countdown {} abandoned tick {tick}: {e}", task.id());
                task.abort();
                return;
            }
        }

        if interrupt.sleep(task.interval()).is_err() {
            debug!("Countdown {} worker interrupted after tick {tick}", task.id());
            return;
        }
    }

    if !interrupt.is_interrupted() {
        let t = task.clone();
        if let Err(e) = delivery.run_sync(move || t.complete()) {
            debug!("Countdown {} abandoned completion: {e}", task.id());
            task.abort();
        }
    }
}

impl ExecutionStrategy for BlockingWorker {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BlockingWorker
    }

    fn launch(&self, task: Arc<CountdownTask>) -> Result<Box<dyn Teardown>> {
        let cancel_token = task.cancel_token().clone();
        let worker = std::thread::Builder::new()
            .name(format!("{}-{}", self.thread_name, task.id()))
            .spawn({
                let delivery = self.delivery.clone();
                move || run(task, delivery)
            })?;

        // The worker exits by itself once interrupted, nobody joins it
        let interrupt = Interrupt::new(cancel_token, worker.thread().clone());
        Ok(Box::new(move || interrupt.interrupt()))
    }
}
