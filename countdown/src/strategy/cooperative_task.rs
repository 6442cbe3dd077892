use super::*;
use countdown_async::time::sleep_or_cancel;

/// Drives a run as one async routine on the background scheduler.
///
/// The routine reads top to bottom like the countdown itself: hop to the
/// delivery context to write a tick, suspend for an interval, repeat. While
/// suspended it holds no thread.
///
/// The routine belongs to the scope whose token the run was started with.
/// Cancelling the run, or the whole scope, cancels the routine at its next
/// suspension point. Scheduling failures end the run quietly: there is no
/// error channel to report them on. That includes the scheduler shutting
/// down under a suspended routine.
pub struct CooperativeTask {
    delivery: DeliveryContext,
    scheduler: Arc<BackgroundScheduler>,
}

impl CooperativeTask {
    pub fn new(delivery: DeliveryContext, scheduler: Arc<BackgroundScheduler>) -> Self {
        Self {
            delivery,
            scheduler,
        }
    }
}

/// The countdown routine. Returns once the run has completed or been
/// cancelled.
async fn count_down(task: Arc<CountdownTask>, delivery: DeliveryContext) {
    let cancel_token = task.cancel_token().clone();

    for tick in Tick::sequence() {
        let t = task.clone();
        let delivered = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return,
            r = delivery.dispatch(move || t.deliver(tick)) => r,
        };
        match delivered {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                debug!("Countdown {} abandoned tick {tick}: {e}", task.id());
                task.abort();
                return;
            }
        }

        if !sleep_or_cancel(task.interval(), &cancel_token).await {
            trace!("Countdown {} routine cancelled after tick {tick}", task.id());
            return;
        }
    }

    let t = task.clone();
    if let Err(e) = delivery.dispatch(move || t.complete()).await {
        debug!("Countdown {} abandoned completion: {e}", task.id());
        task.abort();
    }
}

impl ExecutionStrategy for CooperativeTask {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CooperativeTask
    }

    fn launch(&self, task: Arc<CountdownTask>) -> Result<Box<dyn Teardown>> {
        let id = task.id();
        let cancel_token = task.cancel_token().clone();
        let shutdown = self.scheduler.cancel_token().clone();
        let delivery = self.delivery.clone();

        let guard = RunGuard::aborting(task.clone());

        let join = countdown_async::spawn!(self.scheduler, "cooperative_task", (run = id), async move {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("Countdown {} routine stopped by scheduler shutdown", task.id());
                    task.abort();
                }
                _ = count_down(task.clone(), delivery) => {}
            }
            guard.disarm();
        })?;

        Ok(Box::new(move || {
            cancel_token.cancel();
            join.abort();
        }))
    }
}
