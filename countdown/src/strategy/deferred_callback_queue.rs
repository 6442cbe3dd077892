use super::*;

/// Drives a run by re-posting a callback to the delivery context's queue.
///
/// Nothing ever blocks: between ticks the callback simply is not queued yet.
/// The countdown position travels with the posted callback, so each
/// invocation sees the latest value without any shared counter.
///
/// Cancelling removes the run's pending callbacks from the queue. Because
/// the callbacks run on that same serial queue, a callback is either already
/// running (and finishes its write before the removal is observed) or never
/// runs at all.
pub struct DeferredCallbackQueue {
    delivery: DeliveryContext,
}

impl DeferredCallbackQueue {
    pub fn new(delivery: DeliveryContext) -> Self {
        Self { delivery }
    }
}

struct Callback {
    task: Arc<CountdownTask>,
    delivery: DeliveryContext,
    remaining: Option<Tick>,
}

impl Callback {
    fn post(self, delay: Duration) {
        let task = self.task.clone();
        let delivery = self.delivery.clone();
        if let Err(e) = delivery.post_delayed(task.cancel_token(), delay, move || self.run()) {
            debug!("Countdown {} callback not posted: {e}", task.id());
            task.abort();
        }
    }

    fn run(self) {
        match self.remaining {
            Some(tick) => {
                // The sink itself may have cancelled the run
                if !self.task.deliver(tick) || self.task.is_cancelled() {
                    return;
                }
                let delay = self.task.interval();
                Callback {
                    remaining: tick.next(),
                    ..self
                }
                .post(delay);
            }
            None => {
                self.task.complete();
            }
        }
    }
}

impl ExecutionStrategy for DeferredCallbackQueue {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DeferredCallbackQueue
    }

    fn launch(&self, task: Arc<CountdownTask>) -> Result<Box<dyn Teardown>> {
        let cancel_token = task.cancel_token().clone();

        // The first post failing is a launch failure, later ones end the run
        let first = Callback {
            task,
            delivery: self.delivery.clone(),
            remaining: Some(Tick::FIRST),
        };
        self.delivery
            .post(&cancel_token, move || first.run())?;

        let delivery = self.delivery.clone();
        Ok(Box::new(move || delivery.remove_callbacks(&cancel_token)))
    }
}
