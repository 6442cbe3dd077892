use super::*;

/// Routes `error` to the run's sink through the delivery context.
pub(super) fn report(task: &Arc<CountdownTask>, delivery: &DeliveryContext, error: Error) {
    let t = task.clone();
    if let Err(e) = delivery.post(task.cancel_token(), move || {
        t.fail(&error);
    }) {
        debug!("Countdown {} error not delivered: {e}", task.id());
        task.abort();
    }
}

/// Settles a run whose background future is dropped before it finishes.
///
/// Shutting the background runtime down drops spawned futures wherever they
/// are suspended, possibly before they are ever polled. The guard travels
/// inside the future, so the run still ends: reported as
/// [`Error::SchedulerUnavailable`] when the strategy has an error channel,
/// quietly `Cancelled` otherwise.
pub(super) struct RunGuard {
    task: Arc<CountdownTask>,
    report_to: Option<DeliveryContext>,
    armed: bool,
}

impl RunGuard {
    pub(super) fn aborting(task: Arc<CountdownTask>) -> Self {
        Self {
            task,
            report_to: None,
            armed: true,
        }
    }

    pub(super) fn reporting(task: Arc<CountdownTask>, delivery: DeliveryContext) -> Self {
        Self {
            task,
            report_to: Some(delivery),
            armed: true,
        }
    }

    /// The future ran to its end, the run settles itself.
    pub(super) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.armed || self.task.is_cancelled() {
            return;
        }

        debug!("Countdown {} lost its background task", self.task.id());
        match &self.report_to {
            Some(delivery) => report(&self.task, delivery, Error::SchedulerUnavailable),
            None => self.task.abort(),
        }
    }
}
