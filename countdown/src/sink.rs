use super::*;

/// The observer side of a countdown run.
///
/// Every method is invoked on the run's [`DeliveryContext`], one call at a
/// time, never after the run was cancelled. Implementations do not need
/// their own locking against the strategy.
pub trait DeliverySink: Send + Sync {
    /// Called once per tick, in strictly decreasing order.
    fn on_tick(&self, tick: Tick);

    /// Called once after the last tick. Never follows `on_error`.
    fn on_complete(&self);

    /// Called at most once, only by strategies with an error channel. Nothing
    /// is delivered afterwards.
    fn on_error(&self, error: &Error) {
        trace!("Countdown sink ignored error: {error}");
    }
}

/// A text surface, such as a label or a terminal line.
pub trait Surface: Send + Sync {
    fn set_text(&self, text: &str);
}

impl<S: Surface + ?Sized> Surface for Arc<S> {
    fn set_text(&self, text: &str) {
        (**self).set_text(text)
    }
}

/// Renders a run onto a [`Surface`], prefixing every message with `label`.
pub struct TextSink<S> {
    label: String,
    surface: S,
}

impl<S: Surface> TextSink<S> {
    pub fn new(label: impl Into<String>, surface: S) -> Self {
        Self {
            label: label.into(),
            surface,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

impl<S: Surface> DeliverySink for TextSink<S> {
    fn on_tick(&self, tick: Tick) {
        self.surface
            .set_text(&format!("{} countdown: {tick}s", self.label));
    }

    fn on_complete(&self) {
        self.surface
            .set_text(&format!("{}: countdown complete!", self.label));
    }

    fn on_error(&self, error: &Error) {
        self.surface
            .set_text(&format!("{}: countdown failed: {error}", self.label));
    }
}
