use super::*;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Name of the delivery thread.
    pub delivery_thread: String,

    /// Prefix of the names of [`BlockingWorker`] threads.
    pub worker_thread: String,

    #[cfg_attr(feature = "serde", serde(default = "default_background_threads"))]
    pub background_threads: core::num::NonZeroUsize,

    /// Spacing between ticks. Only ever shortened by tests and demos, and
    /// never below [`MIN_INTERVAL`](crate::MIN_INTERVAL).
    #[cfg_attr(feature = "serde", serde(skip))]
    pub interval: Duration,
}

fn default_background_threads() -> core::num::NonZeroUsize {
    countdown_async::available_parallelism()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delivery_thread: "countdown-delivery".to_string(),
            worker_thread: "countdown-worker".to_string(),
            background_threads: default_background_threads(),
            interval: TICK_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.delivery_thread, "countdown-delivery");
        assert_eq!(config.worker_thread, "countdown-worker");
        assert_eq!(config.interval, TICK_INTERVAL);
    }
}
