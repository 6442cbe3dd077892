#![allow(dead_code)]

use countdown::{
    CountdownHandle, DeliveryContext, DeliverySink, Error, LifecycleOwner, StrategyKind, Tick,
    config::Config,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

pub const INTERVAL: Duration = Duration::from_millis(30);

/// Long enough for any run at [`INTERVAL`] to finish.
pub const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Tick(u8),
    Complete,
    Error(String),
}

/// A sink that records everything it sees, and checks it is only ever called
/// on the delivery context, one call at a time.
pub struct Recorder {
    delivery: DeliveryContext,
    events: Mutex<Vec<(Instant, Event)>>,
    busy: AtomicBool,
    violations: AtomicUsize,
    notify: flume::Sender<Event>,
    cancel_at: Option<u8>,
    handle: OnceLock<CountdownHandle>,
}

impl Recorder {
    pub fn new(delivery: &DeliveryContext) -> (Arc<Self>, flume::Receiver<Event>) {
        Self::build(delivery, None)
    }

    /// Cancels its own run from inside `on_tick(tick)`.
    pub fn cancelling_at(delivery: &DeliveryContext, tick: u8) -> (Arc<Self>, flume::Receiver<Event>) {
        Self::build(delivery, Some(tick))
    }

    fn build(delivery: &DeliveryContext, cancel_at: Option<u8>) -> (Arc<Self>, flume::Receiver<Event>) {
        let (notify, rx) = flume::unbounded();
        let recorder = Arc::new(Self {
            delivery: delivery.clone(),
            events: Mutex::new(Vec::new()),
            busy: AtomicBool::new(false),
            violations: AtomicUsize::new(0),
            notify,
            cancel_at,
            handle: OnceLock::new(),
        });
        (recorder, rx)
    }

    /// Gives the recorder the handle of the run it observes.
    pub fn attach(&self, handle: CountdownHandle) {
        let _ = self.handle.set(handle);
    }

    pub fn events(&self) -> Vec<Event> {
        self.timeline().into_iter().map(|(_, e)| e).collect()
    }

    /// Every event with the moment the sink received it.
    pub fn timeline(&self) -> Vec<(Instant, Event)> {
        self.events.lock().unwrap().clone()
    }

    pub fn ticks(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Tick(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    /// Calls made off the delivery context, or overlapping another call.
    pub fn violations(&self) -> usize {
        self.violations.load(Ordering::SeqCst)
    }

    fn record(&self, event: Event) {
        if !self.delivery.is_current() || self.busy.swap(true, Ordering::SeqCst) {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }

        self.events.lock().unwrap().push((Instant::now(), event.clone()));
        if let Event::Tick(t) = event
            && Some(t) == self.cancel_at
            && let Some(handle) = self.handle.get()
        {
            handle.cancel();
        }
        let _ = self.notify.send(event);

        self.busy.store(false, Ordering::SeqCst);
    }
}

impl DeliverySink for Recorder {
    fn on_tick(&self, tick: Tick) {
        self.record(Event::Tick(tick.get()));
    }

    fn on_complete(&self) {
        self.record(Event::Complete);
    }

    fn on_error(&self, error: &Error) {
        self.record(Event::Error(error.to_string()));
    }
}

/// The full run: `10..=0` then completion.
pub fn full_run() -> Vec<Event> {
    (0..=10)
        .rev()
        .map(Event::Tick)
        .chain(std::iter::once(Event::Complete))
        .collect()
}

pub fn owner() -> Arc<LifecycleOwner> {
    owner_with_interval(INTERVAL)
}

pub fn owner_with_interval(interval: Duration) -> Arc<LifecycleOwner> {
    let config = Config {
        background_threads: core::num::NonZeroUsize::MIN,
        interval,
        ..Default::default()
    };
    Arc::new(LifecycleOwner::from_config(&config).unwrap())
}

/// Starts a run from the delivery context and attaches it to `recorder`
/// before any tick can be delivered.
pub fn start(owner: &Arc<LifecycleOwner>, kind: StrategyKind, recorder: &Arc<Recorder>) -> CountdownHandle {
    let o = owner.clone();
    let r = recorder.clone();
    owner
        .delivery()
        .run_sync(move || {
            let handle = o.start(kind, r.clone());
            r.attach(handle.clone());
            handle
        })
        .unwrap()
}

/// Waits for the run's final event, completion or error.
pub fn wait_for_end(rx: &flume::Receiver<Event>) -> Event {
    loop {
        match rx.recv_timeout(TIMEOUT).unwrap() {
            Event::Tick(_) => {}
            end => return end,
        }
    }
}

/// Waits for the run to deliver `tick`.
pub fn wait_for_tick(rx: &flume::Receiver<Event>, tick: u8) {
    while rx.recv_timeout(TIMEOUT).unwrap() != Event::Tick(tick) {}
}

/// Gives a cancelled run time to misbehave.
pub fn linger() {
    std::thread::sleep(INTERVAL * 5);
}
