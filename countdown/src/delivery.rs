//! The single serial context on which sinks are written.
//!
//! A [`DeliveryContext`] is a named thread running a queue of posted work
//! items, the way a UI main loop does. Work can be posted immediately or with
//! a delay, tagged with a [`CancellationToken`] so it can be removed again,
//! executed synchronously from another thread ([`run_sync`]) or handed over
//! from async code ([`dispatch`]).
//!
//! Items run one at a time in due order; items due at the same instant run
//! in posting order. A tagged item is checked against its tag immediately
//! before it runs, so once a tag is cancelled none of its items run, whether
//! or not the purge has reached the queue yet.
//!
//! [`run_sync`]: DeliveryContext::run_sync
//! [`dispatch`]: DeliveryContext::dispatch

use super::*;
use countdown_async::sync::spin::Mutex;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::thread::ThreadId;
use std::time::Instant;

type Job = Box<dyn FnOnce() + Send>;

enum Message {
    Post {
        due: Instant,
        tag: Option<CancellationToken>,
        job: Job,
    },
    Purge,
    Quit,
}

struct Scheduled {
    due: Instant,
    seq: u64,
    tag: Option<CancellationToken>,
    job: Job,
}

impl Scheduled {
    fn is_cancelled(&self) -> bool {
        self.tag.as_ref().is_some_and(|t| t.is_cancelled())
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

struct Looper {
    rx: flume::Receiver<Message>,
    queue: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl Looper {
    fn run(mut self, name: &str) {
        debug!("Delivery context '{name}' started");

        'outer: loop {
            // Admit everything already posted before running anything, so
            // equal deadlines keep their posting order
            loop {
                match self.rx.try_recv() {
                    Ok(msg) => {
                        if !self.admit(msg) {
                            break 'outer;
                        }
                    }
                    Err(flume::TryRecvError::Empty) => break,
                    Err(flume::TryRecvError::Disconnected) => break 'outer,
                }
            }

            if let Some(job) = self.pop_due(Instant::now()) {
                if let Err(panic) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)) {
                    error!(
                        "Work item on delivery context '{name}' panicked: {}",
                        panic_message(&*panic)
                    );
                }
                continue;
            }

            let msg = match self.queue.peek().map(|Reverse(s)| s.due) {
                Some(due) => match self.rx.recv_deadline(due) {
                    Ok(msg) => msg,
                    Err(flume::RecvTimeoutError::Timeout) => continue,
                    Err(flume::RecvTimeoutError::Disconnected) => break,
                },
                None => match self.rx.recv() {
                    Ok(msg) => msg,
                    Err(_) => break,
                },
            };
            if !self.admit(msg) {
                break;
            }
        }

        if !self.queue.is_empty() {
            debug!(
                "Delivery context '{name}' dropped {} pending work items",
                self.queue.len()
            );
        }
        debug!("Delivery context '{name}' stopped");
    }

    fn admit(&mut self, msg: Message) -> bool {
        match msg {
            Message::Post { due, tag, job } => {
                let scheduled = Scheduled {
                    due,
                    seq: self.next_seq,
                    tag,
                    job,
                };
                self.next_seq += 1;
                if scheduled.is_cancelled() {
                    trace!("Dropping work item posted with a cancelled tag");
                } else {
                    self.queue.push(Reverse(scheduled));
                }
                true
            }
            Message::Purge => {
                self.queue.retain(|Reverse(s)| !s.is_cancelled());
                true
            }
            Message::Quit => false,
        }
    }

    fn pop_due(&mut self, now: Instant) -> Option<Job> {
        while self.queue.peek().is_some_and(|Reverse(s)| s.due <= now) {
            let Reverse(scheduled) = self.queue.pop()?;
            if !scheduled.is_cancelled() {
                return Some(scheduled.job);
            }
        }
        None
    }
}

pub(crate) fn panic_message(panic: &(dyn core::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

struct Inner {
    name: String,
    thread_id: ThreadId,
    // Sends happen under this lock while it reads `false`, so nothing can be
    // queued behind the final `Quit`
    closed: Mutex<bool>,
    tx: flume::Sender<Message>,
    thread: Mutex<Option<std::thread::JoinHandle<()>>>,
}

/// Cloneable handle to a delivery thread.
#[derive(Clone)]
pub struct DeliveryContext {
    inner: Arc<Inner>,
}

impl DeliveryContext {
    /// Starts a new delivery thread called `name`.
    pub fn spawn(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (tx, rx) = flume::unbounded();
        let looper = Looper {
            rx,
            queue: BinaryHeap::new(),
            next_seq: 0,
        };
        let thread = std::thread::Builder::new().name(name.clone()).spawn({
            let name = name.clone();
            move || looper.run(&name)
        })?;

        Ok(Self {
            inner: Arc::new(Inner {
                name,
                thread_id: thread.thread().id(),
                closed: Mutex::new(false),
                tx,
                thread: Mutex::new(Some(thread)),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// True when called from the delivery thread itself.
    pub fn is_current(&self) -> bool {
        std::thread::current().id() == self.inner.thread_id
    }

    /// True once [`quit`](Self::quit) has been called.
    pub fn is_closed(&self) -> bool {
        *self.inner.closed.lock()
    }

    fn send(&self, due: Instant, tag: Option<CancellationToken>, job: Job) -> Result<()> {
        let closed = self.inner.closed.lock();
        if *closed {
            return Err(Error::DeliveryClosed);
        }
        self.inner
            .tx
            .send(Message::Post { due, tag, job })
            .map_err(|_| Error::DeliveryClosed)
    }

    /// Queues `job` to run as soon as the items before it have run.
    pub fn execute<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.send(Instant::now(), None, Box::new(job))
    }

    /// Queues `job` tagged with `tag`, to run as soon as possible.
    pub fn post<F>(&self, tag: &CancellationToken, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.post_delayed(tag, Duration::ZERO, job)
    }

    /// Queues `job` tagged with `tag`, to run no earlier than `delay` from now.
    ///
    /// Fails with [`Error::Discarded`] if `tag` is already cancelled.
    pub fn post_delayed<F>(&self, tag: &CancellationToken, delay: Duration, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if tag.is_cancelled() {
            return Err(Error::Discarded);
        }
        self.send(Instant::now() + delay, Some(tag.clone()), Box::new(job))
    }

    /// Cancels `tag` and removes every pending item posted with it.
    ///
    /// Safe to call from any thread, any number of times. Items of `tag` that
    /// have not started running will never run.
    pub fn remove_callbacks(&self, tag: &CancellationToken) {
        tag.cancel();
        if !*self.inner.closed.lock() {
            let _ = self.inner.tx.send(Message::Purge);
        }
    }

    /// Runs `f` on the delivery thread and waits for its result.
    ///
    /// Runs `f` inline when already on the delivery thread.
    pub fn run_sync<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        if self.is_current() {
            return Ok(f());
        }

        let (tx, rx) = flume::bounded(1);
        self.execute(move || {
            _ = tx.send(f());
        })?;
        rx.recv().map_err(|_| Error::Discarded)
    }

    /// Hands `f` to the delivery thread and awaits its result without
    /// blocking the calling task's thread.
    pub async fn dispatch<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let (tx, rx) = flume::bounded(1);
        self.execute(move || {
            _ = tx.send(f());
        })?;
        rx.recv_async().await.map_err(|_| Error::Discarded)
    }

    /// Asks the delivery thread to stop once the current item has run.
    ///
    /// Pending items are dropped, and every later post fails with
    /// [`Error::DeliveryClosed`]. Idempotent.
    pub fn quit(&self) {
        let mut closed = self.inner.closed.lock();
        if !*closed {
            *closed = true;
            _ = self.inner.tx.send(Message::Quit);
        }
    }

    /// Quits and waits for the delivery thread to exit.
    ///
    /// Called on the delivery thread itself this only quits.
    pub fn join(&self) {
        self.quit();
        if self.is_current() {
            return;
        }
        if let Some(thread) = self.inner.thread.take()
            && thread.join().is_err()
        {
            error!("Delivery context '{}' terminated abnormally", self.inner.name);
        }
    }
}

impl core::fmt::Debug for DeliveryContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeliveryContext")
            .field("name", &self.inner.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}
