//! One-shot delayed tasks with cancellation handles
//!
//! [`ThreadScheduler`] fires tasks from a dedicated timer thread.
//! [`ManualScheduler`] keeps a virtual clock that the owner advances, for
//! hosts that pump delayed work from their own main loop.

use crate::error::ScanError;
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A unit of delayed work
pub type Task = Box<dyn FnOnce() + Send>;

/// Cancels a scheduled task; cloning shares the same task
#[derive(Debug, Clone, Default)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    /// Prevent the task from running if it has not started yet
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether [`TaskHandle::cancel`] was called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Runs tasks after a delay
pub trait Scheduler: Send + Sync {
    /// Run `task` once after `delay` unless the returned handle is cancelled
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle;
}

struct Pending<T> {
    due: T,
    seq: u64,
    task: Task,
    handle: TaskHandle,
}

impl<T: Ord> PartialEq for Pending<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl<T: Ord> Eq for Pending<T> {}

impl<T: Ord> PartialOrd for Pending<T> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for Pending<T> {
    // Reversed so the BinaryHeap pops the earliest task first.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> Pending<T> {
    fn run(self) {
        if !self.handle.is_cancelled() {
            (self.task)();
        }
    }
}

/// Scheduler backed by one timer thread
///
/// Dropping the scheduler stops the thread; tasks that have not fired yet
/// are discarded without running.
pub struct ThreadScheduler {
    next_seq: AtomicU64,
    commands: Option<Sender<Pending<Instant>>>,
    timer: Option<JoinHandle<()>>,
}

impl ThreadScheduler {
    /// Start the timer thread
    pub fn new() -> Result<Self, ScanError> {
        let (tx, rx) = unbounded::<Pending<Instant>>();
        let timer = thread::Builder::new()
            .name("scanfusion-timer".into())
            .spawn(move || {
                let mut queue: BinaryHeap<Pending<Instant>> = BinaryHeap::new();
                loop {
                    let received = match queue.peek() {
                        Some(next) => {
                            let due: Instant = next.due;
                            rx.recv_deadline(due)
                        }
                        None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                    };
                    match received {
                        Ok(pending) => queue.push(pending),
                        Err(RecvTimeoutError::Timeout) => {
                            let now = Instant::now();
                            while queue.peek().is_some_and(|p| p.due <= now) {
                                if let Some(pending) = queue.pop() {
                                    pending.run();
                                }
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        Ok(Self {
            next_seq: AtomicU64::new(0),
            commands: Some(tx),
            timer: Some(timer),
        })
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::default();
        if let Some(commands) = &self.commands {
            let pending = Pending {
                due: Instant::now() + delay,
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                task,
                handle: handle.clone(),
            };
            // A stopped timer behaves like an immediately cancelled task.
            let _ = commands.send(pending);
        }
        handle
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.commands.take();
        if let Some(timer) = self.timer.take() {
            if timer.thread().id() != thread::current().id() {
                let _ = timer.join();
            }
        }
    }
}

#[derive(Default)]
struct ManualQueue {
    now: Duration,
    next_seq: u64,
    pending: BinaryHeap<Pending<Duration>>,
}

/// Scheduler driven by an explicit virtual clock
///
/// Nothing runs until [`ManualScheduler::advance`] moves the clock past a
/// task's due time. Tasks run on the caller's thread, in due order, and may
/// schedule further tasks.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<ManualQueue>,
}

impl ManualScheduler {
    /// A scheduler whose clock starts at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of tasks waiting to run, cancelled ones excluded
    pub fn pending(&self) -> usize {
        self.lock()
            .pending
            .iter()
            .filter(|p| !p.handle.is_cancelled())
            .count()
    }

    /// Move the clock forward by `by` and run every task that became due
    ///
    /// Returns the number of tasks that ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = {
            let mut queue = self.lock();
            queue.now += by;
            queue.now
        };
        let mut ran = 0;
        loop {
            // Run outside the lock so tasks can schedule more work.
            let next = {
                let mut queue = self.lock();
                match queue.pending.peek() {
                    Some(p) if p.due <= target => queue.pending.pop(),
                    _ => None,
                }
            };
            match next {
                Some(pending) => {
                    if !pending.handle.is_cancelled() {
                        ran += 1;
                    }
                    pending.run();
                }
                None => break,
            }
        }
        ran
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::default();
        let mut queue = self.lock();
        let pending = Pending {
            due: queue.now + delay,
            seq: queue.next_seq,
            task,
            handle: handle.clone(),
        };
        queue.next_seq += 1;
        queue.pending.push(pending);
        handle
    }
}
