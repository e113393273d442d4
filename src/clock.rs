use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::runtime::AppEvent;

/// Countdown cadence while a session is active
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Identifies one started clock; ticks carry it so stale ones can be told apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockId(u64);

impl ClockId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Handle to a repeating callback
pub trait ScheduledTask: std::fmt::Debug {
    fn cancel(&mut self);
}

/// Something that can run a repeating callback tagged with a clock id
pub trait Scheduler {
    type Task: ScheduledTask;

    fn schedule_repeating(&mut self, every: Duration, clock: ClockId) -> Self::Task;
}

/// The one repeating tick of a session. At most one task is live at a time.
#[derive(Debug)]
pub struct SessionClock<S: Scheduler> {
    scheduler: S,
    interval: Duration,
    live: Option<(ClockId, S::Task)>,
    next_id: u64,
}

impl<S: Scheduler> SessionClock<S> {
    pub fn new(scheduler: S) -> Self {
        Self::with_interval(scheduler, TICK_INTERVAL)
    }

    pub fn with_interval(scheduler: S, interval: Duration) -> Self {
        Self {
            scheduler,
            interval,
            live: None,
            next_id: 0,
        }
    }

    /// Cancels the previous clock, if any, before scheduling a new one.
    pub fn start(&mut self) -> ClockId {
        self.cancel();
        self.next_id += 1;
        let id = ClockId(self.next_id);
        let task = self.scheduler.schedule_repeating(self.interval, id);
        self.live = Some((id, task));
        debug!(clock = id.get(), "clock started");
        id
    }

    /// Returns whether a live clock was cancelled. Repeated calls are no-ops.
    pub fn cancel(&mut self) -> bool {
        match self.live.take() {
            Some((id, mut task)) => {
                task.cancel();
                debug!(clock = id.get(), "clock cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_current(&self, id: ClockId) -> bool {
        matches!(self.live, Some((live, _)) if live == id)
    }

    pub fn is_running(&self) -> bool {
        self.live.is_some()
    }
}

impl<S: Scheduler> Drop for SessionClock<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Sends `AppEvent::Tick` down the app's event channel from a helper thread
#[derive(Debug, Clone)]
pub struct ThreadScheduler {
    tx: Sender<AppEvent>,
}

impl ThreadScheduler {
    pub fn new(tx: Sender<AppEvent>) -> Self {
        Self { tx }
    }
}

#[derive(Debug)]
pub struct ThreadTask {
    cancelled: Arc<AtomicBool>,
}

impl ScheduledTask for ThreadTask {
    fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Scheduler for ThreadScheduler {
    type Task = ThreadTask;

    fn schedule_repeating(&mut self, every: Duration, clock: ClockId) -> ThreadTask {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let tx = self.tx.clone();

        thread::spawn(move || loop {
            thread::sleep(every);
            if flag.load(Ordering::SeqCst) {
                break;
            }
            if tx.send(AppEvent::Tick(clock)).is_err() {
                break;
            }
        });

        ThreadTask { cancelled }
    }
}

#[derive(Debug, Default)]
struct ManualLog {
    scheduled: Vec<ClockId>,
    cancelled: Vec<ClockId>,
}

/// Scheduler that never fires on its own; tests drive ticks by hand and
/// inspect what was scheduled and cancelled.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    log: Rc<RefCell<ManualLog>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> Vec<ClockId> {
        self.log.borrow().scheduled.clone()
    }

    pub fn cancelled(&self) -> Vec<ClockId> {
        self.log.borrow().cancelled.clone()
    }

    /// Clocks scheduled and not yet cancelled
    pub fn live(&self) -> Vec<ClockId> {
        let log = self.log.borrow();
        log.scheduled
            .iter()
            .copied()
            .filter(|id| !log.cancelled.contains(id))
            .collect()
    }
}

#[derive(Debug)]
pub struct ManualTask {
    id: ClockId,
    log: Rc<RefCell<ManualLog>>,
}

impl ScheduledTask for ManualTask {
    fn cancel(&mut self) {
        self.log.borrow_mut().cancelled.push(self.id);
    }
}

impl Scheduler for ManualScheduler {
    type Task = ManualTask;

    fn schedule_repeating(&mut self, _every: Duration, clock: ClockId) -> ManualTask {
        self.log.borrow_mut().scheduled.push(clock);
        ManualTask {
            id: clock,
            log: Rc::clone(&self.log),
        }
    }
}
