//! Clocks and periodic task scheduling.
//!
//! The encounter never sleeps on its own. A host hands it a [`Scheduler`] that
//! calls the tick closure on a fixed interval, and a [`Clock`] the monitor reads
//! for elapsed time. [`ManualScheduler`] drives everything from tests and the
//! simulation harness; with the `async` feature, [`LocalIntervalScheduler`]
//! drives it from a tokio `LocalSet`.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since the clock's own origin.
    fn now(&self) -> Duration;
}

/// Wall-clock time measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Shared, hand-advanced clock. Clones observe the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get().saturating_add(by));
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Returned by a periodic task to keep or drop its schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

pub type PeriodicTask = Box<dyn FnMut() -> TickControl>;

/// Cancellation flag shared between a scheduled task and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Rc<Cell<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Runs a task repeatedly until it returns [`TickControl::Stop`] or its
/// handle is cancelled. The first run happens one `interval` after scheduling.
pub trait Scheduler {
    fn schedule_periodic(&mut self, interval: Duration, task: PeriodicTask) -> CancelHandle;
}

struct ScheduledTask {
    interval: Duration,
    next_due: Duration,
    order: u64,
    handle: CancelHandle,
    task: PeriodicTask,
}

/// Deterministic scheduler driven by [`ManualScheduler::advance`].
pub struct ManualScheduler {
    clock: ManualClock,
    tasks: Vec<ScheduledTask>,
    scheduled: u64,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(ManualClock::new())
    }

    #[must_use]
    pub const fn with_clock(clock: ManualClock) -> Self {
        Self {
            clock,
            tasks: Vec::new(),
            scheduled: 0,
        }
    }

    /// Clock shared with every task this scheduler runs.
    #[must_use]
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Tasks that are neither stopped nor cancelled.
    #[must_use]
    pub fn active_tasks(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| !t.handle.is_cancelled())
            .count()
    }

    /// Move time forward by `by`, running every due task in time order.
    /// Returns how many task invocations happened.
    pub fn advance(&mut self, by: Duration) -> usize {
        let target = self.clock.now().saturating_add(by);
        let mut runs = 0;
        loop {
            self.tasks.retain(|t| !t.handle.is_cancelled());
            let next = self
                .tasks
                .iter()
                .enumerate()
                .filter(|(_, t)| t.next_due <= target)
                .min_by_key(|(_, t)| (t.next_due, t.order))
                .map(|(idx, _)| idx);
            let Some(idx) = next else {
                break;
            };
            let entry = &mut self.tasks[idx];
            self.clock.set(entry.next_due);
            let control = (entry.task)();
            runs += 1;
            entry.next_due = entry.next_due.saturating_add(entry.interval);
            if control == TickControl::Stop {
                entry.handle.cancel();
            }
        }
        self.clock.set(target);
        runs
    }

    /// Advance one interval at a time until no task remains or `limit` passes.
    pub fn run_until_idle(&mut self, step: Duration, limit: Duration) -> usize {
        let deadline = self.clock.now().saturating_add(limit);
        let mut runs = 0;
        while self.active_tasks() > 0 && self.clock.now() < deadline {
            runs += self.advance(step);
        }
        runs
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_periodic(&mut self, interval: Duration, task: PeriodicTask) -> CancelHandle {
        let interval = interval.max(Duration::from_millis(1));
        let handle = CancelHandle::default();
        self.tasks.push(ScheduledTask {
            interval,
            next_due: self.clock.now().saturating_add(interval),
            order: self.scheduled,
            handle: handle.clone(),
            task,
        });
        self.scheduled += 1;
        handle
    }
}

#[cfg(feature = "async")]
pub use self::tokio_support::{LocalIntervalScheduler, TokioClock};

#[cfg(feature = "async")]
mod tokio_support {
    use super::{CancelHandle, Clock, PeriodicTask, Scheduler, TickControl};
    use std::time::Duration;
    use tokio::time::{self, Instant, MissedTickBehavior};

    /// Spawns each task onto the current `LocalSet`.
    ///
    /// Must be used from inside `LocalSet::run_until` (or a task spawned on
    /// one); `spawn_local` panics otherwise.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct LocalIntervalScheduler;

    impl Scheduler for LocalIntervalScheduler {
        fn schedule_periodic(&mut self, interval: Duration, mut task: PeriodicTask) -> CancelHandle {
            let interval = interval.max(Duration::from_millis(1));
            let handle = CancelHandle::default();
            let watch = handle.clone();
            tokio::task::spawn_local(async move {
                let mut ticker = time::interval_at(Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if watch.is_cancelled() {
                        break;
                    }
                    if task() == TickControl::Stop {
                        watch.cancel();
                        break;
                    }
                }
            });
            handle
        }
    }

    /// Clock backed by tokio's (pausable) time source.
    #[derive(Debug, Clone, Copy)]
    pub struct TokioClock {
        origin: Instant,
    }

    impl TokioClock {
        #[must_use]
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
            }
        }
    }

    impl Default for TokioClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for TokioClock {
        fn now(&self) -> Duration {
            self.origin.elapsed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn counter() -> (Rc<Cell<u32>>, PeriodicTask) {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let task: PeriodicTask = Box::new(move || {
            seen.set(seen.get() + 1);
            TickControl::Continue
        });
        (count, task)
    }

    #[test]
    fn first_run_waits_one_interval() {
        let mut scheduler = ManualScheduler::new();
        let (count, task) = counter();
        scheduler.schedule_periodic(Duration::from_secs(1), task);
        scheduler.advance(Duration::from_millis(999));
        assert_eq!(count.get(), 0);
        scheduler.advance(Duration::from_millis(1));
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.advance(Duration::from_secs(5)), 5);
        assert_eq!(count.get(), 6);
        assert_eq!(scheduler.now(), Duration::from_secs(6));
    }

    #[test]
    fn clock_reads_due_time_inside_task() {
        let mut scheduler = ManualScheduler::new();
        let clock = scheduler.clock();
        let stamps = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&stamps);
        scheduler.schedule_periodic(
            Duration::from_secs(2),
            Box::new(move || {
                sink.borrow_mut().push(clock.now().as_secs());
                TickControl::Continue
            }),
        );
        scheduler.advance(Duration::from_secs(7));
        assert_eq!(*stamps.borrow(), vec![2, 4, 6]);
    }

    #[test]
    fn stop_and_cancel_drop_the_task() {
        let mut scheduler = ManualScheduler::new();
        let runs = Rc::new(Cell::new(0));
        let seen = Rc::clone(&runs);
        let stopping = scheduler.schedule_periodic(
            Duration::from_secs(1),
            Box::new(move || {
                seen.set(seen.get() + 1);
                if seen.get() == 3 {
                    TickControl::Stop
                } else {
                    TickControl::Continue
                }
            }),
        );
        let (count, task) = counter();
        let cancelled = scheduler.schedule_periodic(Duration::from_secs(1), task);
        scheduler.advance(Duration::from_secs(2));
        cancelled.cancel();
        scheduler.advance(Duration::from_secs(10));
        assert_eq!(runs.get(), 3);
        assert!(stopping.is_cancelled());
        assert_eq!(count.get(), 2);
        assert_eq!(scheduler.active_tasks(), 0);
    }

    #[test]
    fn run_until_idle_respects_limit() {
        let mut scheduler = ManualScheduler::new();
        let (count, task) = counter();
        scheduler.schedule_periodic(Duration::from_secs(1), task);
        scheduler.run_until_idle(Duration::from_secs(1), Duration::from_secs(30));
        assert_eq!(count.get(), 30);
        assert_eq!(scheduler.active_tasks(), 1);
    }

    #[cfg(feature = "async")]
    #[tokio::test(start_paused = true)]
    async fn local_interval_scheduler_ticks_until_cancelled() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let mut scheduler = LocalIntervalScheduler;
                let (count, task) = counter();
                let handle = scheduler.schedule_periodic(Duration::from_secs(1), task);
                tokio::time::sleep(Duration::from_millis(3_500)).await;
                assert_eq!(count.get(), 3);
                handle.cancel();
                tokio::time::sleep(Duration::from_secs(5)).await;
                assert_eq!(count.get(), 3);
            })
            .await;
    }
}
