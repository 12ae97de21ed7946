//! # Scheduler Gateway
//!
//! The engine never owns a thread. Every deferred emission is handed to a
//! [`Scheduler`] supplied by the host and runs later on the host's tick
//! thread.
//!
//! ```text
//!  dispatch ──schedule_delayed──────> ┌───────────────┐
//!  dispatch ──schedule_repeating────> │   Scheduler   │──tick──> task()
//!  orbit    ──cancel────────────────> └───────────────┘
//! ```
//!
//! [`TickScheduler`] is a complete single-threaded implementation for
//! hosts without their own task queue (and for tests).

use std::cell::{Cell, RefCell};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use crate::error::EffectResult;

/// Identifier of a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// A task that runs once.
pub type DelayedTask = Box<dyn FnOnce()>;

/// A task that runs every period until cancelled.
pub type RepeatingTask = Box<dyn FnMut()>;

/// Task submission capability provided by the host.
///
/// All methods take `&self`: tasks routinely call back into the scheduler
/// (an orbit cancels itself from inside its own tick), so implementations
/// keep their queue behind interior mutability.
pub trait Scheduler {
    /// Runs `task` once, `delay_ticks` ticks from now.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EffectError::Scheduler`] if the host refuses the task.
    fn schedule_delayed(&self, task: DelayedTask, delay_ticks: u32) -> EffectResult<TaskId>;

    /// Runs `task` after `initial_delay_ticks`, then every `period_ticks`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EffectError::Scheduler`] if the host refuses the task.
    fn schedule_repeating(
        &self,
        task: RepeatingTask,
        initial_delay_ticks: u32,
        period_ticks: u32,
    ) -> EffectResult<TaskId>;

    /// Cancels a task. Unknown or finished ids are ignored.
    fn cancel(&self, id: TaskId);
}

enum Job {
    Once(DelayedTask),
    Repeating { task: RepeatingTask, period: u32 },
}

/// Queue slot. `job` is `None` while the task is running.
struct Slot {
    job: Option<Job>,
}

/// Single-threaded tick scheduler.
///
/// A delay of 0 means "next tick", like the host scheduler. Tasks due on
/// the same tick run in submission order. Cancelling from inside a running
/// task (including the task itself) is allowed.
pub struct TickScheduler {
    /// Last tick that was run.
    current_tick: Cell<u64>,
    /// Next task id to hand out.
    next_id: Cell<u64>,
    /// Submission counter, breaks ties at equal deadlines.
    next_seq: Cell<u64>,
    /// Min-heap of (due tick, seq, id). May hold stale cancelled ids.
    queue: RefCell<BinaryHeap<Reverse<(u64, u64, TaskId)>>>,
    /// Live tasks.
    slots: RefCell<HashMap<TaskId, Slot>>,
}

impl TickScheduler {
    /// Creates an empty scheduler at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_tick: Cell::new(0),
            next_id: Cell::new(1),
            next_seq: Cell::new(0),
            queue: RefCell::new(BinaryHeap::new()),
            slots: RefCell::new(HashMap::new()),
        }
    }

    /// Last tick that ran.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.current_tick.get()
    }

    /// Number of live (not finished, not cancelled) tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Is this task still live?
    #[must_use]
    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.slots.borrow().contains_key(&id)
    }

    /// Runs `ticks` ticks. Returns the number of task runs.
    pub fn advance(&self, ticks: u32) -> usize {
        (0..ticks).map(|_| self.tick()).sum()
    }

    /// Advances one tick and runs everything due. Returns the number of task runs.
    pub fn tick(&self) -> usize {
        let now = self.current_tick.get() + 1;
        self.current_tick.set(now);

        let mut ran = 0;
        while let Some(id) = self.pop_due(now) {
            let job = match self.slots.borrow_mut().get_mut(&id) {
                Some(slot) => slot.job.take(),
                None => continue,
            };
            let Some(job) = job else { continue };
            ran += 1;

            match job {
                Job::Once(task) => {
                    task();
                    self.slots.borrow_mut().remove(&id);
                }
                Job::Repeating { mut task, period } => {
                    task();
                    let requeue = match self.slots.borrow_mut().get_mut(&id) {
                        Some(slot) => {
                            slot.job = Some(Job::Repeating { task, period });
                            true
                        }
                        None => false,
                    };
                    if requeue {
                        self.enqueue(now + u64::from(period), id);
                    }
                }
            }
        }
        ran
    }

    fn pop_due(&self, now: u64) -> Option<TaskId> {
        let mut queue = self.queue.borrow_mut();
        match queue.peek() {
            Some(Reverse((due, _, _))) if *due <= now => queue.pop().map(|Reverse((_, _, id))| id),
            _ => None,
        }
    }

    fn insert(&self, job: Job, delay_ticks: u32) -> TaskId {
        let id = TaskId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.slots.borrow_mut().insert(id, Slot { job: Some(job) });
        self.enqueue(self.current_tick.get() + u64::from(delay_ticks.max(1)), id);
        id
    }

    fn enqueue(&self, due: u64, id: TaskId) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.queue.borrow_mut().push(Reverse((due, seq, id)));
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickScheduler")
            .field("current_tick", &self.current_tick.get())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl Scheduler for TickScheduler {
    fn schedule_delayed(&self, task: DelayedTask, delay_ticks: u32) -> EffectResult<TaskId> {
        Ok(self.insert(Job::Once(task), delay_ticks))
    }

    fn schedule_repeating(
        &self,
        task: RepeatingTask,
        initial_delay_ticks: u32,
        period_ticks: u32,
    ) -> EffectResult<TaskId> {
        let job = Job::Repeating {
            task,
            period: period_ticks.max(1),
        };
        Ok(self.insert(job, initial_delay_ticks))
    }

    fn cancel(&self, id: TaskId) {
        self.slots.borrow_mut().remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn log() -> Rc<RefCell<Vec<(u64, &'static str)>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_delayed_runs_on_deadline() {
        let sched = Rc::new(TickScheduler::new());
        let events = log();

        let (e, s) = (Rc::clone(&events), Rc::clone(&sched));
        sched
            .schedule_delayed(Box::new(move || e.borrow_mut().push((s.current_tick(), "a"))), 3)
            .unwrap();

        assert_eq!(sched.advance(2), 0);
        assert!(events.borrow().is_empty());
        assert_eq!(sched.tick(), 1);
        assert_eq!(*events.borrow(), vec![(3, "a")]);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_zero_delay_means_next_tick() {
        let sched = TickScheduler::new();
        let events = log();
        let e = Rc::clone(&events);
        sched
            .schedule_delayed(Box::new(move || e.borrow_mut().push((0, "now"))), 0)
            .unwrap();
        assert!(events.borrow().is_empty());
        sched.tick();
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn test_fifo_at_equal_deadline() {
        let sched = TickScheduler::new();
        let events = log();
        for name in ["first", "second", "third"] {
            let e = Rc::clone(&events);
            sched
                .schedule_delayed(Box::new(move || e.borrow_mut().push((0, name))), 2)
                .unwrap();
        }
        sched.advance(2);
        let names: Vec<_> = events.borrow().iter().map(|(_, n)| *n).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_repeating_period() {
        let sched = Rc::new(TickScheduler::new());
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let (t, s) = (Rc::clone(&ticks), Rc::clone(&sched));
        sched
            .schedule_repeating(Box::new(move || t.borrow_mut().push(s.current_tick())), 0, 5)
            .unwrap();
        sched.advance(20);
        assert_eq!(*ticks.borrow(), vec![1, 6, 11, 16]);
    }

    #[test]
    fn test_cancel_from_inside_task() {
        let sched = Rc::new(TickScheduler::new());
        let runs = Rc::new(Cell::new(0));
        let own_id: Rc<Cell<Option<TaskId>>> = Rc::new(Cell::new(None));

        let (r, s, id) = (Rc::clone(&runs), Rc::clone(&sched), Rc::clone(&own_id));
        let task = sched
            .schedule_repeating(
                Box::new(move || {
                    r.set(r.get() + 1);
                    if r.get() == 3 {
                        if let Some(me) = id.get() {
                            s.cancel(me);
                        }
                    }
                }),
                0,
                1,
            )
            .unwrap();
        own_id.set(Some(task));

        sched.advance(10);
        assert_eq!(runs.get(), 3);
        assert!(!sched.is_scheduled(task));
    }

    #[test]
    fn test_cancel_pending_delayed() {
        let sched = TickScheduler::new();
        let runs = Rc::new(Cell::new(0));
        let r = Rc::clone(&runs);
        let id = sched
            .schedule_delayed(Box::new(move || r.set(r.get() + 1)), 2)
            .unwrap();
        sched.cancel(id);
        sched.cancel(id);
        sched.advance(5);
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn test_zero_period_does_not_spin() {
        let sched = TickScheduler::new();
        let runs = Rc::new(Cell::new(0));
        let r = Rc::clone(&runs);
        sched
            .schedule_repeating(Box::new(move || r.set(r.get() + 1)), 0, 0)
            .unwrap();
        sched.advance(4);
        assert_eq!(runs.get(), 4);
    }
}
