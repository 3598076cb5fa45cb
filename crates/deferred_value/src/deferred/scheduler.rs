use std::collections::VecDeque;

use parking_lot::Mutex;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// The capability to run a task on a later turn.
///
/// Submission order must be preserved: tasks deferred earlier run earlier.
/// This is the only thing the deferred-value core consumes from its
/// environment; substituting a different implementation changes when root
/// computations run, nothing else.
pub trait Scheduler: Send + Sync {
    fn defer(&self, task: Task);
}

/// A FIFO task queue driven by its owner.
///
/// This is the cooperative "event queue": deferring a task never runs it;
/// the owner runs queued tasks one turn at a time with [`TurnQueue::turn`]
/// or drains everything with [`TurnQueue::run_until_idle`]. Tasks deferred
/// while draining are picked up in the same drain.
#[derive(Default)]
pub struct TurnQueue {
    tasks: Mutex<VecDeque<Task>>,
}

impl TurnQueue {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Runs the oldest queued task. Returns false when the queue was idle.
    pub fn turn(&self) -> bool {
        // The lock is released before the task runs so that the task can
        // defer further work onto this queue.
        let task = self.tasks.lock().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs queued tasks until none remain, returning the number of turns.
    pub fn run_until_idle(&self) -> usize {
        let mut turns = 0;
        while self.turn() {
            turns += 1;
        }
        turns
    }
}

impl Scheduler for TurnQueue {
    fn defer(&self, task: Task) {
        self.tasks.lock().push_back(task);
    }
}
