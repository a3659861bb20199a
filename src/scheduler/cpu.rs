//! Cores and processors.
//!
//! A core owns at most one task between [`Core::assign`] and the end of
//! [`Core::run`]. Ownership moves in on assignment and moves back out in
//! the returned [`Segment`], so two cores can never hold the same task.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::models::Task;

/// One quantum's worth of execution on a core.
#[derive(Debug, Clone)]
pub struct Segment {
    /// The task, handed back to the controller.
    pub task: Task,
    /// Ticks the core spent on the task.
    pub ticks: u64,
    /// Operations executed.
    pub ops: u64,
    /// Whether the task ran out of operations.
    pub completed: bool,
}

/// A single-task execution unit.
#[derive(Debug)]
pub struct Core {
    id: usize,
    processor_id: usize,
    busy: AtomicBool,
    busy_ticks: AtomicU64,
    slot: Mutex<Option<Task>>,
}

impl Core {
    /// Creates an idle core.
    pub fn new(id: usize, processor_id: usize) -> Self {
        Self {
            id,
            processor_id,
            busy: AtomicBool::new(false),
            busy_ticks: AtomicU64::new(0),
            slot: Mutex::new(None),
        }
    }

    /// Core index within its processor.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Owning processor index.
    pub fn processor_id(&self) -> usize {
        self.processor_id
    }

    /// Whether a task is assigned or running.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Cumulative ticks spent executing tasks.
    #[inline]
    pub fn busy_ticks(&self) -> u64 {
        self.busy_ticks.load(Ordering::Acquire)
    }

    /// Takes custody of `task` at tick `now`.
    ///
    /// Returns the task unchanged if the core already holds one.
    pub fn assign(&self, mut task: Task, now: u64) -> Result<(), Task> {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return Err(task);
        }
        task.mark_dispatched(now);
        *slot = Some(task);
        self.busy.store(true, Ordering::Release);
        Ok(())
    }

    /// Runs the assigned task for up to one quantum.
    ///
    /// Each tick executes `ops_per_tick` operations; the segment ends early
    /// when the task runs out. The task's own quantum override, if any,
    /// replaces `quantum`. Returns `None` when no task is assigned.
    pub fn run(&self, quantum: u32, ops_per_tick: u64) -> Option<Segment> {
        let mut slot = self.slot.lock();
        let mut task = slot.take()?;

        let quantum = u64::from(task.effective_quantum(quantum));
        let ticks = task.remaining_ops().div_ceil(ops_per_tick.max(1)).min(quantum);
        let ops = task.execute(ticks.saturating_mul(ops_per_tick));
        let completed = task.is_done();
        if !completed {
            task.mark_preempted();
        }

        self.busy_ticks.fetch_add(ticks, Ordering::AcqRel);
        self.busy.store(false, Ordering::Release);

        Some(Segment {
            task,
            ticks,
            ops,
            completed,
        })
    }
}

/// A processor exposing a fixed set of cores.
#[derive(Debug)]
pub struct Processor {
    id: usize,
    cores: Vec<Core>,
}

impl Processor {
    /// Creates a processor with `core_count` idle cores.
    pub fn new(id: usize, core_count: usize) -> Self {
        Self {
            id,
            cores: (0..core_count).map(|c| Core::new(c, id)).collect(),
        }
    }

    /// Processor index.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Cores in index order.
    pub fn cores(&self) -> &[Core] {
        &self.cores
    }

    /// Sum of the cores' busy time (ticks).
    pub fn busy_ticks(&self) -> u64 {
        self.cores.iter().map(Core::busy_ticks).sum()
    }

    /// Whether any core holds a task.
    pub fn has_active_core(&self) -> bool {
        self.cores.iter().any(Core::is_busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    #[test]
    fn test_quantum_arithmetic() {
        // 25 ops at 5 ops/tick with a 3-tick quantum: 15 then 10.
        let core = Core::new(0, 0);
        core.assign(Task::new(1, 25, 8), 0).unwrap();
        let seg = core.run(3, 5).unwrap();
        assert_eq!((seg.ticks, seg.ops, seg.completed), (3, 15, false));
        assert_eq!(seg.task.remaining_ops(), 10);
        assert_eq!(seg.task.status(), TaskStatus::Ready);

        core.assign(seg.task, 3).unwrap();
        let seg = core.run(3, 5).unwrap();
        assert_eq!((seg.ticks, seg.ops, seg.completed), (2, 10, true));
        assert_eq!(seg.task.status(), TaskStatus::Done);
        assert_eq!(seg.task.dispatches, 2);
        assert_eq!(core.busy_ticks(), 5);
    }

    #[test]
    fn test_partial_last_tick_counts() {
        let core = Core::new(0, 0);
        core.assign(Task::new(1, 7, 8), 0).unwrap();
        let seg = core.run(10, 5).unwrap();
        assert_eq!((seg.ticks, seg.ops, seg.completed), (2, 7, true));
    }

    #[test]
    fn test_task_quantum_override() {
        let core = Core::new(0, 0);
        core.assign(Task::new(1, 100, 8).with_quantum(2), 0).unwrap();
        let seg = core.run(10, 1).unwrap();
        assert_eq!(seg.ticks, 2);
        assert_eq!(seg.task.remaining_ops(), 98);
    }

    #[test]
    fn test_busy_flag_lifecycle() {
        let core = Core::new(1, 3);
        assert!(!core.is_busy());
        assert!(core.run(5, 1).is_none());

        core.assign(Task::new(1, 10, 8), 0).unwrap();
        assert!(core.is_busy());

        let rejected = core.assign(Task::new(2, 10, 8), 0).unwrap_err();
        assert_eq!(rejected.id, 2);
        assert_eq!(rejected.dispatches, 0);

        core.run(5, 1).unwrap();
        assert!(!core.is_busy());
        assert_eq!(core.busy_ticks(), 5);
    }

    #[test]
    fn test_processor_busy_sum() {
        let p = Processor::new(2, 2);
        assert_eq!(p.id(), 2);
        assert_eq!(p.cores()[1].processor_id(), 2);

        p.cores()[0].assign(Task::new(1, 4, 8), 0).unwrap();
        p.cores()[1].assign(Task::new(2, 9, 8), 0).unwrap();
        assert!(p.has_active_core());
        p.cores()[0].run(10, 1);
        p.cores()[1].run(10, 1);
        assert_eq!(p.busy_ticks(), 13);
        assert!(!p.has_active_core());
    }
}
