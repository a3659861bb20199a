//! Task model.
//!
//! A task is the unit of schedulable work: it carries a priority, an
//! operation budget that cores burn down tick by tick, and a payload size
//! that determines how it is packed into frames for transmission.
//!
//! # Time Representation
//! All timestamps are virtual clock ticks relative to the start of a run
//! (t=0). The run's `clock_hz` converts ticks to seconds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Task identifier.
pub type TaskId = u64;

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Waiting in the memory store, a frame, or the ready queue.
    Ready,
    /// Held by a core and executing.
    Running,
    /// Parked on a simulated I/O wait.
    Blocked,
    /// All operations consumed.
    Done,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Ready => "Ready",
            TaskStatus::Running => "Running",
            TaskStatus::Blocked => "Blocked",
            TaskStatus::Done => "Done",
        };
        f.write_str(s)
    }
}

/// A unit of schedulable work.
///
/// Lower `priority` values are more important and are dispatched first.
/// `remaining_ops` only ever decreases; the task is `Done` exactly when it
/// reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Scheduling priority (lower = more important).
    pub priority: i32,
    /// Operation count fixed at creation.
    pub total_ops: u64,
    /// Operations still to execute.
    remaining_ops: u64,
    /// Payload size in bits.
    pub size_bits: u64,
    /// Per-dispatch quantum override (ticks). `None` = use the run quantum.
    pub quantum: Option<u32>,
    /// Current lifecycle state.
    status: TaskStatus,
    /// Tick of first admission to the ready queue.
    admitted_at: Option<u64>,
    /// Tick of the most recent enqueue.
    enqueued_at: Option<u64>,
    /// Ticks spent waiting in the ready queue, summed over all admissions.
    pub wait_ticks: u64,
    /// Number of times a core picked this task up.
    pub dispatches: u32,
    /// Tick at which the last operation completed.
    pub completed_at: Option<u64>,
    /// Set on wake-up; the next dispatch skips the blocking draw.
    #[serde(skip)]
    resumed: bool,
}

impl Task {
    /// Creates a ready task with the given operation budget and size.
    pub fn new(id: TaskId, total_ops: u64, size_bits: u64) -> Self {
        Self {
            id,
            priority: 0,
            total_ops,
            remaining_ops: total_ops,
            size_bits,
            quantum: None,
            status: if total_ops == 0 {
                TaskStatus::Done
            } else {
                TaskStatus::Ready
            },
            admitted_at: None,
            enqueued_at: None,
            wait_ticks: 0,
            dispatches: 0,
            completed_at: None,
            resumed: false,
        }
    }

    /// Sets the scheduling priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets a per-dispatch quantum override (ticks).
    pub fn with_quantum(mut self, quantum: u32) -> Self {
        self.quantum = Some(quantum);
        self
    }

    /// Operations still to execute.
    #[inline]
    pub fn remaining_ops(&self) -> u64 {
        self.remaining_ops
    }

    /// Current lifecycle state.
    #[inline]
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Whether every operation has been executed.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.remaining_ops == 0
    }

    /// Tick of first admission to the ready queue.
    pub fn admitted_at(&self) -> Option<u64> {
        self.admitted_at
    }

    /// Quantum to grant on the next dispatch.
    pub fn effective_quantum(&self, run_quantum: u32) -> u32 {
        self.quantum.unwrap_or(run_quantum)
    }

    /// Executes up to `ops` operations and returns how many were consumed.
    ///
    /// Saturates at zero and flips the status to `Done` when the budget
    /// is exhausted.
    pub fn execute(&mut self, ops: u64) -> u64 {
        let consumed = ops.min(self.remaining_ops);
        self.remaining_ops -= consumed;
        if self.remaining_ops == 0 {
            self.status = TaskStatus::Done;
        }
        consumed
    }

    /// Records entry into the ready queue at tick `now`.
    ///
    /// The first call fixes the admission timestamp; every call restarts
    /// the wait timer.
    pub fn mark_enqueued(&mut self, now: u64) {
        if self.admitted_at.is_none() {
            self.admitted_at = Some(now);
        }
        self.enqueued_at = Some(now);
        if !self.is_done() {
            self.status = TaskStatus::Ready;
        }
    }

    /// Records pickup by a core at tick `now`.
    pub fn mark_dispatched(&mut self, now: u64) {
        self.close_wait(now);
        self.dispatches += 1;
        self.status = TaskStatus::Running;
    }

    /// Records a simulated I/O block at tick `now`.
    pub fn mark_blocked(&mut self, now: u64) {
        self.close_wait(now);
        self.status = TaskStatus::Blocked;
    }

    /// Records the end of a simulated I/O wait at tick `now`.
    ///
    /// The task re-enters the ready state and skips the blocking draw on
    /// its next dispatch.
    pub fn mark_unblocked(&mut self, now: u64) {
        self.mark_enqueued(now);
        self.resumed = true;
    }

    /// Clears and returns the flag set by [`mark_unblocked`](Self::mark_unblocked).
    pub fn take_resumed(&mut self) -> bool {
        std::mem::take(&mut self.resumed)
    }

    /// Hands a preempted task back to the ready state.
    pub fn mark_preempted(&mut self) {
        debug_assert!(!self.is_done());
        self.status = TaskStatus::Ready;
    }

    /// Records retirement at tick `now`.
    pub fn mark_completed(&mut self, now: u64) {
        debug_assert!(self.is_done());
        self.completed_at = Some(now);
    }

    /// Ticks between first admission and completion.
    pub fn turnaround_ticks(&self) -> Option<u64> {
        match (self.admitted_at, self.completed_at) {
            (Some(a), Some(c)) => Some(c.saturating_sub(a)),
            _ => None,
        }
    }

    fn close_wait(&mut self, now: u64) {
        if let Some(since) = self.enqueued_at.take() {
            self.wait_ticks += now.saturating_sub(since);
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Task(id={}, priority={}, size={}, ops={}/{}, status={})",
            self.id, self.priority, self.size_bits, self.remaining_ops, self.total_ops, self.status
        )
    }
}
