//! Run report and performance indicators.
//!
//! A [`RunReport`] is the complete, read-only record of one simulation run.
//! [`RunKpi`] derives the usual scheduling metrics from it; the controller
//! stores them in the report's `kpi` field when the run ends.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Tick at which the last task retired |
//! | Avg Wait | Mean ticks spent in the ready queue |
//! | Avg Turnaround | Mean ticks from first admission to completion |
//! | Utilization | busy / (makespan - transmission) per core, averaged per processor |
//! | Busy Spread | Max minus min processor busy time |

use serde::{Deserialize, Serialize};

use crate::models::{Task, TaskId};
use crate::sim::ticks_to_secs;

/// Per-task result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Task identifier.
    pub id: TaskId,
    /// Scheduling priority.
    pub priority: i32,
    /// Operation count.
    pub total_ops: u64,
    /// Times a core picked the task up.
    pub dispatches: u32,
    /// Ticks spent waiting in the ready queue.
    pub wait_ticks: u64,
    /// Ticks from first admission to completion.
    pub turnaround_ticks: u64,
    /// Completion tick.
    pub completed_at: u64,
}

impl TaskOutcome {
    pub(crate) fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            priority: task.priority,
            total_ops: task.total_ops,
            dispatches: task.dispatches,
            wait_ticks: task.wait_ticks,
            turnaround_ticks: task.turnaround_ticks().unwrap_or(0),
            completed_at: task.completed_at.unwrap_or(0),
        }
    }
}

/// Complete record of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Seed the run was generated from.
    pub seed: u64,
    /// Ticks per second.
    pub clock_hz: f64,
    /// Frames sent over the link.
    pub frame_count: usize,
    /// Frames holding a single task above capacity.
    pub oversized_frames: usize,
    /// Bits on the wire, headers included.
    pub wire_bits: u64,
    /// Link delay (ticks) before the first dispatch.
    pub transmission_ticks: u64,
    /// Tasks admitted to the ready queue.
    pub admitted: usize,
    /// Tasks retired as done.
    pub completed: usize,
    /// Dispatch rounds executed.
    pub rounds: u64,
    /// Task-to-core assignments.
    pub dispatches: u64,
    /// Quantum expiries that sent a task back to the queue.
    pub preemptions: u64,
    /// Simulated I/O blocks.
    pub blocks: u64,
    /// Tick at which the run finished.
    pub makespan_ticks: u64,
    /// Busy ticks per core, grouped by processor.
    pub core_busy_ticks: Vec<Vec<u64>>,
    /// Busy ticks per processor.
    pub processor_busy_ticks: Vec<u64>,
    /// Retired tasks in completion order.
    pub outcomes: Vec<TaskOutcome>,
    /// Derived metrics, average wait and turnaround included.
    pub kpi: RunKpi,
}

impl RunReport {
    /// Busy time per processor (seconds).
    pub fn processor_busy_secs(&self) -> Vec<f64> {
        self.processor_busy_ticks
            .iter()
            .map(|&t| ticks_to_secs(t, self.clock_hz))
            .collect()
    }

    /// Whether every admitted task was retired.
    pub fn is_conserved(&self) -> bool {
        self.admitted == self.completed && self.outcomes.len() == self.completed
    }

    /// Outcome for a task.
    pub fn outcome(&self, id: TaskId) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }
}

/// Scheduling performance indicators for one run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunKpi {
    /// Tick at which the run finished.
    pub makespan_ticks: u64,
    /// Mean ready-queue wait (ticks).
    pub avg_wait_ticks: f64,
    /// Mean admission-to-completion time (ticks).
    pub avg_turnaround_ticks: f64,
    /// Per-processor utilization over the execution window (0.0..1.0).
    pub utilization_by_processor: Vec<f64>,
    /// Mean of `utilization_by_processor`.
    pub avg_utilization: f64,
    /// Max minus min processor busy time (ticks).
    pub busy_spread_ticks: u64,
}

impl RunKpi {
    /// Computes KPIs from a run report.
    pub fn calculate(report: &RunReport) -> Self {
        let n = report.outcomes.len();
        let (avg_wait_ticks, avg_turnaround_ticks) = if n == 0 {
            (0.0, 0.0)
        } else {
            let wait: f64 = report.outcomes.iter().map(|o| o.wait_ticks as f64).sum();
            let turn: f64 = report.outcomes.iter().map(|o| o.turnaround_ticks as f64).sum();
            (wait / n as f64, turn / n as f64)
        };

        // Cores can only work after the frames have arrived.
        let window = report
            .makespan_ticks
            .saturating_sub(report.transmission_ticks);
        let utilization_by_processor: Vec<f64> = report
            .core_busy_ticks
            .iter()
            .map(|cores| {
                if window == 0 || cores.is_empty() {
                    0.0
                } else {
                    let busy: u64 = cores.iter().sum();
                    busy as f64 / (window as f64 * cores.len() as f64)
                }
            })
            .collect();
        let avg_utilization = if utilization_by_processor.is_empty() {
            0.0
        } else {
            utilization_by_processor.iter().sum::<f64>() / utilization_by_processor.len() as f64
        };

        let max = report.processor_busy_ticks.iter().copied().max().unwrap_or(0);
        let min = report.processor_busy_ticks.iter().copied().min().unwrap_or(0);

        Self {
            makespan_ticks: report.makespan_ticks,
            avg_wait_ticks,
            avg_turnaround_ticks,
            utilization_by_processor,
            avg_utilization,
            busy_spread_ticks: max - min,
        }
    }
}
