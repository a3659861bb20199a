//! Preemptive multi-core execution and per-run metrics.
//!
//! Provides the processor pool, the round-based controller that drives it,
//! and the report each run produces.
//!
//! # Algorithm
//!
//! `Scheduler` runs priority-ordered, quantum-bounded round-robin over a
//! pool of processors. Before every round processors are re-ranked by
//! cumulative busy time so that idle cores on the least-loaded processors
//! receive the most important tasks first.
//!
//! # KPI
//!
//! `RunKpi` computes makespan, queue wait, turnaround, utilization and
//! busy-time spread from a `RunReport`.

mod controller;
mod cpu;
mod kpi;

pub use controller::Scheduler;
pub use cpu::{Core, Processor, Segment};
pub use kpi::{RunKpi, RunReport, TaskOutcome};
