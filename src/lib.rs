//! Discrete-event simulation of a preemptive, priority-based multi-core
//! scheduler fed through a bandwidth-limited framing layer.
//!
//! Tasks are generated into a memory store, packed into capacity-bounded
//! frames, delayed by the link, admitted to a priority queue, and executed
//! quantum by quantum on a pool of multi-core processors that are re-ranked
//! by load before every dispatch round. Busy-time statistics are aggregated
//! across repeated seeded runs.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `Frame`, `MemoryStore`
//! - **`transport`**: `FrameAggregator` (greedy framing, link delay)
//! - **`dispatching`**: `ReadyQueue` (priority + FIFO) and `BalancePolicy`
//! - **`scheduler`**: `Core`, `Processor`, `Scheduler`, `RunReport`, `RunKpi`
//! - **`stats`**: `StatsCollector` and the `MetricsSink` interface
//! - **`sim`**: `VirtualClock` and the `EventSink` interface
//! - **`simulation`**: seeded multi-run driver
//! - **`config`** / **`validation`** / **`error`**: configuration surface
//!
//! # Example
//!
//! ```
//! use u_preempt::config::SimConfig;
//! use u_preempt::sim::NullSink;
//! use u_preempt::simulation::Simulation;
//! use u_preempt::stats::LogMetricsSink;
//!
//! let config = SimConfig::new().with_topology(2, 2).with_task_count(20).with_runs(2);
//! let sim = Simulation::new(config).unwrap();
//! let outcome = sim.run(&mut NullSink, &mut LogMetricsSink).unwrap();
//! assert_eq!(outcome.reports.len(), 2);
//! assert!(outcome.reports.iter().all(|r| r.completed == 20));
//! ```
//!
//! # Time
//!
//! All delays are virtual. Execution, transmission and blocking advance a
//! tick counter; nothing sleeps. `clock_hz` converts ticks to seconds.

pub mod config;
pub mod dispatching;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod sim;
pub mod simulation;
pub mod stats;
pub mod transport;
pub mod validation;
pub mod workload;

pub use error::{Result, SimError};
