//! Simulation configuration.
//!
//! Every field has a default, so a partial JSON document such as
//! `{"taskCount": 50, "randomSeed": 7}` is a complete configuration.
//! Call [`crate::validation::validate_config`] (or let
//! [`crate::simulation::Simulation::new`] do it) before running.

use serde::{Deserialize, Serialize};

use crate::dispatching::BalancePolicy;

/// Knobs for one batch of simulation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
    /// Ticks per second; converts virtual ticks to seconds.
    pub clock_hz: f64,
    /// Link bandwidth (bits/second) used for frame transmission delay.
    pub bandwidth: f64,
    /// Frame size limit including header (bits).
    pub max_frame_size_bits: u64,
    /// Fixed header overhead per frame (bits).
    pub frame_header_bits: u64,
    /// Upper bound of generated task payload size (bits).
    pub max_task_size_bits: u64,
    /// Upper bound of generated task operation count.
    pub max_task_operations: u64,
    /// Number of distinct priority values (1 = most important).
    pub priority_levels: i32,
    /// Processors in the pool.
    pub processor_count: usize,
    /// Cores on each processor.
    pub cores_per_processor: usize,
    /// Tasks generated per run.
    pub task_count: usize,
    /// Ticks a core grants a task per dispatch.
    pub time_quantum_ticks: u32,
    /// Operations a core executes per tick.
    pub ops_per_tick: u64,
    /// Chance that a dequeued task blocks instead of running.
    pub blocking_probability: f64,
    /// Ticks a blocked task stays parked.
    pub blocking_wait_ticks: u64,
    /// Per-task quantum override stamped on generated tasks.
    pub ttl: Option<u32>,
    /// Number of independent runs for statistics.
    pub simulation_runs: usize,
    /// Seed of the first run; run `i` uses `random_seed + i`.
    pub random_seed: u64,
    /// Processor ranking used by dispatch rounds.
    pub balance_policy: BalancePolicy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            clock_hz: 1e9,
            bandwidth: 100e9,
            max_frame_size_bits: 1500 * 8,
            frame_header_bits: 0,
            max_task_size_bits: 128,
            max_task_operations: 100,
            priority_levels: 10,
            processor_count: 4,
            cores_per_processor: 8,
            task_count: 100,
            time_quantum_ticks: 10,
            ops_per_tick: 1,
            blocking_probability: 0.1,
            blocking_wait_ticks: 1_000,
            ttl: None,
            simulation_runs: 5,
            random_seed: 0,
            balance_policy: BalancePolicy::LeastLoaded,
        }
    }
}

impl SimConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the processor pool shape.
    pub fn with_topology(mut self, processors: usize, cores_per_processor: usize) -> Self {
        self.processor_count = processors;
        self.cores_per_processor = cores_per_processor;
        self
    }

    /// Sets the number of generated tasks.
    pub fn with_task_count(mut self, count: usize) -> Self {
        self.task_count = count;
        self
    }

    /// Sets the run quantum (ticks).
    pub fn with_quantum(mut self, ticks: u32) -> Self {
        self.time_quantum_ticks = ticks;
        self
    }

    /// Sets operations executed per tick.
    pub fn with_ops_per_tick(mut self, ops: u64) -> Self {
        self.ops_per_tick = ops;
        self
    }

    /// Sets the blocking probability and wait.
    pub fn with_blocking(mut self, probability: f64, wait_ticks: u64) -> Self {
        self.blocking_probability = probability;
        self.blocking_wait_ticks = wait_ticks;
        self
    }

    /// Sets the number of runs.
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.simulation_runs = runs;
        self
    }

    /// Sets the base random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Sets the balance policy.
    pub fn with_balance_policy(mut self, policy: BalancePolicy) -> Self {
        self.balance_policy = policy;
        self
    }

    /// Payload capacity of one frame (bits).
    pub fn frame_capacity_bits(&self) -> u64 {
        self.max_frame_size_bits.saturating_sub(self.frame_header_bits)
    }

    /// Seed for run `run_index`.
    pub fn seed_for_run(&self, run_index: usize) -> u64 {
        self.random_seed.wrapping_add(run_index as u64)
    }
}
