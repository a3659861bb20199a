//! Repeated seeded runs.
//!
//! A [`Simulation`] validates its configuration once, then performs
//! `simulation_runs` independent runs. Run `i` generates its workload and
//! draws its blocking events from `SmallRng::seed_from_u64(random_seed + i)`,
//! so any run can be replayed on its own.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::Result;
use crate::scheduler::{RunReport, Scheduler};
use crate::sim::EventSink;
use crate::stats::{AggregateStats, MetricsSink, StatsCollector};
use crate::validation::validate_config;
use crate::workload::WorkloadGenerator;

/// Reports of every run plus the cross-run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// One report per run, in run order.
    pub reports: Vec<RunReport>,
    /// Busy-time statistics across runs.
    pub stats: AggregateStats,
}

/// Validated batch of simulation runs.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
}

impl Simulation {
    /// Validates `config`. No run starts if it is invalid.
    pub fn new(config: SimConfig) -> Result<Self> {
        validate_config(&config)?;
        Ok(Self { config })
    }

    /// The validated configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Performs run `run_index` alone.
    pub fn run_once(&self, run_index: usize, events: &mut dyn EventSink) -> Result<RunReport> {
        let seed = self.config.seed_for_run(run_index);
        let mut rng = SmallRng::seed_from_u64(seed);

        let generator = WorkloadGenerator::from_config(&self.config);
        let mut memory = generator.fill_memory(self.config.task_count, &mut rng);

        let scheduler = Scheduler::new(&self.config)?.with_seed(seed);
        Ok(scheduler.run(&mut memory, &mut rng, events))
    }

    /// Performs every run, feeding busy times to `metrics`.
    pub fn run(
        &self,
        events: &mut dyn EventSink,
        metrics: &mut dyn MetricsSink,
    ) -> Result<SimulationOutcome> {
        let mut collector = StatsCollector::new();
        let mut reports = Vec::with_capacity(self.config.simulation_runs);

        for run_index in 0..self.config.simulation_runs {
            let report = self.run_once(run_index, events)?;
            debug_assert!(report.is_conserved());
            log::info!(
                "run {}/{} (seed {}): {} tasks, {} frames, makespan {} ticks",
                run_index + 1,
                self.config.simulation_runs,
                report.seed,
                report.completed,
                report.frame_count,
                report.makespan_ticks
            );
            log::info!(
                "run {}: avg wait {:.1} ticks, avg turnaround {:.1} ticks, utilization {:.3}",
                run_index + 1,
                report.kpi.avg_wait_ticks,
                report.kpi.avg_turnaround_ticks,
                report.kpi.avg_utilization
            );
            collector.record_and_report(run_index, report.processor_busy_secs(), metrics);
            reports.push(report);
        }

        let stats = collector.finish(metrics);
        Ok(SimulationOutcome { reports, stats })
    }
}
