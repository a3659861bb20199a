use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use log::info;

use u_preempt::config::SimConfig;
use u_preempt::dispatching::BalancePolicy;
use u_preempt::sim::{EventSink, LogSink, NullSink};
use u_preempt::simulation::Simulation;
use u_preempt::stats::LogMetricsSink;

/// Preemptive multi-core scheduler simulation.
///
/// Generates random tasks, frames them over a simulated link, and runs
/// them on a pool of multi-core processors with quantum-bounded round-robin
/// preemption and load-ranked dispatch. Busy-time statistics across runs are
/// logged at the end.
///
/// Settings come from the built-in defaults, then the optional JSON config
/// file, then the command-line flags below.
#[derive(Debug, Parser)]
struct Opts {
    /// JSON configuration file (camelCase keys, every key optional).
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of processors.
    #[clap(short = 'p', long)]
    processors: Option<usize>,

    /// Cores per processor.
    #[clap(short = 'k', long)]
    cores: Option<usize>,

    /// Tasks generated per run.
    #[clap(short = 't', long)]
    tasks: Option<usize>,

    /// Time quantum in ticks.
    #[clap(short = 'q', long)]
    quantum: Option<u32>,

    /// Probability that a dequeued task blocks.
    #[clap(short = 'b', long)]
    blocking_probability: Option<f64>,

    /// Number of simulation runs.
    #[clap(short = 'r', long)]
    runs: Option<usize>,

    /// Base random seed.
    #[clap(short = 's', long)]
    seed: Option<u64>,

    /// Dispatch processors in fixed order instead of least-loaded first.
    #[clap(long, action = clap::ArgAction::SetTrue)]
    in_order: bool,

    /// Log every scheduling event (shown with -v).
    #[clap(short = 'e', long, action = clap::ArgAction::SetTrue)]
    events: bool,

    /// Write the full report of every run as JSON to this file.
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,

    /// Enable verbose output. Specify multiple times to increase verbosity.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Opts {
    fn load_config(&self) -> Result<SimConfig> {
        let mut config: SimConfig = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => SimConfig::default(),
        };

        if let Some(v) = self.processors {
            config.processor_count = v;
        }
        if let Some(v) = self.cores {
            config.cores_per_processor = v;
        }
        if let Some(v) = self.tasks {
            config.task_count = v;
        }
        if let Some(v) = self.quantum {
            config.time_quantum_ticks = v;
        }
        if let Some(v) = self.blocking_probability {
            config.blocking_probability = v;
        }
        if let Some(v) = self.runs {
            config.simulation_runs = v;
        }
        if let Some(v) = self.seed {
            config.random_seed = v;
        }
        if self.in_order {
            config.balance_policy = BalancePolicy::InOrder;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    let llv = match opts.verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(simplelog::LevelFilter::Error)
        .set_location_level(simplelog::LevelFilter::Off)
        .set_target_level(simplelog::LevelFilter::Off)
        .set_thread_level(simplelog::LevelFilter::Off);
    simplelog::TermLogger::init(
        llv,
        lcfg.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let config = opts.load_config()?;
    info!(
        "{} processors x {} cores, {} tasks, quantum {} ticks, {} runs, policy {}",
        config.processor_count,
        config.cores_per_processor,
        config.task_count,
        config.time_quantum_ticks,
        config.simulation_runs,
        config.balance_policy.name()
    );

    let sim = Simulation::new(config)?;
    let mut events: Box<dyn EventSink> = if opts.events {
        Box::new(LogSink)
    } else {
        Box::new(NullSink)
    };
    let outcome = sim.run(events.as_mut(), &mut LogMetricsSink)?;

    if let Some(path) = &opts.output {
        let json = serde_json::to_string_pretty(&outcome)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}
