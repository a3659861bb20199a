//! Preemptive round-robin controller.
//!
//! # Algorithm
//!
//! 1. **Admission**: drain the memory store, pack tasks into frames, wait
//!    out the link delay, enqueue every task.
//! 2. **Dispatch round**: rank processors by the balance policy and fill
//!    each idle core with the most important queued task. A dequeued task
//!    may instead block for a fixed wait (it keeps its operations).
//! 3. **Execution**: assigned cores run concurrently for up to one
//!    quantum. The controller waits for all of them, then advances the
//!    clock by the longest segment.
//! 4. **Requeue or retire**: unfinished tasks go back to the queue in
//!    dispatch order; finished tasks are retired.
//! 5. Repeat until the queue is empty, no core is active, and no task is
//!    parked.
//!
//! Events are emitted from the controller thread in dispatch order, so the
//! event stream is identical across runs with the same seed.

use rand::Rng;
use std::collections::VecDeque;
use std::thread;

use super::cpu::{Processor, Segment};
use super::kpi::{RunKpi, RunReport, TaskOutcome};
use crate::config::SimConfig;
use crate::dispatching::{BalancePolicy, ReadyQueue};
use crate::error::Result;
use crate::models::{MemoryStore, Task};
use crate::sim::{EventKind, EventSink, SchedEvent, VirtualClock};
use crate::transport::FrameAggregator;
use crate::validation::validate_config;

/// A blocked task waiting for its wake tick.
#[derive(Debug)]
struct Parked {
    wake_at: u64,
    task: Task,
}

/// Where a dispatched task went.
#[derive(Debug, Clone, Copy)]
struct Placement {
    processor: usize,
    core: usize,
}

#[derive(Debug, Default)]
struct Counters {
    rounds: u64,
    dispatches: u64,
    preemptions: u64,
    blocks: u64,
}

/// Single-run scheduling controller.
///
/// # Example
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::SmallRng;
/// use u_preempt::config::SimConfig;
/// use u_preempt::models::{MemoryStore, Task};
/// use u_preempt::scheduler::Scheduler;
/// use u_preempt::sim::NullSink;
///
/// let config = SimConfig::new().with_topology(1, 2).with_blocking(0.0, 0);
/// let mut memory: MemoryStore = (0..4).map(|i| Task::new(i, 20, 32)).collect();
///
/// let scheduler = Scheduler::new(&config).unwrap();
/// let report = scheduler.run(&mut memory, &mut SmallRng::seed_from_u64(1), &mut NullSink);
/// assert_eq!(report.completed, 4);
/// assert!(memory.is_empty());
/// ```
#[derive(Debug)]
pub struct Scheduler {
    processors: Vec<Processor>,
    queue: ReadyQueue,
    aggregator: FrameAggregator,
    clock: VirtualClock,
    clock_hz: f64,
    quantum: u32,
    ops_per_tick: u64,
    blocking_probability: f64,
    blocking_wait_ticks: u64,
    policy: BalancePolicy,
    seed: u64,
}

impl Scheduler {
    /// Builds a controller and an idle processor pool from `config`.
    ///
    /// Fails if the configuration does not validate.
    pub fn new(config: &SimConfig) -> Result<Self> {
        validate_config(config)?;
        Ok(Self {
            processors: (0..config.processor_count)
                .map(|p| Processor::new(p, config.cores_per_processor))
                .collect(),
            queue: ReadyQueue::new(),
            aggregator: FrameAggregator::new(config.max_frame_size_bits, config.bandwidth)
                .with_header(config.frame_header_bits),
            clock: VirtualClock::new(),
            clock_hz: config.clock_hz,
            quantum: config.time_quantum_ticks,
            ops_per_tick: config.ops_per_tick,
            blocking_probability: config.blocking_probability,
            blocking_wait_ticks: config.blocking_wait_ticks,
            policy: config.balance_policy,
            seed: config.random_seed,
        })
    }

    /// Records the seed the workload was generated from in the report.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Runs every task in `memory` to completion.
    ///
    /// The memory store is drained. `rng` drives the blocking draws only.
    pub fn run<R: Rng>(
        mut self,
        memory: &mut MemoryStore,
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> RunReport {
        let mut report = self.admit(memory, sink);
        let admitted = report.admitted;

        let mut counters = Counters::default();
        let mut parked: VecDeque<Parked> = VecDeque::new();
        let mut retired: Vec<Task> = Vec::with_capacity(admitted);

        loop {
            debug_assert_eq!(admitted, retired.len() + self.queue.len() + parked.len());
            debug_assert!(!self.processors.iter().any(Processor::has_active_core));

            self.wake_parked(&mut parked, sink);

            if self.queue.is_empty() {
                match parked.front() {
                    Some(p) => {
                        self.clock.advance_to(p.wake_at);
                        continue;
                    }
                    None => break,
                }
            }

            let placements = self.fill_idle_cores(rng, &mut parked, &mut counters, sink);
            if placements.is_empty() {
                continue;
            }
            counters.rounds += 1;

            let segments = self.execute(&placements);
            self.settle(&placements, segments, &mut retired, &mut counters, sink);
        }

        let now = self.clock.now();
        sink.record(&SchedEvent::new(now, EventKind::RunFinished));
        log::debug!(
            "run finished at t={} after {} rounds ({} preemptions, {} blocks)",
            now,
            counters.rounds,
            counters.preemptions,
            counters.blocks
        );

        report.completed = retired.len();
        report.rounds = counters.rounds;
        report.dispatches = counters.dispatches;
        report.preemptions = counters.preemptions;
        report.blocks = counters.blocks;
        report.makespan_ticks = now;
        report.core_busy_ticks = self
            .processors
            .iter()
            .map(|p| p.cores().iter().map(|c| c.busy_ticks()).collect())
            .collect();
        report.processor_busy_ticks = self.processors.iter().map(Processor::busy_ticks).collect();
        report.outcomes = retired.iter().map(TaskOutcome::from_task).collect();
        report.kpi = RunKpi::calculate(&report);
        report
    }

    /// Frames the memory contents, waits out the link, fills the queue.
    fn admit(&mut self, memory: &mut MemoryStore, sink: &mut dyn EventSink) -> RunReport {
        let tx = self.aggregator.transmit(memory.drain());

        for frame in &tx.frames {
            if frame.is_oversized() {
                let task = &frame.tasks()[0];
                sink.record(
                    &SchedEvent::new(self.clock.now(), EventKind::OversizedFrame)
                        .with_task(task.id, task.remaining_ops()),
                );
            } else {
                sink.record(&SchedEvent::new(self.clock.now(), EventKind::FrameSealed));
            }
        }

        let transmission_ticks = tx.delay_ticks(self.clock_hz);
        self.clock.advance_by(transmission_ticks);
        let now = self.clock.now();
        sink.record(&SchedEvent::new(now, EventKind::Transmitted));

        let frame_count = tx.frames.len();
        let oversized_frames = tx.oversized_count();
        let mut admitted = 0;
        for frame in tx.frames {
            for mut task in frame.into_tasks() {
                task.mark_enqueued(now);
                sink.record(
                    &SchedEvent::new(now, EventKind::Admitted).with_task(task.id, task.remaining_ops()),
                );
                self.queue.enqueue(task);
                admitted += 1;
            }
        }

        log::debug!(
            "admitted {} tasks in {} frames ({} oversized), link delay {} ticks",
            admitted,
            frame_count,
            oversized_frames,
            transmission_ticks
        );

        RunReport {
            seed: self.seed,
            clock_hz: self.clock_hz,
            frame_count,
            oversized_frames,
            wire_bits: tx.wire_bits,
            transmission_ticks,
            admitted,
            completed: 0,
            rounds: 0,
            dispatches: 0,
            preemptions: 0,
            blocks: 0,
            makespan_ticks: 0,
            core_busy_ticks: Vec::new(),
            processor_busy_ticks: Vec::new(),
            outcomes: Vec::new(),
            kpi: RunKpi::default(),
        }
    }

    /// Returns parked tasks whose wait has elapsed to the queue.
    fn wake_parked(
        &mut self,
        parked: &mut VecDeque<Parked>,
        sink: &mut dyn EventSink,
    ) {
        let now = self.clock.now();
        // Wake ticks are non-decreasing in park order.
        while parked.front().is_some_and(|p| p.wake_at <= now) {
            let Some(Parked { mut task, .. }) = parked.pop_front() else {
                break;
            };
            task.mark_unblocked(now);
            sink.record(
                &SchedEvent::new(now, EventKind::Unblocked).with_task(task.id, task.remaining_ops()),
            );
            self.queue.enqueue(task);
        }
    }

    /// Assigns queued tasks to idle cores, least-loaded processors first.
    fn fill_idle_cores<R: Rng>(
        &mut self,
        rng: &mut R,
        parked: &mut VecDeque<Parked>,
        counters: &mut Counters,
        sink: &mut dyn EventSink,
    ) -> Vec<Placement> {
        let now = self.clock.now();
        let loads: Vec<u64> = self.processors.iter().map(Processor::busy_ticks).collect();
        let order = self.policy.rank(&loads);

        let mut placements: Vec<Placement> = Vec::new();
        'processors: for p in order {
            for core in self.processors[p].cores() {
                if core.is_busy() {
                    continue;
                }
                loop {
                    let Some(mut task) = self.queue.dequeue() else {
                        break 'processors;
                    };

                    // A task that just woke always gets to run once.
                    if !task.take_resumed()
                        && self.blocking_probability > 0.0
                        && rng.random_bool(self.blocking_probability)
                    {
                        task.mark_blocked(now);
                        sink.record(
                            &SchedEvent::new(now, EventKind::Blocked)
                                .with_task(task.id, task.remaining_ops()),
                        );
                        counters.blocks += 1;
                        parked.push_back(Parked {
                            wake_at: now.saturating_add(self.blocking_wait_ticks),
                            task,
                        });
                        continue;
                    }

                    let (id, remaining) = (task.id, task.remaining_ops());
                    if let Err(task) = core.assign(task, now) {
                        // Idle cores accept; keep the task regardless.
                        self.queue.enqueue(task);
                        break;
                    }
                    if placements.is_empty() {
                        sink.record(&SchedEvent::new(now, EventKind::Rebalanced));
                    }
                    sink.record(
                        &SchedEvent::new(now, EventKind::Assigned)
                            .on_core(p, core.id())
                            .with_task(id, remaining),
                    );
                    counters.dispatches += 1;
                    placements.push(Placement {
                        processor: p,
                        core: core.id(),
                    });
                    break;
                }
            }
        }
        placements
    }

    /// Runs every placed core concurrently and waits for all of them.
    ///
    /// Returns segments indexed like `placements`.
    fn execute(&self, placements: &[Placement]) -> Vec<Option<Segment>> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let (quantum, ops_per_tick) = (self.quantum, self.ops_per_tick);

        thread::scope(|s| {
            for (slot, placement) in placements.iter().enumerate() {
                let core = &self.processors[placement.processor].cores()[placement.core];
                let tx = tx.clone();
                s.spawn(move || {
                    if let Some(segment) = core.run(quantum, ops_per_tick) {
                        // The receiver outlives the scope.
                        let _ = tx.send((slot, segment));
                    }
                });
            }
        });
        drop(tx);

        let mut segments: Vec<Option<Segment>> = vec![None; placements.len()];
        for (slot, segment) in rx.try_iter() {
            segments[slot] = Some(segment);
        }
        segments
    }

    /// Retires finished tasks, requeues the rest, and advances the clock.
    fn settle(
        &mut self,
        placements: &[Placement],
        segments: Vec<Option<Segment>>,
        retired: &mut Vec<Task>,
        counters: &mut Counters,
        sink: &mut dyn EventSink,
    ) {
        let start = self.clock.now();
        let span = segments
            .iter()
            .flatten()
            .map(|s| s.ticks)
            .max()
            .unwrap_or(0);

        let mut requeue = Vec::new();
        for (placement, segment) in placements.iter().zip(segments) {
            let Some(Segment {
                mut task,
                ticks,
                completed,
                ..
            }) = segment
            else {
                continue;
            };
            let at = start.saturating_add(ticks);
            let ev = SchedEvent::new(at, EventKind::Completed)
                .on_core(placement.processor, placement.core)
                .with_task(task.id, task.remaining_ops());

            if completed {
                task.mark_completed(at);
                sink.record(&ev);
                retired.push(task);
            } else {
                sink.record(&SchedEvent {
                    kind: EventKind::Preempted,
                    ..ev
                });
                counters.preemptions += 1;
                requeue.push(task);
            }
        }

        self.clock.advance_by(span);
        let now = self.clock.now();
        for mut task in requeue {
            task.mark_enqueued(now);
            sink.record(
                &SchedEvent::new(now, EventKind::Requeued).with_task(task.id, task.remaining_ops()),
            );
            self.queue.enqueue(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskId;
    use crate::sim::{EventLog, NullSink};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn config(processors: usize, cores: usize) -> SimConfig {
        SimConfig {
            clock_hz: 1000.0,
            bandwidth: 1000.0,
            max_frame_size_bits: 100,
            ..SimConfig::default()
        }
        .with_topology(processors, cores)
        .with_quantum(3)
        .with_ops_per_tick(5)
        .with_blocking(0.0, 0)
    }

    fn run(cfg: &SimConfig, tasks: Vec<Task>, seed: u64) -> (RunReport, EventLog) {
        let mut memory: MemoryStore = tasks.into_iter().collect();
        let mut log = EventLog::unbounded();
        let report = Scheduler::new(cfg).unwrap().run(
            &mut memory,
            &mut SmallRng::seed_from_u64(seed),
            &mut log,
        );
        (report, log)
    }

    fn assigned_ids(log: &EventLog) -> Vec<TaskId> {
        log.of_kind(EventKind::Assigned).filter_map(|e| e.task).collect()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = config(1, 1).with_quantum(0);
        assert!(Scheduler::new(&cfg).is_err());
    }

    #[test]
    fn test_quantum_round_trip_count() {
        let (report, log) = run(&config(1, 1), vec![Task::new(0, 25, 10)], 0);
        assert_eq!(report.completed, 1);
        assert_eq!(report.outcome(0).unwrap().dispatches, 2);
        assert_eq!(report.preemptions, 1);
        assert_eq!(report.rounds, 2);
        // 3 ticks then 2 ticks.
        assert_eq!(report.core_busy_ticks, vec![vec![5]]);
        assert_eq!(log.of_kind(EventKind::Preempted).count(), 1);
    }

    #[test]
    fn test_transmission_delays_first_dispatch() {
        // 3 frames of 50, 60, 90 bits at 1000 bit/s and 1 kHz -> 200 ticks.
        let tasks = vec![Task::new(0, 5, 50), Task::new(1, 5, 60), Task::new(2, 5, 90)];
        let (report, log) = run(&config(1, 1), tasks, 0);
        assert_eq!(report.frame_count, 3);
        assert_eq!(report.oversized_frames, 0);
        assert_eq!(report.transmission_ticks, 200);

        let first = log.of_kind(EventKind::Assigned).next().unwrap();
        assert_eq!(first.at, 200);
        // Three 1-tick tasks on one core.
        assert_eq!(report.makespan_ticks, 203);
    }

    #[test]
    fn test_oversized_flagged() {
        let (report, log) = run(&config(1, 1), vec![Task::new(0, 5, 150)], 0);
        assert_eq!(report.oversized_frames, 1);
        assert_eq!(report.completed, 1);
        let ev = log.of_kind(EventKind::OversizedFrame).next().unwrap();
        assert_eq!(ev.task, Some(0));
    }

    #[test]
    fn test_priority_dispatched_first() {
        let tasks = vec![
            Task::new(0, 5, 8).with_priority(5),
            Task::new(1, 5, 8).with_priority(1),
            Task::new(2, 5, 8).with_priority(3),
        ];
        let (_, log) = run(&config(1, 1), tasks, 0);
        assert_eq!(assigned_ids(&log), vec![1, 2, 0]);
    }

    #[test]
    fn test_round_robin_interleaves_equal_priority() {
        // Two 30-op tasks, 15 ops per quantum, one core.
        let tasks = vec![Task::new(0, 30, 8), Task::new(1, 30, 8)];
        let (report, log) = run(&config(1, 1), tasks, 0);
        assert_eq!(assigned_ids(&log), vec![0, 1, 0, 1]);
        assert_eq!(report.preemptions, 2);
    }

    #[test]
    fn test_requeue_distinct_from_admission() {
        let tasks = vec![Task::new(0, 30, 8), Task::new(1, 30, 8)];
        let (report, log) = run(&config(1, 1), tasks, 0);
        assert_eq!(log.of_kind(EventKind::Admitted).count(), 2);
        assert_eq!(log.of_kind(EventKind::Requeued).count(), 2);
        assert!(log.of_kind(EventKind::Requeued).all(|e| e.remaining_ops == 15));
        assert_eq!(report.preemptions, 2);
    }

    #[test]
    fn test_report_carries_kpi() {
        // Link delay 16 ticks; slices run 16..19, 19..22, 22..25, 25..28.
        let tasks = vec![Task::new(0, 30, 8), Task::new(1, 30, 8)];
        let (report, _) = run(&config(1, 1), tasks, 0);
        assert_eq!(report.kpi, RunKpi::calculate(&report));
        assert_eq!(report.kpi.makespan_ticks, 28);
        assert!((report.kpi.avg_wait_ticks - 4.5).abs() < 1e-10);
        assert!((report.kpi.avg_turnaround_ticks - 10.5).abs() < 1e-10);
    }

    #[test]
    fn test_load_balancing_two_single_core_processors() {
        let tasks = (0..4).map(|i| Task::new(i, 15, 8)).collect();
        let (report, _) = run(&config(2, 1), tasks, 0);
        let busy = &report.processor_busy_ticks;
        let one_task = 3;
        assert!(busy[0].abs_diff(busy[1]) <= one_task);
        assert_eq!(busy.iter().sum::<u64>(), 12);
    }

    #[test]
    fn test_least_loaded_processor_filled_first() {
        // Round 1: P0 gets the long task, P1 the short one. Round 2 starts
        // with P1 (less busy) so the next task lands there.
        let tasks = vec![
            Task::new(0, 15, 8).with_priority(1),
            Task::new(1, 5, 8).with_priority(2),
            Task::new(2, 5, 8).with_priority(3),
        ];
        let (_, log) = run(&config(2, 1), tasks, 0);
        let placed: Vec<(Option<usize>, Option<TaskId>)> = log
            .of_kind(EventKind::Assigned)
            .map(|e| (e.processor, e.task))
            .collect();
        assert_eq!(
            placed,
            vec![(Some(0), Some(0)), (Some(1), Some(1)), (Some(1), Some(2))]
        );
    }

    #[test]
    fn test_in_order_policy() {
        let tasks = vec![
            Task::new(0, 15, 8).with_priority(1),
            Task::new(1, 5, 8).with_priority(2),
            Task::new(2, 5, 8).with_priority(3),
        ];
        let cfg = config(2, 1).with_balance_policy(BalancePolicy::InOrder);
        let (_, log) = run(&cfg, tasks, 0);
        let third = log.of_kind(EventKind::Assigned).nth(2).unwrap();
        assert_eq!(third.processor, Some(0));
    }

    #[test]
    fn test_always_blocking_still_terminates() {
        let cfg = config(1, 2).with_blocking(1.0, 50);
        let tasks = (0..5).map(|i| Task::new(i, 20, 8)).collect();
        let (report, log) = run(&cfg, tasks, 3);

        assert!(report.is_conserved());
        assert_eq!(report.completed, 5);
        assert!(report.blocks >= 5);
        assert_eq!(
            log.of_kind(EventKind::Blocked).count(),
            log.of_kind(EventKind::Unblocked).count()
        );
        // Blocking consumes no operations and no core time.
        let busy: u64 = report.processor_busy_ticks.iter().sum();
        assert_eq!(busy, 5 * 4);
    }

    #[test]
    fn test_blocked_task_waits() {
        let cfg = config(1, 1).with_blocking(1.0, 100);
        let (report, _) = run(&cfg, vec![Task::new(0, 5, 8)], 0);
        let outcome = report.outcome(0).unwrap();
        // Blocked at 8, woken at 108, one tick of work.
        assert_eq!(report.transmission_ticks, 8);
        assert_eq!(outcome.completed_at, 109);
        assert_eq!(outcome.wait_ticks, 0);
    }

    #[test]
    fn test_wake_exemption_follows_each_task() {
        // Two stored tasks may share an id; each still blocks only once.
        let cfg = config(1, 1).with_blocking(1.0, 50);
        let tasks = vec![Task::new(7, 5, 8), Task::new(7, 5, 8)];
        let (report, log) = run(&cfg, tasks, 0);
        assert_eq!(report.completed, 2);
        assert_eq!(report.blocks, 2);
        assert_eq!(log.of_kind(EventKind::Unblocked).count(), 2);
    }

    #[test]
    fn test_rebalanced_only_when_work_placed() {
        // The first pass blocks both tasks and places nothing.
        let cfg = config(1, 1).with_blocking(1.0, 50);
        let tasks = vec![Task::new(0, 5, 8), Task::new(1, 5, 8)];
        let (report, log) = run(&cfg, tasks, 0);
        assert_eq!(report.rounds, 2);
        assert_eq!(log.of_kind(EventKind::Rebalanced).count(), 2);
        let first = log.of_kind(EventKind::Rebalanced).next().unwrap();
        assert_eq!(first.at, 66);
    }

    #[test]
    fn test_saturated_link_delay() {
        let cfg = SimConfig {
            clock_hz: 1e9,
            bandwidth: 1e-20,
            ..SimConfig::default()
        }
        .with_topology(1, 1)
        .with_blocking(0.0, 0);
        let (report, _) = run(&cfg, vec![Task::new(0, 5, 8)], 0);
        assert_eq!(report.transmission_ticks, u64::MAX);
        assert_eq!(report.completed, 1);
        assert_eq!(report.outcome(0).unwrap().completed_at, u64::MAX);
        assert_eq!(report.makespan_ticks, u64::MAX);
    }

    #[test]
    fn test_saturated_blocking_wait() {
        let cfg = config(1, 1).with_blocking(1.0, u64::MAX);
        let tasks = vec![Task::new(0, 5, 8), Task::new(1, 10, 8)];
        let (report, _) = run(&cfg, tasks, 0);
        assert!(report.is_conserved());
        assert_eq!(report.blocks, 2);
        assert!(report.outcomes.iter().all(|o| o.completed_at == u64::MAX));
        assert_eq!(report.makespan_ticks, u64::MAX);
    }

    #[test]
    fn test_busy_time_monotonic_and_summed() {
        let cfg = config(2, 2);
        let tasks: Vec<Task> = (0..12).map(|i| Task::new(i, 7 + i * 3, 8)).collect();
        let (report, log) = run(&cfg, tasks, 0);

        let mut per_core = vec![vec![0u64; 2]; 2];
        let mut started = vec![vec![0u64; 2]; 2];
        for ev in log.events() {
            let (Some(p), Some(c)) = (ev.processor, ev.core) else {
                continue;
            };
            match ev.kind {
                EventKind::Assigned => started[p][c] = ev.at,
                EventKind::Completed | EventKind::Preempted => {
                    let before = per_core[p][c];
                    per_core[p][c] += ev.at - started[p][c];
                    assert!(per_core[p][c] >= before);
                }
                _ => {}
            }
        }
        assert_eq!(report.core_busy_ticks, per_core);
        assert_eq!(report.completed, 12);
    }

    #[test]
    fn test_empty_memory() {
        let (report, log) = run(&config(2, 2), Vec::new(), 0);
        assert_eq!(report.admitted, 0);
        assert_eq!(report.completed, 0);
        assert_eq!(report.makespan_ticks, 0);
        assert_eq!(log.of_kind(EventKind::RunFinished).count(), 1);
    }

    #[test]
    fn test_memory_drained() {
        let cfg = config(1, 1);
        let mut memory: MemoryStore = (0..3).map(|i| Task::new(i, 5, 8)).collect();
        Scheduler::new(&cfg)
            .unwrap()
            .run(&mut memory, &mut SmallRng::seed_from_u64(0), &mut NullSink);
        assert!(memory.is_empty());
    }
}
