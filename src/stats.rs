//! Cross-run busy-time statistics.
//!
//! Each run contributes one vector of per-processor busy times (seconds).
//! The collector reports the spread inside each run as it arrives, and
//! once all runs are in, the mean, population variance, and standard
//! deviation per processor and pooled over every value.

use serde::{Deserialize, Serialize};

/// Mean, population variance, and standard deviation of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Number of values.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population variance (divides by `count`).
    pub variance: f64,
    /// Square root of the variance.
    pub std_dev: f64,
}

impl Summary {
    /// Summarizes `values`. An empty slice yields all zeros.
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            count: values.len(),
            mean,
            variance,
            std_dev: variance.sqrt(),
        }
    }
}

/// Busy times of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Zero-based run index.
    pub run_index: usize,
    /// Busy time per processor (seconds).
    pub busy_times: Vec<f64>,
}

impl RunRecord {
    /// Spread of busy time across the processors of this run.
    pub fn spread(&self) -> Summary {
        Summary::of(&self.busy_times)
    }
}

/// Statistics over every recorded run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Number of runs.
    pub runs: usize,
    /// For each processor index, its busy time across runs.
    pub per_processor: Vec<Summary>,
    /// Every busy-time value of every run, pooled.
    pub pooled: Summary,
}

/// Receiver of run statistics.
pub trait MetricsSink {
    /// Called once per run with the raw vector and its spread.
    fn report_run(&mut self, record: &RunRecord, spread: &Summary);

    /// Called once after the last run.
    fn report_summary(&mut self, _stats: &AggregateStats) {}
}

/// Reports statistics through the `log` facade at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMetricsSink;

impl MetricsSink for LogMetricsSink {
    fn report_run(&mut self, record: &RunRecord, spread: &Summary) {
        log::info!(
            "run {}: busy times {:?}, mean {:.4e}, variance {:.4e}, std dev {:.4e}",
            record.run_index + 1,
            record.busy_times,
            spread.mean,
            spread.variance,
            spread.std_dev
        );
    }

    fn report_summary(&mut self, stats: &AggregateStats) {
        for (p, s) in stats.per_processor.iter().enumerate() {
            log::info!(
                "processor {}: mean {:.4e}, variance {:.4e}, std dev {:.4e} over {} runs",
                p,
                s.mean,
                s.variance,
                s.std_dev,
                s.count
            );
        }
        log::info!(
            "pooled over {} runs: mean {:.4e}, std dev {:.4e}",
            stats.runs,
            stats.pooled.mean,
            stats.pooled.std_dev
        );
    }
}

/// Accumulates run records.
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    records: Vec<RunRecord>,
}

impl StatsCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the busy times of run `run_index` and returns the record.
    pub fn record(&mut self, run_index: usize, busy_times: Vec<f64>) -> &RunRecord {
        self.records.push(RunRecord {
            run_index,
            busy_times,
        });
        &self.records[self.records.len() - 1]
    }

    /// Stores a run and forwards it to `sink`.
    pub fn record_and_report(
        &mut self,
        run_index: usize,
        busy_times: Vec<f64>,
        sink: &mut dyn MetricsSink,
    ) {
        let record = self.record(run_index, busy_times);
        sink.report_run(record, &record.spread());
    }

    /// Recorded runs in insertion order.
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Number of recorded runs.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no run has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Computes statistics over every recorded run.
    ///
    /// Runs with fewer processors simply contribute nothing to the missing
    /// indices.
    pub fn summarize(&self) -> AggregateStats {
        let width = self
            .records
            .iter()
            .map(|r| r.busy_times.len())
            .max()
            .unwrap_or(0);
        let per_processor = (0..width)
            .map(|p| {
                let column: Vec<f64> = self
                    .records
                    .iter()
                    .filter_map(|r| r.busy_times.get(p).copied())
                    .collect();
                Summary::of(&column)
            })
            .collect();
        let pooled: Vec<f64> = self
            .records
            .iter()
            .flat_map(|r| r.busy_times.iter().copied())
            .collect();

        AggregateStats {
            runs: self.records.len(),
            per_processor,
            pooled: Summary::of(&pooled),
        }
    }

    /// Computes the aggregate, forwards it to `sink`, and returns it.
    pub fn finish(&self, sink: &mut dyn MetricsSink) -> AggregateStats {
        let stats = self.summarize();
        sink.report_summary(&stats);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Capture {
        runs: Vec<(usize, Summary)>,
        summary: Option<AggregateStats>,
    }

    impl MetricsSink for Capture {
        fn report_run(&mut self, record: &RunRecord, spread: &Summary) {
            self.runs.push((record.run_index, *spread));
        }

        fn report_summary(&mut self, stats: &AggregateStats) {
            self.summary = Some(stats.clone());
        }
    }

    #[test]
    fn test_summary_population() {
        let s = Summary::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.count, 8);
        assert!((s.mean - 5.0).abs() < 1e-12);
        assert!((s.variance - 4.0).abs() < 1e-12);
        assert!((s.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_summary_empty_and_single() {
        assert_eq!(Summary::of(&[]), Summary::default());
        let s = Summary::of(&[3.5]);
        assert!((s.mean - 3.5).abs() < 1e-12);
        assert_eq!(s.variance, 0.0);
    }

    #[test]
    fn test_per_processor_and_pooled() {
        let mut c = StatsCollector::new();
        c.record(0, vec![1.0, 3.0]);
        c.record(1, vec![3.0, 5.0]);
        let stats = c.summarize();

        assert_eq!(stats.runs, 2);
        assert!((stats.per_processor[0].mean - 2.0).abs() < 1e-12);
        assert!((stats.per_processor[0].variance - 1.0).abs() < 1e-12);
        assert!((stats.per_processor[1].mean - 4.0).abs() < 1e-12);
        assert!((stats.pooled.mean - 3.0).abs() < 1e-12);
        assert!((stats.pooled.variance - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_ragged_runs() {
        let mut c = StatsCollector::new();
        c.record(0, vec![1.0]);
        c.record(1, vec![1.0, 4.0]);
        let stats = c.summarize();
        assert_eq!(stats.per_processor.len(), 2);
        assert_eq!(stats.per_processor[0].count, 2);
        assert_eq!(stats.per_processor[1].count, 1);
    }

    #[test]
    fn test_forwarding() {
        let mut c = StatsCollector::new();
        let mut sink = Capture::default();
        c.record_and_report(0, vec![2.0, 4.0], &mut sink);
        c.record_and_report(1, vec![6.0, 6.0], &mut sink);
        let stats = c.finish(&mut sink);

        assert_eq!(sink.runs.len(), 2);
        assert!((sink.runs[0].1.mean - 3.0).abs() < 1e-12);
        assert!((sink.runs[0].1.std_dev - 1.0).abs() < 1e-12);
        assert_eq!(sink.runs[1].1.variance, 0.0);
        assert_eq!(sink.summary, Some(stats));
        assert_eq!(c.len(), 2);
    }
}
