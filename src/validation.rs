//! Configuration validation.
//!
//! Checks a [`SimConfig`] before any run starts. Detects:
//! - Non-positive or non-finite clock rate and bandwidth
//! - Zero quantum (run-wide or per-task TTL) and zero execution rate
//! - Blocking probability outside `[0, 1]`
//! - Empty processor pool
//! - Frames whose header leaves no room for payload
//! - Empty generation ranges and zero run counts
//!
//! All problems are collected, not just the first one.

use crate::config::SimConfig;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// `clockHz` or `bandwidth` is zero, negative, or not finite.
    NonPositiveRate,
    /// The quantum, TTL, or ops-per-tick is zero.
    ZeroQuantum,
    /// `blockingProbability` is outside `[0, 1]`.
    InvalidProbability,
    /// No processors or no cores per processor.
    EmptyTopology,
    /// The frame header consumes the whole frame.
    InvalidFrameSize,
    /// A generation range or run count is empty.
    EmptyRange,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates a simulation configuration.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_config(config: &SimConfig) -> ValidationResult {
    let mut errors = Vec::new();

    check_rate(&mut errors, "clockHz", config.clock_hz);
    check_rate(&mut errors, "bandwidth", config.bandwidth);

    if config.time_quantum_ticks == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::ZeroQuantum,
            "timeQuantumTicks must be at least 1",
        ));
    }
    if config.ttl == Some(0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::ZeroQuantum,
            "ttl must be at least 1 when set",
        ));
    }
    if config.ops_per_tick == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::ZeroQuantum,
            "opsPerTick must be at least 1",
        ));
    }

    let p = config.blocking_probability;
    if !(0.0..=1.0).contains(&p) {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidProbability,
            format!("blockingProbability must be within [0, 1], got {p}"),
        ));
    }

    if config.processor_count == 0 || config.cores_per_processor == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyTopology,
            format!(
                "processor pool is empty ({} processors x {} cores)",
                config.processor_count, config.cores_per_processor
            ),
        ));
    }

    if config.frame_capacity_bits() == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidFrameSize,
            format!(
                "frame header ({} bits) leaves no payload in a {}-bit frame",
                config.frame_header_bits, config.max_frame_size_bits
            ),
        ));
    }

    if config.max_task_size_bits == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRange,
            "maxTaskSizeBits must be at least 1",
        ));
    }
    if config.max_task_operations == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRange,
            "maxTaskOperations must be at least 1",
        ));
    }
    if config.priority_levels < 1 {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRange,
            format!("priorityLevels must be at least 1, got {}", config.priority_levels),
        ));
    }
    if config.simulation_runs == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRange,
            "simulationRuns must be at least 1",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_rate(errors: &mut Vec<ValidationError>, name: &str, value: f64) {
    // NaN fails `> 0.0` as well.
    if !(value > 0.0 && value.is_finite()) {
        errors.push(ValidationError::new(
            ValidationErrorKind::NonPositiveRate,
            format!("{name} must be positive and finite, got {value}"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(result: ValidationResult) -> Vec<ValidationErrorKind> {
        result.unwrap_err().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&SimConfig::default()).is_ok());
    }

    #[test]
    fn test_non_positive_rates() {
        let mut cfg = SimConfig::default();
        cfg.clock_hz = 0.0;
        cfg.bandwidth = -1.0;
        let k = kinds(validate_config(&cfg));
        assert_eq!(
            k,
            vec![ValidationErrorKind::NonPositiveRate, ValidationErrorKind::NonPositiveRate]
        );
    }

    #[test]
    fn test_nan_rate() {
        let mut cfg = SimConfig::default();
        cfg.clock_hz = f64::NAN;
        assert_eq!(kinds(validate_config(&cfg)), vec![ValidationErrorKind::NonPositiveRate]);
    }

    #[test]
    fn test_zero_quantum_and_ttl() {
        let mut cfg = SimConfig::default().with_quantum(0);
        cfg.ttl = Some(0);
        let k = kinds(validate_config(&cfg));
        assert_eq!(k, vec![ValidationErrorKind::ZeroQuantum, ValidationErrorKind::ZeroQuantum]);
    }

    #[test]
    fn test_probability_bounds() {
        let cfg = SimConfig::default().with_blocking(1.5, 10);
        assert_eq!(kinds(validate_config(&cfg)), vec![ValidationErrorKind::InvalidProbability]);

        let cfg = SimConfig::default().with_blocking(1.0, 10);
        assert!(validate_config(&cfg).is_ok());

        let cfg = SimConfig::default().with_blocking(f64::NAN, 10);
        assert_eq!(kinds(validate_config(&cfg)), vec![ValidationErrorKind::InvalidProbability]);
    }

    #[test]
    fn test_empty_topology() {
        let cfg = SimConfig::default().with_topology(2, 0);
        assert_eq!(kinds(validate_config(&cfg)), vec![ValidationErrorKind::EmptyTopology]);
    }

    #[test]
    fn test_header_fills_frame() {
        let mut cfg = SimConfig::default();
        cfg.max_frame_size_bits = 144;
        cfg.frame_header_bits = 144;
        assert_eq!(kinds(validate_config(&cfg)), vec![ValidationErrorKind::InvalidFrameSize]);
    }

    #[test]
    fn test_collects_all() {
        let mut cfg = SimConfig::default().with_runs(0);
        cfg.max_task_size_bits = 0;
        cfg.max_task_operations = 0;
        cfg.priority_levels = 0;
        let errors = validate_config(&cfg).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().all(|e| e.kind == ValidationErrorKind::EmptyRange));
    }
}
