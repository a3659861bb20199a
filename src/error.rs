//! Library error type.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that abort a simulation.
///
/// Per-task conditions (blocking, preemption, oversized frames) are
/// recovered inside a run and only show up in telemetry.
#[derive(Debug, Error)]
pub enum SimError {
    /// The configuration failed validation; no run was started.
    #[error("invalid configuration: {}", join(.0))]
    Configuration(Vec<ValidationError>),
}

impl From<Vec<ValidationError>> for SimError {
    fn from(errors: Vec<ValidationError>) -> Self {
        SimError::Configuration(errors)
    }
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SimError>;
