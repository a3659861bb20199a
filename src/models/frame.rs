//! Frame model.
//!
//! A frame is a sealed batch of tasks modeling one network transmission
//! unit. Its payload never exceeds the aggregator's capacity, except for a
//! frame holding a single oversized task.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Task;

/// A sealed, capacity-bounded batch of tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Sequential frame identifier within one transmission.
    pub id: usize,
    /// Tasks in arrival order.
    tasks: Vec<Task>,
    /// Sum of task payload sizes (bits).
    payload_bits: u64,
    /// Fixed header overhead carried on the wire (bits).
    header_bits: u64,
    /// Whether this frame holds a single task larger than the capacity.
    oversized: bool,
}

impl Frame {
    pub(crate) fn seal(id: usize, tasks: Vec<Task>, header_bits: u64, capacity_bits: u64) -> Self {
        let payload_bits = tasks.iter().map(|t| t.size_bits).sum();
        let oversized = payload_bits > capacity_bits;
        debug_assert!(!oversized || tasks.len() == 1);
        Self {
            id,
            tasks,
            payload_bits,
            header_bits,
            oversized,
        }
    }

    /// Tasks in arrival order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks carried.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Sum of task payload sizes (bits).
    pub fn payload_bits(&self) -> u64 {
        self.payload_bits
    }

    /// Payload plus header overhead (bits).
    pub fn wire_bits(&self) -> u64 {
        self.payload_bits + self.header_bits
    }

    /// Whether this frame exceeds capacity because of a single large task.
    pub fn is_oversized(&self) -> bool {
        self.oversized
    }

    /// Consumes the frame and releases its tasks in arrival order.
    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame {} ({} tasks, {} bits",
            self.id,
            self.tasks.len(),
            self.payload_bits
        )?;
        if self.oversized {
            f.write_str(", oversized")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_sums_payload() {
        let frame = Frame::seal(0, vec![Task::new(0, 5, 40), Task::new(1, 5, 50)], 16, 100);
        assert_eq!(frame.payload_bits(), 90);
        assert_eq!(frame.wire_bits(), 106);
        assert_eq!(frame.task_count(), 2);
        assert!(!frame.is_oversized());
    }

    #[test]
    fn test_oversized_single() {
        let frame = Frame::seal(3, vec![Task::new(9, 5, 150)], 0, 100);
        assert!(frame.is_oversized());
        assert_eq!(frame.to_string(), "Frame 3 (1 tasks, 150 bits, oversized)");

        let tasks = frame.into_tasks();
        assert_eq!(tasks[0].id, 9);
    }
}
