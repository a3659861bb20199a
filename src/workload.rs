//! Random workload generation.
//!
//! Draws task sizes, operation counts, and priorities uniformly from the
//! configured ranges. All randomness comes from a caller-supplied RNG, so a
//! seeded `SmallRng` reproduces the same workload.

use rand::Rng;

use crate::config::SimConfig;
use crate::models::{MemoryStore, Task, TaskId};

/// Uniform task generator.
#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    max_size_bits: u64,
    max_operations: u64,
    priority_levels: i32,
    ttl: Option<u32>,
}

impl WorkloadGenerator {
    /// Creates a generator drawing from the ranges in `config`.
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            max_size_bits: config.max_task_size_bits.max(1),
            max_operations: config.max_task_operations.max(1),
            priority_levels: config.priority_levels.max(1),
            ttl: config.ttl,
        }
    }

    /// Generates one task: size in `1..=max_size_bits`, operations in
    /// `1..=max_operations`, priority in `1..=priority_levels`.
    pub fn generate<R: Rng>(&self, id: TaskId, rng: &mut R) -> Task {
        let size_bits = rng.random_range(1..=self.max_size_bits);
        let operations = rng.random_range(1..=self.max_operations);
        let priority = rng.random_range(1..=self.priority_levels);

        let task = Task::new(id, operations, size_bits).with_priority(priority);
        match self.ttl {
            Some(ttl) => task.with_quantum(ttl),
            None => task,
        }
    }

    /// Generates `count` tasks with ids `0..count` into a fresh memory store.
    pub fn fill_memory<R: Rng>(&self, count: usize, rng: &mut R) -> MemoryStore {
        let mut memory = MemoryStore::new();
        for i in 0..count as u64 {
            memory.add_task(i, self.generate(i, rng));
        }
        memory
    }
}
