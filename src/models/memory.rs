//! Memory store.
//!
//! Address-keyed holding area for generated tasks before they are framed
//! and transmitted. Draining the store hands ownership of every task to
//! the caller and leaves the store empty.

use std::collections::BTreeMap;

use super::Task;

/// Task storage keyed by address.
///
/// Iteration and draining follow ascending address order, so the order in
/// which tasks were stored at increasing addresses is the order in which
/// they reach the frame aggregator.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    ram: BTreeMap<u64, Task>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a task at `address`, returning any task it displaced.
    pub fn add_task(&mut self, address: u64, task: Task) -> Option<Task> {
        self.ram.insert(address, task)
    }

    /// Removes and returns the task at `address`.
    pub fn remove_task(&mut self, address: u64) -> Option<Task> {
        self.ram.remove(&address)
    }

    /// Borrows the task at `address`.
    pub fn get_task(&self, address: u64) -> Option<&Task> {
        self.ram.get(&address)
    }

    /// Takes every task out of the store in address order.
    pub fn drain(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.ram).into_values().collect()
    }

    /// Drops every stored task.
    pub fn clear(&mut self) {
        self.ram.clear();
    }

    /// Number of stored tasks.
    pub fn len(&self) -> usize {
        self.ram.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.ram.is_empty()
    }
}

impl FromIterator<Task> for MemoryStore {
    /// Stores tasks at consecutive addresses starting from 0.
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self {
            ram: iter
                .into_iter()
                .enumerate()
                .map(|(i, t)| (i as u64, t))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_get_remove() {
        let mut mem = MemoryStore::new();
        assert!(mem.add_task(4, Task::new(1, 10, 8)).is_none());
        assert_eq!(mem.get_task(4).map(|t| t.id), Some(1));

        let displaced = mem.add_task(4, Task::new(2, 10, 8));
        assert_eq!(displaced.map(|t| t.id), Some(1));

        assert_eq!(mem.remove_task(4).map(|t| t.id), Some(2));
        assert!(mem.is_empty());
    }

    #[test]
    fn test_drain_in_address_order() {
        let mut mem = MemoryStore::new();
        mem.add_task(2, Task::new(20, 1, 1));
        mem.add_task(0, Task::new(0, 1, 1));
        mem.add_task(1, Task::new(10, 1, 1));

        let ids: Vec<_> = mem.drain().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 10, 20]);
        assert!(mem.is_empty());
    }

    #[test]
    fn test_from_iter() {
        let mem: MemoryStore = (0..3).map(|i| Task::new(i, 1, 1)).collect();
        assert_eq!(mem.len(), 3);
        assert_eq!(mem.get_task(2).map(|t| t.id), Some(2));
    }
}
