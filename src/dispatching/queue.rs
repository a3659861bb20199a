//! Thread-safe ready queue.
//!
//! Orders tasks by `(priority, sequence)`: lower priority values first,
//! and among equal priorities, the task admitted earlier first. The
//! sequence number is assigned at enqueue time, so a requeued task goes
//! behind every equal-priority task already waiting.

use parking_lot::Mutex;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::models::Task;

/// Composite ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueueKey {
    priority: i32,
    sequence: u64,
}

#[derive(Debug)]
struct Entry {
    key: QueueKey,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

#[derive(Debug, Default)]
struct Inner {
    heap: BinaryHeap<Reverse<Entry>>,
    next_sequence: u64,
}

/// Priority queue of tasks awaiting a core.
///
/// Every operation runs under one mutex, so concurrent producers and
/// consumers never lose or duplicate a task.
///
/// # Example
/// ```
/// use u_preempt::dispatching::ReadyQueue;
/// use u_preempt::models::Task;
///
/// let queue = ReadyQueue::new();
/// queue.enqueue(Task::new(1, 10, 8).with_priority(5));
/// queue.enqueue(Task::new(2, 10, 8).with_priority(1));
/// assert_eq!(queue.dequeue().map(|t| t.id), Some(2));
/// ```
#[derive(Debug, Default)]
pub struct ReadyQueue {
    inner: Mutex<Inner>,
}

impl ReadyQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a task and returns the sequence number it was given.
    pub fn enqueue(&self, task: Task) -> u64 {
        let mut inner = self.inner.lock();
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        let key = QueueKey {
            priority: task.priority,
            sequence,
        };
        inner.heap.push(Reverse(Entry { key, task }));
        sequence
    }

    /// Removes the most important task, or `None` when the queue is empty.
    pub fn dequeue(&self) -> Option<Task> {
        self.inner.lock().heap.pop().map(|Reverse(e)| e.task)
    }

    /// Priority of the task `dequeue` would return next.
    pub fn peek_priority(&self) -> Option<i32> {
        self.inner.lock().heap.peek().map(|Reverse(e)| e.key.priority)
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    /// Whether no task is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }

    /// Total sequence numbers handed out so far.
    pub fn admissions(&self) -> u64 {
        self.inner.lock().next_sequence
    }
}
