//! Dispatch ordering.
//!
//! Two orderings decide who runs where in each dispatch round:
//!
//! - **Tasks**: [`ReadyQueue`] releases tasks by `(priority, sequence)`,
//!   lower priority value first, FIFO among equals.
//! - **Processors**: [`BalancePolicy`] ranks processors, by default
//!   least cumulative busy time first, so idle cores on lightly loaded
//!   processors are filled before those on busy ones.
//!
//! # Usage
//!
//! ```
//! use u_preempt::dispatching::{BalancePolicy, ReadyQueue};
//! use u_preempt::models::Task;
//!
//! let queue = ReadyQueue::new();
//! queue.enqueue(Task::new(0, 40, 64).with_priority(3));
//!
//! let order = BalancePolicy::LeastLoaded.rank(&[120, 80]);
//! assert_eq!(order, vec![1, 0]);
//! assert_eq!(queue.len(), 1);
//! ```

mod balance;
mod queue;

pub use balance::BalancePolicy;
pub use queue::ReadyQueue;
