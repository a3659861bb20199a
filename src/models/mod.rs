//! Simulation domain models.
//!
//! Provides the data types that move through a run: tasks, the frames that
//! carry them over the simulated link, and the memory store they are
//! generated into.
//!
//! # Ownership
//!
//! | Stage | Owner |
//! |-------|-------|
//! | Generated | `MemoryStore` |
//! | In transit | `Frame` |
//! | Admitted | `ReadyQueue` |
//! | Executing | `Core` |
//!
//! A task is moved between owners, never shared.

mod frame;
mod memory;
mod task;

pub use frame::Frame;
pub use memory::MemoryStore;
pub use task::{Task, TaskId, TaskStatus};
