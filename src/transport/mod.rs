//! Bandwidth-limited framing layer.
//!
//! Packs tasks into capacity-bounded frames and computes how long the
//! frames take to cross the link.
//!
//! # Algorithm
//!
//! Greedy first-fit by arrival:
//! 1. Examine tasks in arrival order.
//! 2. Append the task to the open frame if `occupied + size <= capacity`.
//! 3. Otherwise seal the open frame and start a new one with the task.
//!
//! Tasks are never reordered or split. A task larger than the capacity is
//! sent alone in its own oversized frame.
//!
//! # Complexity
//! O(n) in the number of tasks.

use crate::models::{Frame, Task};
use crate::sim::bits_to_ticks;

/// Result of pushing a task batch across the link.
#[derive(Debug, Clone)]
pub struct Transmission {
    /// Sealed frames in transmission order.
    pub frames: Vec<Frame>,
    /// Total bits on the wire, headers included.
    pub wire_bits: u64,
    /// Link delay (seconds).
    pub delay_secs: f64,
    /// Link bandwidth (bits per second).
    pub bandwidth_bps: f64,
}

impl Transmission {
    /// Number of frames that carry a single oversized task.
    pub fn oversized_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_oversized()).count()
    }

    /// Link delay in virtual ticks, rounded up.
    pub fn delay_ticks(&self, clock_hz: f64) -> u64 {
        bits_to_ticks(self.wire_bits, self.bandwidth_bps, clock_hz)
    }
}

/// Frame packer for a link of fixed bandwidth.
#[derive(Debug, Clone)]
pub struct FrameAggregator {
    max_frame_size_bits: u64,
    header_bits: u64,
    bandwidth_bps: f64,
}

impl FrameAggregator {
    /// Creates an aggregator with no header overhead.
    pub fn new(max_frame_size_bits: u64, bandwidth_bps: f64) -> Self {
        Self {
            max_frame_size_bits,
            header_bits: 0,
            bandwidth_bps,
        }
    }

    /// Reserves `header_bits` of every frame for headers.
    pub fn with_header(mut self, header_bits: u64) -> Self {
        self.header_bits = header_bits;
        self
    }

    /// Payload capacity of one frame (bits).
    pub fn capacity_bits(&self) -> u64 {
        self.max_frame_size_bits.saturating_sub(self.header_bits)
    }

    /// Packs tasks into frames in arrival order.
    pub fn build_frames(&self, tasks: Vec<Task>) -> Vec<Frame> {
        let capacity = self.capacity_bits();
        let mut frames = Vec::new();
        let mut open: Vec<Task> = Vec::new();
        let mut occupied: u64 = 0;

        for task in tasks {
            let fits = occupied
                .checked_add(task.size_bits)
                .is_some_and(|total| total <= capacity);

            if !fits && !open.is_empty() {
                frames.push(Frame::seal(
                    frames.len(),
                    std::mem::take(&mut open),
                    self.header_bits,
                    capacity,
                ));
                occupied = 0;
            }

            if task.size_bits > capacity {
                log::warn!(
                    "task {} ({} bits) exceeds frame capacity of {} bits; sending alone",
                    task.id,
                    task.size_bits,
                    capacity
                );
                frames.push(Frame::seal(frames.len(), vec![task], self.header_bits, capacity));
                continue;
            }

            occupied += task.size_bits;
            open.push(task);
        }

        if !open.is_empty() {
            frames.push(Frame::seal(frames.len(), open, self.header_bits, capacity));
        }

        frames
    }

    /// Link delay for `frames` (seconds): total wire bits over bandwidth.
    pub fn transmission_delay(&self, frames: &[Frame]) -> f64 {
        let bits: u64 = frames.iter().map(Frame::wire_bits).sum();
        bits as f64 / self.bandwidth_bps
    }

    /// Packs tasks and computes the link delay in one step.
    pub fn transmit(&self, tasks: Vec<Task>) -> Transmission {
        let frames = self.build_frames(tasks);
        let wire_bits = frames.iter().map(Frame::wire_bits).sum();
        let delay_secs = self.transmission_delay(&frames);
        log::debug!(
            "{} frames, {} bits on the wire, {:.3e}s link delay",
            frames.len(),
            wire_bits,
            delay_secs
        );
        Transmission {
            frames,
            wire_bits,
            delay_secs,
            bandwidth_bps: self.bandwidth_bps,
        }
    }
}
