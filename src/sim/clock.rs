//! Virtual clock.
//!
//! Time only moves when the controller advances it. Execution, transmission
//! and blocking delays are all expressed in ticks, so runs are reproducible
//! and take no wall-clock time.

use serde::{Deserialize, Serialize};

/// Monotonic tick counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualClock {
    now: u64,
}

impl VirtualClock {
    /// Creates a clock at tick 0.
    pub fn new() -> Self {
        Self { now: 0 }
    }

    /// Current tick.
    #[inline]
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Moves to an absolute tick. Never moves backwards.
    #[inline]
    pub fn advance_to(&mut self, t: u64) {
        debug_assert!(t >= self.now);
        self.now = self.now.max(t);
    }

    /// Moves forward by `dt` ticks, saturating on overflow.
    #[inline]
    pub fn advance_by(&mut self, dt: u64) {
        self.now = self.now.saturating_add(dt);
    }
}

/// Converts a duration in seconds to whole ticks, rounding up.
pub fn secs_to_ticks(secs: f64, clock_hz: f64) -> u64 {
    ceil_ticks(secs * clock_hz)
}

/// Ticks needed to move `bits` over a link of `bits_per_sec`, rounding up.
///
/// Computed in one step so that whole-tick transfers stay exact.
pub fn bits_to_ticks(bits: u64, bits_per_sec: f64, clock_hz: f64) -> u64 {
    if bits == 0 {
        return 0;
    }
    ceil_ticks(bits as f64 * clock_hz / bits_per_sec)
}

fn ceil_ticks(ticks: f64) -> u64 {
    let ticks = ticks.ceil();
    if ticks.is_nan() || ticks <= 0.0 {
        0
    } else if ticks >= u64::MAX as f64 {
        u64::MAX
    } else {
        ticks as u64
    }
}

/// Converts ticks to seconds.
pub fn ticks_to_secs(ticks: u64, clock_hz: f64) -> f64 {
    ticks as f64 / clock_hz
}
