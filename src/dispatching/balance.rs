//! Processor ranking for dispatch rounds.

use serde::{Deserialize, Serialize};

/// How processors are ordered when idle cores are filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalancePolicy {
    /// Least cumulative busy time first; ties by processor index.
    #[default]
    LeastLoaded,
    /// Fixed processor index order.
    InOrder,
}

impl BalancePolicy {
    /// Returns processor indices in dispatch order.
    ///
    /// `loads[i]` is processor `i`'s cumulative busy time. The ranking is a
    /// snapshot; it may be slightly stale by the time cores are filled.
    pub fn rank(&self, loads: &[u64]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..loads.len()).collect();
        match self {
            // Stable sort keeps index order among equal loads.
            BalancePolicy::LeastLoaded => order.sort_by_key(|&i| loads[i]),
            BalancePolicy::InOrder => {}
        }
        order
    }

    /// Policy name.
    pub fn name(&self) -> &'static str {
        match self {
            BalancePolicy::LeastLoaded => "least-loaded",
            BalancePolicy::InOrder => "in-order",
        }
    }
}
