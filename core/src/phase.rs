//! Month-end batch phases and the resume checkpoint

use crate::month::Month;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five ordered phases of the month-end batch. Ordering is load-bearing:
/// the snapshot must see balances before liquidation changes them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecyclePhase {
    Snapshot,
    Achievements,
    Liquidation,
    BalanceReset,
    TokenRollover,
}

impl LifecyclePhase {
    pub const ALL: [LifecyclePhase; 5] = [
        LifecyclePhase::Snapshot,
        LifecyclePhase::Achievements,
        LifecyclePhase::Liquidation,
        LifecyclePhase::BalanceReset,
        LifecyclePhase::TokenRollover,
    ];
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecyclePhase::Snapshot => "snapshot",
            LifecyclePhase::Achievements => "achievements",
            LifecyclePhase::Liquidation => "liquidation",
            LifecyclePhase::BalanceReset => "balance-reset",
            LifecyclePhase::TokenRollover => "token-rollover",
        };
        write!(f, "{}", name)
    }
}

/// Last phase the orchestrator completed for a month. A re-run for the same
/// month resumes after this phase instead of restarting blindly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LifecycleCheckpoint {
    pub month: Month,
    pub completed: LifecyclePhase,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        let phases = LifecyclePhase::ALL;
        for pair in phases.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(LifecyclePhase::Snapshot < LifecyclePhase::Liquidation);
    }
}
