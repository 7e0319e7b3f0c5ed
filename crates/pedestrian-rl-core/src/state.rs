//! Episode outcomes and inspectable agent snapshots

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Internal state an environment may expose alongside a transition
pub trait Snapshot: Clone + Debug + Send + Sync {
    /// Numeric summary, for logging or value baselines
    fn features(&self) -> Vec<f64>;

    /// Whether the snapshot was taken after the episode ended
    fn is_final(&self) -> bool {
        false
    }
}

/// How a tick left the episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    /// Still running
    #[default]
    No,
    /// Final waypoint reached
    Success,
    /// Left the allowed area
    Failure,
    /// Stopped by a step limit
    Truncated,
}

impl Terminal {
    /// Any outcome other than `No`
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        *self != Self::No
    }

    /// Ended by the agent itself, not by a limit
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}
