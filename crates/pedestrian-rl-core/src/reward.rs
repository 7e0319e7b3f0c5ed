//! Reward signals and per-episode reward accumulation

use serde::{Deserialize, Serialize};

/// Scalar reward for one tick
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reward(pub f64);

impl Reward {
    /// Wrap a raw value
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Raw value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Reward {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl std::ops::Add for Reward {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign<f64> for Reward {
    fn add_assign(&mut self, rhs: f64) {
        self.0 += rhs;
    }
}

/// Running reward for one episode, split into the current tick and the
/// ticks already settled.
///
/// `add` accumulates into the current tick. `set` overrides the current
/// tick's reward outright, so a terminal reward replaces whatever the tick
/// had collected so far without touching earlier ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeReward {
    settled: f64,
    step: f64,
}

impl EpisodeReward {
    /// Empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Settle the current tick and start a new one
    pub fn begin_step(&mut self) {
        self.settled += self.step;
        self.step = 0.0;
    }

    /// Add `delta` to the current tick
    pub fn add(&mut self, delta: f64) {
        self.step += delta;
    }

    /// Replace the current tick's reward with `value`
    pub fn set(&mut self, value: f64) {
        self.step = value;
    }

    /// Reward collected during the current tick
    #[must_use]
    pub fn step_reward(&self) -> Reward {
        Reward(self.step)
    }

    /// Reward collected since the last [`reset`](Self::reset)
    #[must_use]
    pub fn cumulative(&self) -> Reward {
        Reward(self.settled + self.step)
    }

    /// Clear both the tick and the episode total
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
