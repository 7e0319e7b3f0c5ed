//! Environment wrappers

use async_trait::async_trait;

use pedestrian_rl_core::{
    ActionSpace, Environment, EpisodeRecord, Info, ObservationSpace, Result, Terminal, Transition,
};

/// Truncates episodes that run for `limit` ticks without ending
pub struct TimeLimit<E> {
    /// Wrapped environment
    pub inner: E,
    /// Ticks allowed per episode
    pub limit: usize,
    /// Ticks taken in the current episode
    pub elapsed: usize,
}

impl<E> TimeLimit<E> {
    /// Wrap `inner`, allowing `limit` ticks per episode
    pub fn new(inner: E, limit: usize) -> Self {
        Self {
            inner,
            limit,
            elapsed: 0,
        }
    }
}

#[async_trait]
impl<E: Environment> Environment for TimeLimit<E> {
    type Observation = E::Observation;
    type Action = E::Action;
    type Snapshot = E::Snapshot;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = E::Observation>> {
        self.inner.observation_space()
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = E::Action>> {
        self.inner.action_space()
    }

    async fn reset(&mut self) -> Result<(E::Observation, Info)> {
        self.elapsed = 0;
        self.inner.reset().await
    }

    async fn step(&mut self, action: E::Action) -> Result<Transition<E::Observation, E::Snapshot>> {
        // Rejected actions do not spend the budget
        let mut transition = self.inner.step(action).await?;
        self.elapsed += 1;

        if self.elapsed >= self.limit && !transition.terminal.is_terminal() {
            transition.terminal = Terminal::Truncated;
            tracing::debug!(elapsed = self.elapsed, "episode truncated");
        }

        Ok(transition)
    }

    fn episode(&self) -> Option<EpisodeRecord> {
        self.inner.episode()
    }
}
