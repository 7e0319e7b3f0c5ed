//! The async environment contract and an episode recorder on top of it

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Action, ActionSpace, Observation, ObservationSpace, Reward, Snapshot, Terminal};

/// What one call to [`Environment::step`] produced
#[derive(Debug, Clone)]
pub struct Transition<O, S> {
    /// Observation for the next decision
    pub observation: O,
    /// Reward earned by this tick
    pub reward: Reward,
    /// Episode outcome after this tick
    pub terminal: Terminal,
    /// Free-form diagnostics
    pub info: Info,
    /// Environment internals, when exposed
    pub snapshot: Option<S>,
}

impl<O, S> Transition<O, S> {
    /// Episode ended on its own (success or failure)
    #[must_use]
    pub fn done(&self) -> bool {
        self.terminal.is_done()
    }

    /// Episode was stopped by a step limit
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.terminal == Terminal::Truncated
    }
}

/// Diagnostics attached to resets and transitions, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Info {
    /// Entries by name
    pub entries: serde_json::Map<String, serde_json::Value>,
}

impl Info {
    /// Store `value` under `key`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Entry under `key`, if present
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }
}

/// Summary of one episode as seen by an [`EpisodeRecorder`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Random v4 id
    pub id: String,
    /// Sum of transition rewards
    pub total_reward: f64,
    /// Transitions taken
    pub ticks: usize,
    /// `No` until the episode ends
    pub outcome: Terminal,
    /// When the episode was reset
    pub started_at: DateTime<Utc>,
    /// When it ended or was abandoned
    pub finished_at: Option<DateTime<Utc>>,
}

/// Run settings shared by every environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seed for environment randomness; `None` uses OS entropy
    pub seed: Option<u64>,
    /// Ticks per episode before truncation
    pub step_limit: Option<usize>,
    /// Environment-specific sections
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// Episodic environment driven by an external loop
#[async_trait]
pub trait Environment: Send + Sync {
    /// Observation type
    type Observation: Observation;
    /// Action type
    type Action: Action;
    /// Internal state exposed on transitions
    type Snapshot: Snapshot;

    /// Space observations are drawn from
    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>>;

    /// Space actions must be drawn from
    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>>;

    /// Start a new episode
    async fn reset(&mut self) -> crate::Result<(Self::Observation, Info)>;

    /// Apply one action
    async fn step(&mut self, action: Self::Action) -> crate::Result<Transition<Self::Observation, Self::Snapshot>>;

    /// Record of the current episode, for environments that keep one
    fn episode(&self) -> Option<EpisodeRecord> {
        None
    }
}

/// Episodes an [`EpisodeRecorder`] keeps by default
pub const DEFAULT_HISTORY: usize = 100;

/// Keeps an [`EpisodeRecord`] for the current episode and the most recent
/// earlier ones of the wrapped environment
pub struct EpisodeRecorder<E> {
    /// Wrapped environment
    pub inner: E,
    /// Episode in progress
    pub current: Option<EpisodeRecord>,
    /// Earlier episodes, oldest first, at most `history` of them
    pub finished: VecDeque<EpisodeRecord>,
    history: usize,
}

impl<E> EpisodeRecorder<E> {
    /// Start recording `inner`, keeping [`DEFAULT_HISTORY`] earlier episodes
    pub fn new(inner: E) -> Self {
        Self::with_history(inner, DEFAULT_HISTORY)
    }

    /// Start recording `inner`, keeping at most `history` earlier episodes
    pub fn with_history(inner: E, history: usize) -> Self {
        Self {
            inner,
            current: None,
            finished: VecDeque::with_capacity(history),
            history,
        }
    }

    /// How many earlier episodes are kept
    #[must_use]
    pub fn history(&self) -> usize {
        self.history
    }

    fn archive(&mut self, record: EpisodeRecord) {
        if self.history == 0 {
            return;
        }
        if self.finished.len() == self.history {
            self.finished.pop_front();
        }
        self.finished.push_back(record);
    }
}

#[async_trait]
impl<E: Environment> Environment for EpisodeRecorder<E> {
    type Observation = E::Observation;
    type Action = E::Action;
    type Snapshot = E::Snapshot;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = E::Observation>> {
        self.inner.observation_space()
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = E::Action>> {
        self.inner.action_space()
    }

    async fn reset(&mut self) -> crate::Result<(E::Observation, Info)> {
        if let Some(mut previous) = self.current.take() {
            // Abandoned mid-way
            previous.finished_at.get_or_insert_with(Utc::now);
            self.archive(previous);
        }

        let record = EpisodeRecord {
            id: Uuid::new_v4().to_string(),
            total_reward: 0.0,
            ticks: 0,
            outcome: Terminal::No,
            started_at: Utc::now(),
            finished_at: None,
        };
        tracing::debug!(episode = %record.id, "episode started");
        self.current = Some(record);

        self.inner.reset().await
    }

    async fn step(&mut self, action: E::Action) -> crate::Result<Transition<E::Observation, E::Snapshot>> {
        let transition = self.inner.step(action).await?;

        if let Some(record) = self.current.as_mut() {
            record.ticks += 1;
            record.total_reward += transition.reward.value();

            if transition.terminal.is_terminal() {
                record.outcome = transition.terminal;
                record.finished_at = Some(Utc::now());
                tracing::debug!(
                    episode = %record.id,
                    outcome = ?record.outcome,
                    ticks = record.ticks,
                    total_reward = record.total_reward,
                    "episode finished"
                );
            }
        }

        Ok(transition)
    }

    fn episode(&self) -> Option<EpisodeRecord> {
        self.current.clone()
    }
}
