//! The pedestrian agent: route, sensing and shaping wired to a host world

use nalgebra::{distance_squared, Point3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pedestrian_rl_core::{AgentError, ContinuousAction, EpisodeReward, Result, Reward, Snapshot, Terminal};

use crate::config::PedestrianConfig;
use crate::observation::{ObservationEncoder, PedestrianObservation};
use crate::reward::{Evaluation, RewardShaper};
use crate::route::{Arrival, RouteTracker};
use crate::world::{EntityId, Locomotion, SpatialQuery, Visibility};

/// Result of [`PedestrianAgent::step`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Reward for this tick
    pub reward: Reward,
    /// Whether the episode ended this tick
    pub done: bool,
    /// How it ended, `No` while running
    pub terminal: Terminal,
    /// Set when a waypoint was reached this tick
    pub arrival: Option<Arrival>,
}

impl From<Evaluation> for StepOutcome {
    fn from(eval: Evaluation) -> Self {
        Self {
            reward: eval.reward,
            done: eval.terminal.is_done(),
            terminal: eval.terminal,
            arrival: eval.arrival,
        }
    }
}

/// Snapshot of the agent's episode state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Avatar position
    pub position: Point3<f64>,
    /// Origin all observations are relative to
    pub origin: Point3<f64>,
    /// Index of the current target waypoint
    pub target_index: usize,
    /// Squared distance to the target at the end of the last tick
    pub previous_sqr_to_target: f64,
    /// Neighbour seen during the last tick
    pub previous_neighbor: Option<EntityId>,
    /// Squared distance to that neighbour
    pub previous_sqr_to_neighbor: f64,
    /// Episode outcome so far
    pub status: Terminal,
    /// Reward collected this episode
    pub cumulative_reward: f64,
}

impl Snapshot for AgentState {
    fn features(&self) -> Vec<f64> {
        vec![
            self.position.x,
            self.position.y,
            self.position.z,
            self.target_index as f64,
            self.previous_sqr_to_target,
        ]
    }

    fn is_final(&self) -> bool {
        self.status.is_terminal()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Finished(Terminal),
}

/// One agent bound to its avatar, spatial index and marker renderer.
///
/// The host calls [`reset`](Self::reset) to begin an episode, then for each
/// tick [`produce_observations`](Self::produce_observations) followed by
/// [`step`](Self::step), until `step` reports a terminal outcome.
pub struct PedestrianAgent<L, S, V> {
    avatar: L,
    spatial: S,
    markers: V,
    route: RouteTracker,
    encoder: ObservationEncoder,
    shaper: RewardShaper,
    reward: EpisodeReward,
    origin: Point3<f64>,
    neighbor: Option<EntityId>,
    phase: Phase,
    rng: StdRng,
}

impl<L, S, V> PedestrianAgent<L, S, V>
where
    L: Locomotion,
    S: SpatialQuery,
    V: Visibility,
{
    /// Bind an agent following a route of `route_len` waypoints.
    ///
    /// The avatar's current position becomes the origin for every episode.
    /// `seed` fixes route randomisation; `None` draws from OS entropy.
    /// Fails on an invalid config or an empty route.
    pub fn new(
        config: PedestrianConfig,
        route_len: usize,
        avatar: L,
        spatial: S,
        markers: V,
        seed: Option<u64>,
    ) -> Result<Self> {
        config.validate()?;
        let origin = avatar.position();
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        Ok(Self {
            avatar,
            spatial,
            markers,
            route: RouteTracker::new(route_len, config.route)?,
            encoder: ObservationEncoder::new(config.sensing),
            shaper: RewardShaper::new(config.reward, config.movement),
            reward: EpisodeReward::new(),
            origin,
            neighbor: None,
            phase: Phase::Idle,
            rng,
        })
    }

    /// Start a new episode and return its first observation
    pub fn reset(&mut self) -> PedestrianObservation {
        let target = self.route.reset(&self.origin, &mut self.rng, &mut self.markers);

        self.avatar.warp(self.origin);
        self.shaper.reset(distance_squared(&self.origin, &target));
        self.reward.reset();
        self.neighbor = None;
        self.phase = Phase::Running;
        debug!(waypoints = self.route.len(), ?target, "episode reset");

        self.produce_observations()
    }

    /// Sense the nearest neighbour and encode this tick's observation.
    ///
    /// The neighbour chosen here is the one the next [`step`](Self::step)
    /// shapes against.
    pub fn produce_observations(&mut self) -> PedestrianObservation {
        let position = self.avatar.position();
        let neighbor = self
            .encoder
            .closest_neighbor(&self.spatial, &position, self.avatar.entity_id());
        self.neighbor = neighbor.as_ref().map(|n| n.id);

        self.encoder
            .produce(&position, &self.origin, &self.route.current_target(), neighbor.as_ref())
    }

    /// Apply `action` (forward, lateral) and score the tick.
    ///
    /// Errors if no episode is running or the action is malformed; in both
    /// cases nothing changes.
    pub fn step(&mut self, action: &ContinuousAction) -> Result<StepOutcome> {
        match self.phase {
            Phase::Running => {}
            Phase::Idle => {
                return Err(AgentError::Lifecycle("step called before reset".to_string()));
            }
            Phase::Finished(outcome) => {
                return Err(AgentError::Lifecycle(format!(
                    "episode already ended ({outcome:?}); call reset"
                )));
            }
        }
        // Validate up front so a bad action cannot clear the previous tick's reward
        self.shaper.intent(action)?;

        let neighbor = self.neighbor.and_then(|id| self.spatial.entity(id));
        self.reward.begin_step();
        let eval = self.shaper.evaluate(
            action,
            &mut self.avatar,
            &mut self.route,
            &mut self.markers,
            neighbor.as_ref(),
            &mut self.reward,
        )?;

        if eval.terminal.is_terminal() {
            self.phase = Phase::Finished(eval.terminal);
        }
        Ok(eval.into())
    }

    /// Snapshot of the episode state
    #[must_use]
    pub fn state(&self) -> AgentState {
        let memory = self.shaper.memory();
        AgentState {
            position: self.avatar.position(),
            origin: self.origin,
            target_index: self.route.current_index(),
            previous_sqr_to_target: memory.sqr_to_target,
            previous_neighbor: memory.neighbor,
            previous_sqr_to_neighbor: memory.sqr_to_neighbor,
            status: self.status(),
            cumulative_reward: self.reward.cumulative().value(),
        }
    }

    /// Episode outcome so far; `No` while running or before the first reset
    #[must_use]
    pub fn status(&self) -> Terminal {
        match self.phase {
            Phase::Finished(outcome) => outcome,
            Phase::Idle | Phase::Running => Terminal::No,
        }
    }

    /// Whether an episode is in progress
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Reward for the last tick
    #[must_use]
    pub fn step_reward(&self) -> Reward {
        self.reward.step_reward()
    }

    /// Reward collected this episode
    #[must_use]
    pub fn cumulative_reward(&self) -> Reward {
        self.reward.cumulative()
    }

    /// Origin all observations are relative to
    #[must_use]
    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// The route being followed
    #[must_use]
    pub fn route(&self) -> &RouteTracker {
        &self.route
    }

    /// The avatar
    #[must_use]
    pub fn avatar(&self) -> &L {
        &self.avatar
    }

    /// Mutable access to the avatar, e.g. to move it outside of `step`
    pub fn avatar_mut(&mut self) -> &mut L {
        &mut self.avatar
    }

    /// The spatial index
    #[must_use]
    pub fn spatial(&self) -> &S {
        &self.spatial
    }

    /// Mutable access to the spatial index, e.g. to move other entities
    pub fn spatial_mut(&mut self) -> &mut S {
        &mut self.spatial
    }

    /// The marker renderer
    #[must_use]
    pub fn markers(&self) -> &V {
        &self.markers
    }
}
