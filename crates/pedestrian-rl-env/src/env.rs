//! [`Environment`] adapter so generic training loops can drive the agent

use async_trait::async_trait;

use pedestrian_rl_core::{
    ActionSpace, BoundedSpace, ContinuousAction, Environment, Info, ObservationSpace, Result, RunConfig, Transition,
};

use crate::agent::{AgentState, PedestrianAgent};
use crate::config::PedestrianConfig;
use crate::observation::{self, PedestrianObservation};
use crate::reward::ACTION_SIZE;
use crate::world::{Locomotion, SpatialQuery, Visibility};

/// Pedestrian agent exposed through the async environment contract
pub struct PedestrianEnv<L, S, V> {
    agent: PedestrianAgent<L, S, V>,
}

impl<L, S, V> PedestrianEnv<L, S, V>
where
    L: Locomotion,
    S: SpatialQuery,
    V: Visibility,
{
    /// Build from run settings.
    ///
    /// Agent settings come from `params["pedestrian"]` (defaults otherwise)
    /// and `seed` fixes route randomisation.
    pub fn new(run_config: &RunConfig, route_len: usize, avatar: L, spatial: S, markers: V) -> Result<Self> {
        let config = PedestrianConfig::from_params(run_config)?;
        let agent = PedestrianAgent::new(config, route_len, avatar, spatial, markers, run_config.seed)?;
        Ok(Self { agent })
    }

    /// Wrap an already constructed agent
    pub fn from_agent(agent: PedestrianAgent<L, S, V>) -> Self {
        Self { agent }
    }

    /// The wrapped agent
    pub fn agent(&self) -> &PedestrianAgent<L, S, V> {
        &self.agent
    }

    /// Mutable access to the wrapped agent
    pub fn agent_mut(&mut self) -> &mut PedestrianAgent<L, S, V> {
        &mut self.agent
    }

    fn info(&self) -> Info {
        let mut info = Info::default();
        info.insert("target_index", self.agent.route().current_index());
        info.insert("cumulative_reward", self.agent.cumulative_reward().value());
        info
    }
}

#[async_trait]
impl<L, S, V> Environment for PedestrianEnv<L, S, V>
where
    L: Locomotion + Send + Sync,
    S: SpatialQuery + Send + Sync,
    V: Visibility + Send + Sync,
{
    type Observation = PedestrianObservation;
    type Action = ContinuousAction;
    type Snapshot = AgentState;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        Box::new(observation::observation_space())
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        Box::new(BoundedSpace::unit(ACTION_SIZE))
    }

    async fn reset(&mut self) -> Result<(Self::Observation, Info)> {
        let observation = self.agent.reset();
        Ok((observation, self.info()))
    }

    async fn step(&mut self, action: Self::Action) -> Result<Transition<Self::Observation, Self::Snapshot>> {
        let outcome = self.agent.step(&action)?;
        let observation = self.agent.produce_observations();

        let mut info = self.info();
        if let Some(arrival) = outcome.arrival {
            info.insert("arrival", serde_json::to_value(arrival)?);
        }

        Ok(Transition {
            observation,
            reward: outcome.reward,
            terminal: outcome.terminal,
            info,
            snapshot: Some(self.agent.state()),
        })
    }
}
