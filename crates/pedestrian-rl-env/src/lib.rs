//! Waypoint-following pedestrian agent
//!
//! The agent walks a randomised chain of waypoints around its spawn point,
//! senses the closest other pedestrian and shapes its reward around
//! progress, waypoint arrival and personal space. The host world is reached
//! through the traits in [`world`]; [`sim`] provides in-memory versions.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod config;
pub mod env;
pub mod observation;
pub mod reward;
pub mod route;
pub mod sim;
pub mod world;
pub mod wrappers;

pub use agent::{AgentState, PedestrianAgent, StepOutcome};
pub use config::{MovementConfig, PedestrianConfig, RewardConfig, RouteConfig, SensingConfig, ARRIVAL_SQR_RADIUS};
pub use env::PedestrianEnv;
pub use observation::{ObservationEncoder, PedestrianObservation, NO_NEIGHBOR, OBSERVATION_SIZE};
pub use reward::{Evaluation, RewardShaper, ShapingMemory, ACTION_SIZE};
pub use route::{Arrival, RouteTracker, Waypoint};
pub use sim::{Crowd, KinematicAvatar, MarkerBoard};
pub use world::{EntityId, EntityKind, EntitySnapshot, Locomotion, SpatialQuery, Visibility, WaypointId};
pub use wrappers::TimeLimit;

// Re-export core types
pub use pedestrian_rl_core::{
    AgentError, ContinuousAction, Environment, EpisodeRecord, EpisodeRecorder, Info, Result, Reward, RunConfig,
    Terminal, Transition,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Crowd, KinematicAvatar, Locomotion, MarkerBoard, PedestrianAgent, PedestrianConfig, PedestrianEnv,
        SpatialQuery, TimeLimit, Visibility,
    };
    pub use pedestrian_rl_core::prelude::*;
}
