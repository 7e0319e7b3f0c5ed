//! Host-facing contract for the pedestrian agent
//!
//! Actions and observations with their spaces, per-tick and per-episode
//! rewards, terminal outcomes and the async [`Environment`] trait a training
//! loop drives.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod environment;
pub mod error;
pub mod observation;
pub mod reward;
pub mod state;

pub use action::{Action, ActionSpace, BoundedSpace, ContinuousAction};
pub use environment::{
    Environment, EpisodeRecord, EpisodeRecorder, Info, RunConfig, Transition, DEFAULT_HISTORY,
};
pub use error::{AgentError, Result};
pub use observation::{BoundedObservations, FeatureVector, Observation, ObservationSpace};
pub use reward::{EpisodeReward, Reward};
pub use state::{Snapshot, Terminal};

/// Common imports for environment code
pub mod prelude {
    pub use crate::{
        Action, ActionSpace, ContinuousAction, Environment, Info, Observation, ObservationSpace, Result, Reward,
        Snapshot, Terminal, Transition,
    };
}
