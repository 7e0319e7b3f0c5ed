//! Tunable constants for route layout, sensing, reward shaping and movement
//!
//! Every field defaults to the values the agent was trained with, so an
//! empty TOML document or an empty `params` map yields the stock behaviour.

use serde::{Deserialize, Serialize};

use pedestrian_rl_core::{AgentError, Result, RunConfig};

use crate::world::EntityKind;

/// Squared distance under which the agent counts as standing on its target.
///
/// Deliberately not part of [`PedestrianConfig`].
pub const ARRIVAL_SQR_RADIUS: f64 = 2.25;

/// Complete agent configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PedestrianConfig {
    /// Waypoint randomisation
    pub route: RouteConfig,
    /// Neighbour sensing and observation scaling
    pub sensing: SensingConfig,
    /// Reward shaping weights and thresholds
    pub reward: RewardConfig,
    /// Action-to-motion conversion
    pub movement: MovementConfig,
}

/// How waypoints are scattered at episode reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Half-width of the X/Z box around the origin for the first waypoint
    pub first_spread: f64,
    /// Height of the first waypoint above the origin
    pub first_height: f64,
    /// Half-width of the X/Z box around the previous waypoint for the rest
    pub step_spread: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            first_spread: 3.0,
            first_height: 0.5,
            step_spread: 5.0,
        }
    }
}

/// Neighbour detection and observation normalisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensingConfig {
    /// Radius of the neighbour query around the agent
    pub radius: f64,
    /// Entities of this kind count as neighbours
    pub neighbor_kind: EntityKind,
    /// Divisor applied to origin-relative coordinates
    pub position_scale: f64,
    /// Divisor applied to neighbour heading in degrees
    pub heading_scale: f64,
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            radius: 25.0,
            neighbor_kind: EntityKind::Pedestrian,
            position_scale: 50.0,
            heading_scale: 360.0,
        }
    }
}

/// Reward shaping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Added every tick
    pub time_penalty: f64,
    /// Added when the squared distance to the target shrank
    pub progress_bonus: f64,
    /// Added on reaching an intermediate waypoint
    pub waypoint_bonus: f64,
    /// Tick reward when the final waypoint is reached
    pub success_reward: f64,
    /// Tick reward when the agent strays out of bounds
    pub failure_reward: f64,
    /// Squared distance to the target beyond which the episode fails
    pub out_of_bounds_sqr: f64,
    /// Squared neighbour distance inside which the proximity term applies
    pub proximity_band_sqr: f64,
    /// Scale of the proximity term
    pub proximity_coefficient: f64,
    /// Squared neighbour distance counted as a collision
    pub collision_sqr: f64,
    /// Added on collision
    pub collision_penalty: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            time_penalty: -0.0003,
            progress_bonus: 0.0001,
            waypoint_bonus: 0.1,
            success_reward: 1.0,
            failure_reward: -1.0,
            out_of_bounds_sqr: 225.0,
            proximity_band_sqr: 225.0,
            proximity_coefficient: 0.0001,
            collision_sqr: 1.0,
            collision_penalty: -0.005,
        }
    }
}

/// Conversion of policy output into a locomotion intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Length of the intent vector handed to locomotion
    pub speed: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self { speed: 0.4 }
    }
}

impl PedestrianConfig {
    /// Parse a TOML document; missing sections and fields take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| AgentError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read the `pedestrian` entry of an environment's free-form params
    pub fn from_params(run_config: &RunConfig) -> Result<Self> {
        let config = match run_config.params.get("pedestrian") {
            Some(value) => serde_json::from_value(value.clone())?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the agent's geometry meaningless
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("route.first_spread", self.route.first_spread),
            ("route.step_spread", self.route.step_spread),
            ("sensing.radius", self.sensing.radius),
            ("sensing.position_scale", self.sensing.position_scale),
            ("sensing.heading_scale", self.sensing.heading_scale),
            ("reward.proximity_band_sqr", self.reward.proximity_band_sqr),
            ("reward.collision_sqr", self.reward.collision_sqr),
            ("movement.speed", self.movement.speed),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AgentError::Config(format!("{name} must be positive, got {value}")));
            }
        }

        let finite = [
            ("route.first_height", self.route.first_height),
            ("reward.time_penalty", self.reward.time_penalty),
            ("reward.progress_bonus", self.reward.progress_bonus),
            ("reward.waypoint_bonus", self.reward.waypoint_bonus),
            ("reward.success_reward", self.reward.success_reward),
            ("reward.failure_reward", self.reward.failure_reward),
            ("reward.proximity_coefficient", self.reward.proximity_coefficient),
            ("reward.collision_penalty", self.reward.collision_penalty),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(AgentError::Config(format!("{name} must be finite, got {value}")));
            }
        }

        let bounds = self.reward.out_of_bounds_sqr;
        if bounds.is_nan() || bounds <= ARRIVAL_SQR_RADIUS {
            return Err(AgentError::Config(format!(
                "reward.out_of_bounds_sqr must exceed the arrival radius {ARRIVAL_SQR_RADIUS}, got {bounds}"
            )));
        }

        Ok(())
    }
}
