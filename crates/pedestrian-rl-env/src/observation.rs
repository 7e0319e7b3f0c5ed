//! Fixed-length observation vector and nearest-neighbour sensing

use nalgebra::{distance, Point3};
use serde::{Deserialize, Serialize};

use pedestrian_rl_core::{BoundedObservations, Observation};

use crate::config::SensingConfig;
use crate::world::{EntityId, EntitySnapshot, SpatialQuery};

/// Number of features in a [`PedestrianObservation`]
pub const OBSERVATION_SIZE: usize = 7;

/// Value of the neighbour features when nobody is in sensing range
pub const NO_NEIGHBOR: f64 = -1.0;

/// Origin-relative features seen by the policy each tick.
///
/// Layout: agent x/z, target x/z, neighbour x/z, neighbour heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PedestrianObservation {
    /// Normalised features in policy order
    pub features: [f64; OBSERVATION_SIZE],
}

impl PedestrianObservation {
    /// Whether the neighbour slots hold the sentinel
    #[must_use]
    pub fn has_neighbor(&self) -> bool {
        self.features[4..].iter().any(|&f| f != NO_NEIGHBOR)
    }
}

impl Observation for PedestrianObservation {
    fn to_features(&self) -> Vec<f64> {
        self.features.to_vec()
    }

    fn width(&self) -> usize {
        OBSERVATION_SIZE
    }
}

/// Space of [`PedestrianObservation`]; coordinates are unbounded
#[must_use]
pub fn observation_space() -> BoundedObservations<PedestrianObservation> {
    BoundedObservations::unbounded(OBSERVATION_SIZE)
}

/// Builds observations relative to the agent's origin
#[derive(Debug, Clone)]
pub struct ObservationEncoder {
    config: SensingConfig,
}

impl ObservationEncoder {
    /// Encoder using the given scales and sensing radius
    #[must_use]
    pub fn new(config: SensingConfig) -> Self {
        Self { config }
    }

    /// Sensing configuration in use
    #[must_use]
    pub fn config(&self) -> &SensingConfig {
        &self.config
    }

    /// Encode one tick's view of the world
    #[must_use]
    pub fn produce(
        &self,
        agent: &Point3<f64>,
        origin: &Point3<f64>,
        target: &Point3<f64>,
        neighbor: Option<&EntitySnapshot>,
    ) -> PedestrianObservation {
        let scale = self.config.position_scale;
        let relative = |p: &Point3<f64>| (p - origin) / scale;

        let agent = relative(agent);
        let target = relative(target);
        let [nx, nz, heading] = match neighbor {
            Some(n) => {
                let rel = relative(&n.position);
                [rel.x, rel.z, n.heading_degrees() / self.config.heading_scale]
            }
            None => [NO_NEIGHBOR; 3],
        };

        PedestrianObservation {
            features: [agent.x, agent.z, target.x, target.z, nx, nz, heading],
        }
    }

    /// Closest entity of the neighbour kind within the sensing radius.
    ///
    /// Candidates are scanned in query order and a candidate at equal or
    /// smaller distance replaces the current pick, so among equally close
    /// entities the last one wins. `exclude` is skipped (the agent itself).
    pub fn closest_neighbor<S>(
        &self,
        spatial: &S,
        agent: &Point3<f64>,
        exclude: Option<EntityId>,
    ) -> Option<EntitySnapshot>
    where
        S: SpatialQuery + ?Sized,
    {
        let mut closest: Option<(f64, EntitySnapshot)> = None;

        for candidate in spatial.overlap_sphere(agent, self.config.radius) {
            if candidate.kind != self.config.neighbor_kind || Some(candidate.id) == exclude {
                continue;
            }
            let d = distance(agent, &candidate.position);
            if closest.as_ref().map_or(true, |(best, _)| d <= *best) {
                closest = Some((d, candidate));
            }
        }

        closest.map(|(_, entity)| entity)
    }
}
