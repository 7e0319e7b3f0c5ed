//! Ordered waypoints and the agent's progress along them

use nalgebra::{Point3, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use pedestrian_rl_core::{AgentError, Result};

use crate::config::RouteConfig;
use crate::world::{Visibility, WaypointId};

/// A checkpoint on the route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// World position, re-randomised each reset
    pub position: Point3<f64>,
    /// Whether the marker is currently shown
    pub visible: bool,
}

/// What reaching the current target meant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arrival {
    /// Reached a waypoint before the last; the new target index is attached
    Intermediate(usize),
    /// Reached the last waypoint
    Final,
}

/// Owns the route and the index of the waypoint the agent is heading for.
///
/// The index only moves forward during an episode and is always a valid
/// position in the route once [`reset`](Self::reset) has succeeded.
#[derive(Debug, Clone)]
pub struct RouteTracker {
    waypoints: Vec<Waypoint>,
    index: usize,
    config: RouteConfig,
}

impl RouteTracker {
    /// Route of `len` waypoints, all at the world origin until the first reset.
    ///
    /// Fails on an empty route.
    pub fn new(len: usize, config: RouteConfig) -> Result<Self> {
        if len == 0 {
            return Err(AgentError::Config("route must contain at least one waypoint".to_string()));
        }
        let waypoints = vec![
            Waypoint {
                position: Point3::origin(),
                visible: false,
            };
            len
        ];
        Ok(Self {
            waypoints,
            index: 0,
            config,
        })
    }

    /// Scatter the route around `origin` and aim at its first waypoint
    pub fn reset<R, V>(&mut self, origin: &Point3<f64>, rng: &mut R, markers: &mut V) -> Point3<f64>
    where
        R: Rng,
        V: Visibility + ?Sized,
    {
        let first = self.config.first_spread;
        let step = self.config.step_spread;
        let mut previous = origin
            + Vector3::new(
                rng.gen_range(-first..=first),
                self.config.first_height,
                rng.gen_range(-first..=first),
            );
        for (i, waypoint) in self.waypoints.iter_mut().enumerate() {
            if i > 0 {
                previous += Vector3::new(rng.gen_range(-step..=step), 0.0, rng.gen_range(-step..=step));
            }
            waypoint.position = previous;
        }

        self.index = 0;
        for id in 0..self.waypoints.len() {
            self.show(id, id == 0, markers);
        }

        self.current_target()
    }

    /// Position the agent is currently heading for
    #[must_use]
    pub fn current_target(&self) -> Point3<f64> {
        self.waypoints[self.index].position
    }

    /// Index of the current target
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Number of waypoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false; construction rejects empty routes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// All waypoints in route order
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Record that the agent reached the current target.
    ///
    /// The reached marker is hidden. On the last waypoint the index stays put
    /// and [`Arrival::Final`] is returned; otherwise the next marker is shown.
    pub fn advance<V: Visibility + ?Sized>(&mut self, markers: &mut V) -> Arrival {
        self.show(self.index, false, markers);

        if self.index + 1 >= self.waypoints.len() {
            return Arrival::Final;
        }

        self.index += 1;
        self.show(self.index, true, markers);
        Arrival::Intermediate(self.index)
    }

    fn show<V: Visibility + ?Sized>(&mut self, id: WaypointId, visible: bool, markers: &mut V) {
        self.waypoints[id].visible = visible;
        markers.set_visible(id, visible);
    }
}
