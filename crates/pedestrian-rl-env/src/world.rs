//! Capabilities the agent consumes from its host world
//!
//! The agent never moves bodies, renders markers or indexes space itself.
//! It is handed implementations of [`Locomotion`], [`SpatialQuery`] and
//! [`Visibility`] and calls them once per tick.

use std::sync::Arc;

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Stable identity of an entity in the spatial index
pub type EntityId = u64;

/// Position of a waypoint within its route
pub type WaypointId = usize;

/// Coarse classification used to filter spatial query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Another walking agent
    Pedestrian,
    /// Cars, bikes and the like
    Vehicle,
    /// Anything static
    Obstacle,
}

/// Read-only view of an entity returned by a spatial query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Identity, stable across ticks
    pub id: EntityId,
    /// Classification
    pub kind: EntityKind,
    /// World position
    pub position: Point3<f64>,
    /// World orientation
    pub rotation: UnitQuaternion<f64>,
}

impl EntitySnapshot {
    /// Snapshot facing `heading_degrees` around the vertical axis
    #[must_use]
    pub fn facing(id: EntityId, kind: EntityKind, position: Point3<f64>, heading_degrees: f64) -> Self {
        Self {
            id,
            kind,
            position,
            rotation: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), heading_degrees.to_radians()),
        }
    }

    /// Yaw of the entity's forward (+Z) axis, in degrees within `[0, 360)`
    #[must_use]
    pub fn heading_degrees(&self) -> f64 {
        let forward = self.rotation * Vector3::z();
        let heading = forward.x.atan2(forward.z).to_degrees().rem_euclid(360.0);
        // rem_euclid rounds tiny negatives up to exactly 360
        if heading >= 360.0 {
            0.0
        } else {
            heading
        }
    }
}

/// The avatar's movement controller
pub trait Locomotion {
    /// Current world position of the avatar
    fn position(&self) -> Point3<f64>;

    /// Entity id the avatar is known by in the spatial index, if any
    fn entity_id(&self) -> Option<EntityId> {
        None
    }

    /// Request movement along `intent` for this tick
    fn move_by(&mut self, intent: &Vector3<f64>, crouch: bool, jump: bool);

    /// Place the avatar at `position` without simulating the motion
    fn warp(&mut self, position: Point3<f64>);
}

/// Spatial index over the other entities in the scene
pub trait SpatialQuery {
    /// All entities within `radius` of `center`, in index order
    fn overlap_sphere(&self, center: &Point3<f64>, radius: f64) -> Vec<EntitySnapshot>;

    /// Current snapshot of a single entity, if it still exists
    fn entity(&self, id: EntityId) -> Option<EntitySnapshot>;
}

impl<T: SpatialQuery + ?Sized> SpatialQuery for &T {
    fn overlap_sphere(&self, center: &Point3<f64>, radius: f64) -> Vec<EntitySnapshot> {
        (**self).overlap_sphere(center, radius)
    }

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        (**self).entity(id)
    }
}

impl<T: SpatialQuery + ?Sized> SpatialQuery for Arc<T> {
    fn overlap_sphere(&self, center: &Point3<f64>, radius: f64) -> Vec<EntitySnapshot> {
        (**self).overlap_sphere(center, radius)
    }

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        (**self).entity(id)
    }
}

/// Shows and hides waypoint markers
pub trait Visibility {
    /// Toggle the marker for `waypoint`
    fn set_visible(&mut self, waypoint: WaypointId, visible: bool);
}
