//! In-memory collaborators for hosts without an engine
//!
//! Enough of a world to drive the agent from tests, benchmarks and the
//! demo: an avatar that moves exactly as asked, a vector-backed crowd and a
//! marker board that remembers what is shown.

use std::collections::BTreeMap;

use nalgebra::{distance, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::world::{EntityId, EntitySnapshot, Locomotion, SpatialQuery, Visibility, WaypointId};

/// Last request handed to a [`KinematicAvatar`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Requested intent
    pub intent: Vector3<f64>,
    /// Crouch flag
    pub crouch: bool,
    /// Jump flag
    pub jump: bool,
}

/// Avatar that applies `intent * step_scale` to its position immediately
#[derive(Debug, Clone)]
pub struct KinematicAvatar {
    position: Point3<f64>,
    entity_id: Option<EntityId>,
    step_scale: f64,
    last_move: Option<MoveRequest>,
}

impl KinematicAvatar {
    /// Avatar at `position` moving one intent length per tick
    #[must_use]
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            entity_id: None,
            step_scale: 1.0,
            last_move: None,
        }
    }

    /// Multiply every intent by `scale` before applying it
    #[must_use]
    pub fn with_step_scale(mut self, scale: f64) -> Self {
        self.step_scale = scale;
        self
    }

    /// Identify the avatar in a shared spatial index
    #[must_use]
    pub fn with_entity_id(mut self, id: EntityId) -> Self {
        self.entity_id = Some(id);
        self
    }

    /// Most recent movement request, if any
    #[must_use]
    pub fn last_move(&self) -> Option<MoveRequest> {
        self.last_move
    }
}

impl Locomotion for KinematicAvatar {
    fn position(&self) -> Point3<f64> {
        self.position
    }

    fn entity_id(&self) -> Option<EntityId> {
        self.entity_id
    }

    fn move_by(&mut self, intent: &Vector3<f64>, crouch: bool, jump: bool) {
        self.position += intent * self.step_scale;
        self.last_move = Some(MoveRequest {
            intent: *intent,
            crouch,
            jump,
        });
    }

    fn warp(&mut self, position: Point3<f64>) {
        self.position = position;
    }
}

/// Entities kept in insertion order; queries are a linear scan
#[derive(Debug, Clone, Default)]
pub struct Crowd {
    entities: Vec<EntitySnapshot>,
}

impl Crowd {
    /// Add an entity, replacing any existing one with the same id in place
    pub fn insert(&mut self, entity: EntitySnapshot) {
        match self.entities.iter_mut().find(|e| e.id == entity.id) {
            Some(existing) => *existing = entity,
            None => self.entities.push(entity),
        }
    }

    /// Remove an entity; returns it if it was present
    pub fn remove(&mut self, id: EntityId) -> Option<EntitySnapshot> {
        let index = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(index))
    }

    /// Move an entity; returns false if it is unknown
    pub fn move_to(&mut self, id: EntityId, position: Point3<f64>) -> bool {
        match self.entities.iter_mut().find(|e| e.id == id) {
            Some(entity) => {
                entity.position = position;
                true
            }
            None => false,
        }
    }

    /// Number of entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the crowd is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.entities.iter()
    }
}

impl SpatialQuery for Crowd {
    fn overlap_sphere(&self, center: &Point3<f64>, radius: f64) -> Vec<EntitySnapshot> {
        self.entities
            .iter()
            .filter(|e| distance(center, &e.position) <= radius)
            .cloned()
            .collect()
    }

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.entities.iter().find(|e| e.id == id).cloned()
    }
}

/// Records which waypoint markers are shown
#[derive(Debug, Clone, Default)]
pub struct MarkerBoard {
    shown: BTreeMap<WaypointId, bool>,
}

impl MarkerBoard {
    /// Whether `waypoint` is currently shown
    #[must_use]
    pub fn is_visible(&self, waypoint: WaypointId) -> bool {
        self.shown.get(&waypoint).copied().unwrap_or(false)
    }

    /// Shown markers in ascending order
    #[must_use]
    pub fn visible_markers(&self) -> Vec<WaypointId> {
        self.shown.iter().filter_map(|(&id, &shown)| shown.then_some(id)).collect()
    }
}

impl Visibility for MarkerBoard {
    fn set_visible(&mut self, waypoint: WaypointId, visible: bool) {
        self.shown.insert(waypoint, visible);
    }
}
