//! Per-tick reward shaping and episode termination

use nalgebra::{distance_squared, Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use pedestrian_rl_core::{AgentError, ContinuousAction, EpisodeReward, Result, Reward, Terminal};

use crate::config::{MovementConfig, RewardConfig, ARRIVAL_SQR_RADIUS};
use crate::route::{Arrival, RouteTracker};
use crate::world::{EntityId, EntitySnapshot, Locomotion, Visibility};

/// Number of components in a policy action: forward, lateral
pub const ACTION_SIZE: usize = 2;

/// Previous-neighbour distance assumed before any neighbour was seen
const INITIAL_NEIGHBOR_SQR: f64 = 100.0;

/// Intents shorter than this are treated as standing still
const MIN_INTENT_NORM: f64 = 1e-5;

/// What one call to [`RewardShaper::evaluate`] decided
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Reward for this tick
    pub reward: Reward,
    /// Episode outcome after this tick
    pub terminal: Terminal,
    /// Set when the agent reached its target this tick
    pub arrival: Option<Arrival>,
}

/// Trend memory carried from one tick to the next
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapingMemory {
    /// Squared distance to the target at the end of the last tick
    pub sqr_to_target: f64,
    /// Neighbour seen during the last tick
    pub neighbor: Option<EntityId>,
    /// Squared distance to that neighbour
    pub sqr_to_neighbor: f64,
}

/// Turns actions into motion and motion into reward.
#[derive(Debug, Clone)]
pub struct RewardShaper {
    config: RewardConfig,
    movement: MovementConfig,
    memory: ShapingMemory,
}

impl RewardShaper {
    /// Shaper with the given weights
    #[must_use]
    pub fn new(config: RewardConfig, movement: MovementConfig) -> Self {
        Self {
            config,
            movement,
            memory: ShapingMemory {
                sqr_to_target: f64::INFINITY,
                neighbor: None,
                sqr_to_neighbor: INITIAL_NEIGHBOR_SQR,
            },
        }
    }

    /// Start a new episode with `sqr_to_target` as the progress baseline
    pub fn reset(&mut self, sqr_to_target: f64) {
        self.memory = ShapingMemory {
            sqr_to_target,
            neighbor: None,
            sqr_to_neighbor: INITIAL_NEIGHBOR_SQR,
        };
    }

    /// Trend memory as of the last tick
    #[must_use]
    pub fn memory(&self) -> &ShapingMemory {
        &self.memory
    }

    /// Reward weights in use
    #[must_use]
    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Locomotion intent for `action`: `lateral` along +X, `forward` along +Z,
    /// normalised and scaled to the configured speed.
    pub fn intent(&self, action: &ContinuousAction) -> Result<Vector3<f64>> {
        if action.len() != ACTION_SIZE {
            return Err(AgentError::WrongLength {
                expected: ACTION_SIZE,
                actual: action.len(),
            });
        }
        let (forward, lateral) = (action.0[0], action.0[1]);
        if !(forward.is_finite() && lateral.is_finite()) {
            return Err(AgentError::InvalidAction(format!("non-finite action {:?}", action.0)));
        }

        let direction = Vector3::new(lateral, 0.0, forward)
            .try_normalize(MIN_INTENT_NORM)
            .unwrap_or_else(Vector3::zeros);
        Ok(direction * self.movement.speed)
    }

    /// Run one tick: apply `action`, advance the route on arrival and score
    /// the result into `reward`.
    ///
    /// `neighbor` is the current snapshot of the neighbour chosen when the
    /// last observation was produced. A terminal reward replaces the tick's
    /// reward; shaping terms after it still update their memory but are not
    /// credited. An invalid action leaves every piece of state untouched.
    pub fn evaluate<L, V>(
        &mut self,
        action: &ContinuousAction,
        avatar: &mut L,
        route: &mut RouteTracker,
        markers: &mut V,
        neighbor: Option<&EntitySnapshot>,
        reward: &mut EpisodeReward,
    ) -> Result<Evaluation>
    where
        L: Locomotion + ?Sized,
        V: Visibility + ?Sized,
    {
        let intent = self.intent(action)?;

        reward.add(self.config.time_penalty);
        avatar.move_by(&intent, false, false);
        let position = avatar.position();

        let mut terminal = Terminal::No;
        let mut arrival = None;

        if distance_squared(&position, &route.current_target()) < ARRIVAL_SQR_RADIUS {
            let reached = route.advance(markers);
            match reached {
                Arrival::Final => {
                    reward.set(self.config.success_reward);
                    terminal = Terminal::Success;
                    info!("Reached final target");
                }
                Arrival::Intermediate(index) => {
                    reward.add(self.config.waypoint_bonus);
                    info!(index, "Reached target");
                }
            }
            arrival = Some(reached);
        }

        // Measured against the target chosen above, which may be new
        let sqr_to_target = distance_squared(&position, &route.current_target());
        if sqr_to_target > self.config.out_of_bounds_sqr {
            reward.set(self.config.failure_reward);
            terminal = Terminal::Failure;
            info!(sqr_to_target, "Strayed out of bounds");
        }

        let mut credit = |delta: f64| {
            if !terminal.is_terminal() {
                reward.add(delta);
            }
        };

        if sqr_to_target < self.memory.sqr_to_target {
            credit(self.config.progress_bonus);
        }
        self.memory.sqr_to_target = sqr_to_target;

        if let Some(neighbor) = neighbor {
            let sqr_to_neighbor = distance_squared(&position, &neighbor.position);
            let band = self.config.proximity_band_sqr;

            // Pays for moving away from the same neighbour, weighted by how
            // close it still is.
            if sqr_to_neighbor < band
                && self.memory.neighbor == Some(neighbor.id)
                && self.memory.sqr_to_neighbor < sqr_to_neighbor
            {
                credit(self.config.proximity_coefficient * (band - sqr_to_neighbor));
            }
            if sqr_to_neighbor < self.config.collision_sqr {
                credit(self.config.collision_penalty);
                debug!(neighbor = neighbor.id, sqr_to_neighbor, "Bumped into someone");
            }

            self.memory.neighbor = Some(neighbor.id);
            self.memory.sqr_to_neighbor = sqr_to_neighbor;
        }

        Ok(Evaluation {
            reward: reward.step_reward(),
            terminal,
            arrival,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use crate::sim::{KinematicAvatar, MarkerBoard};
    use crate::world::EntityKind;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        shaper: RewardShaper,
        avatar: KinematicAvatar,
        route: RouteTracker,
        markers: MarkerBoard,
        reward: EpisodeReward,
    }

    impl Fixture {
        /// Avatar parked `offset` away from the first waypoint
        fn new(route_len: usize, offset: Vector3<f64>) -> Self {
            Self::with_route(route_len, offset, RouteConfig::default(), 3)
        }

        fn with_route(route_len: usize, offset: Vector3<f64>, config: RouteConfig, seed: u64) -> Self {
            let mut route = RouteTracker::new(route_len, config).unwrap();
            let mut markers = MarkerBoard::default();
            let target = route.reset(&Point3::origin(), &mut StdRng::seed_from_u64(seed), &mut markers);
            let start = target + offset;
            let mut shaper = RewardShaper::new(RewardConfig::default(), MovementConfig::default());
            shaper.reset(distance_squared(&start, &target));

            Self {
                shaper,
                avatar: KinematicAvatar::new(start),
                route,
                markers,
                reward: EpisodeReward::new(),
            }
        }

        fn tick(&mut self, action: [f64; 2], neighbor: Option<&EntitySnapshot>) -> Evaluation {
            self.reward.begin_step();
            self.shaper
                .evaluate(
                    &ContinuousAction::from(action),
                    &mut self.avatar,
                    &mut self.route,
                    &mut self.markers,
                    neighbor,
                    &mut self.reward,
                )
                .unwrap()
        }
    }

    #[test]
    fn test_intent_is_normalised_and_scaled() {
        let shaper = RewardShaper::new(RewardConfig::default(), MovementConfig::default());

        let intent = shaper.intent(&ContinuousAction::from([1.0, 1.0])).unwrap();
        assert_abs_diff_eq!(intent.norm(), 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(intent.x, intent.z, epsilon = 1e-12);
        assert_eq!(intent.y, 0.0);

        let forward = shaper.intent(&ContinuousAction::from([0.3, 0.0])).unwrap();
        assert_abs_diff_eq!(forward.z, 0.4, epsilon = 1e-12);

        let still = shaper.intent(&ContinuousAction::from([0.0, 0.0])).unwrap();
        assert_eq!(still, Vector3::zeros());
    }

    #[test]
    fn test_rejects_malformed_actions() {
        let shaper = RewardShaper::new(RewardConfig::default(), MovementConfig::default());
        assert!(matches!(
            shaper.intent(&ContinuousAction(vec![1.0])),
            Err(AgentError::WrongLength { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            shaper.intent(&ContinuousAction(vec![f64::NAN, 0.0])),
            Err(AgentError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_idle_tick_pays_time_penalty_only() {
        let mut f = Fixture::new(1, Vector3::new(5.0, 0.0, 0.0));
        let eval = f.tick([0.0, 0.0], None);

        assert_abs_diff_eq!(eval.reward.value(), -0.0003, epsilon = 1e-12);
        assert_eq!(eval.terminal, Terminal::No);
        assert_eq!(eval.arrival, None);
    }

    #[test]
    fn test_progress_bonus_only_when_closer() {
        let mut f = Fixture::new(1, Vector3::new(5.0, 0.0, 0.0));

        // Step toward the target along -X
        let closer = f.tick([0.0, -1.0], None);
        assert_abs_diff_eq!(closer.reward.value(), -0.0003 + 0.0001, epsilon = 1e-12);
        assert_abs_diff_eq!(f.shaper.memory().sqr_to_target, 4.6 * 4.6, epsilon = 1e-9);

        // Standing still keeps the same distance: no bonus, memory refreshed
        let idle = f.tick([0.0, 0.0], None);
        assert_abs_diff_eq!(idle.reward.value(), -0.0003, epsilon = 1e-12);

        let away = f.tick([0.0, 1.0], None);
        assert_abs_diff_eq!(away.reward.value(), -0.0003, epsilon = 1e-12);
        assert_abs_diff_eq!(f.shaper.memory().sqr_to_target, 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_out_of_bounds_fails_with_exact_penalty() {
        let mut f = Fixture::new(2, Vector3::new(226f64.sqrt(), 0.0, 0.0));
        let eval = f.tick([0.0, 0.0], None);

        assert_eq!(eval.terminal, Terminal::Failure);
        assert_eq!(eval.reward, Reward(-1.0));
        assert_eq!(f.route.current_index(), 0);
    }

    #[test]
    fn test_bounds_checked_against_new_target() {
        let config = RouteConfig {
            step_spread: 40.0,
            ..RouteConfig::default()
        };
        // Land on waypoint 0 of a route whose next waypoint is out of reach
        let mut f = (0..)
            .map(|seed| Fixture::with_route(2, Vector3::zeros(), config.clone(), seed))
            .find(|f| {
                let waypoints = f.route.waypoints();
                distance_squared(&waypoints[0].position, &waypoints[1].position) > 226.0
            })
            .unwrap();

        let eval = f.tick([0.0, 0.0], None);
        assert_eq!(eval.arrival, Some(Arrival::Intermediate(1)));
        assert_eq!(eval.terminal, Terminal::Failure);
        assert_eq!(eval.reward, Reward(-1.0));
        assert_eq!(f.route.current_index(), 1);
    }

    #[test]
    fn test_just_inside_bounds_continues() {
        let mut f = Fixture::new(2, Vector3::new(224f64.sqrt(), 0.0, 0.0));
        let eval = f.tick([0.0, 0.0], None);
        assert_eq!(eval.terminal, Terminal::No);
    }

    #[test]
    fn test_final_arrival_sets_success_reward() {
        let mut f = Fixture::new(1, Vector3::zeros());
        let eval = f.tick([0.0, 0.0], None);

        assert_eq!(eval.arrival, Some(Arrival::Final));
        assert_eq!(eval.terminal, Terminal::Success);
        assert_eq!(eval.reward, Reward(1.0));
        assert!(f.markers.visible_markers().is_empty());
    }

    #[test]
    fn test_collision_penalised_without_termination() {
        let mut f = Fixture::new(1, Vector3::new(5.0, 0.0, 0.0));
        let here = f.avatar.position();
        let bumped = EntitySnapshot::facing(9, EntityKind::Pedestrian, here + Vector3::new(0.5, 0.0, 0.0), 0.0);

        let eval = f.tick([0.0, 0.0], Some(&bumped));
        assert_abs_diff_eq!(eval.reward.value(), -0.0003 - 0.005, epsilon = 1e-12);
        assert_eq!(eval.terminal, Terminal::No);
        assert_eq!(f.shaper.memory().neighbor, Some(9));
        assert_abs_diff_eq!(f.shaper.memory().sqr_to_neighbor, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_bonus_for_moving_away_from_same_neighbor() {
        let mut f = Fixture::new(1, Vector3::new(5.0, 0.0, 0.0));
        let here = f.avatar.position();
        let near = EntitySnapshot::facing(4, EntityKind::Pedestrian, here + Vector3::new(0.0, 0.0, 2.0), 0.0);
        let farther = EntitySnapshot::facing(4, EntityKind::Pedestrian, here + Vector3::new(0.0, 0.0, 3.0), 0.0);

        // First sighting only records the neighbour
        let first = f.tick([0.0, 0.0], Some(&near));
        assert_abs_diff_eq!(first.reward.value(), -0.0003, epsilon = 1e-12);

        let second = f.tick([0.0, 0.0], Some(&farther));
        assert_abs_diff_eq!(second.reward.value(), -0.0003 + 0.0001 * (225.0 - 9.0), epsilon = 1e-12);

        // Closing in again earns nothing
        let third = f.tick([0.0, 0.0], Some(&near));
        assert_abs_diff_eq!(third.reward.value(), -0.0003, epsilon = 1e-12);
    }

    #[test]
    fn test_no_bonus_when_neighbor_changes() {
        let mut f = Fixture::new(1, Vector3::new(5.0, 0.0, 0.0));
        let here = f.avatar.position();
        let a = EntitySnapshot::facing(1, EntityKind::Pedestrian, here + Vector3::new(0.0, 0.0, 2.0), 0.0);
        let b = EntitySnapshot::facing(2, EntityKind::Pedestrian, here + Vector3::new(0.0, 0.0, 3.0), 0.0);

        f.tick([0.0, 0.0], Some(&a));
        let eval = f.tick([0.0, 0.0], Some(&b));
        assert_abs_diff_eq!(eval.reward.value(), -0.0003, epsilon = 1e-12);
        assert_eq!(f.shaper.memory().neighbor, Some(2));
    }

    #[test]
    fn test_invalid_action_changes_nothing() {
        let mut f = Fixture::new(1, Vector3::new(5.0, 0.0, 0.0));
        let before = *f.shaper.memory();
        f.reward.begin_step();

        let result = f.shaper.evaluate(
            &ContinuousAction(vec![0.0, 0.0, 0.0]),
            &mut f.avatar,
            &mut f.route,
            &mut f.markers,
            None,
            &mut f.reward,
        );
        assert!(result.is_err());
        assert_eq!(*f.shaper.memory(), before);
        assert_eq!(f.reward.cumulative(), Reward(0.0));
    }
}
