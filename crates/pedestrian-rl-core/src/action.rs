//! Policy actions and the boxes they are drawn from

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::{AgentError, Result};

/// Something a policy hands to an environment each tick
pub trait Action: Clone + Debug + Send + Sync {
    /// Flat numeric components
    fn components(&self) -> Vec<f64>;
}

/// Set of valid actions
pub trait ActionSpace: Send + Sync {
    /// Actions in this space
    type Action: Action;

    /// Draw an action uniformly
    fn sample(&self, rng: &mut dyn RngCore) -> Self::Action;

    /// Whether `action` lies inside the space
    fn contains(&self, action: &Self::Action) -> bool;

    /// Number of components per action
    fn width(&self) -> usize;
}

/// Real-valued action vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousAction(pub Vec<f64>);

impl ContinuousAction {
    /// Number of components
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the action has no components
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<[f64; 2]> for ContinuousAction {
    fn from(values: [f64; 2]) -> Self {
        Self(values.to_vec())
    }
}

impl Action for ContinuousAction {
    fn components(&self) -> Vec<f64> {
        self.0.clone()
    }
}

/// Axis-aligned box of continuous actions
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedSpace {
    /// Per-component minimum
    pub lower: Vec<f64>,
    /// Per-component maximum
    pub upper: Vec<f64>,
}

impl BoundedSpace {
    /// Box between `lower` and `upper`.
    ///
    /// Both must have the same length and every component needs finite
    /// bounds with `lower <= upper`.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(AgentError::WrongLength {
                expected: lower.len(),
                actual: upper.len(),
            });
        }
        for (i, (lo, hi)) in lower.iter().zip(&upper).enumerate() {
            if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                return Err(AgentError::Config(format!("component {i} has invalid bounds [{lo}, {hi}]")));
            }
        }
        Ok(Self { lower, upper })
    }

    /// `[-1, 1]` on every one of `width` components
    #[must_use]
    pub fn unit(width: usize) -> Self {
        Self {
            lower: vec![-1.0; width],
            upper: vec![1.0; width],
        }
    }
}

impl ActionSpace for BoundedSpace {
    type Action = ContinuousAction;

    fn sample(&self, rng: &mut dyn RngCore) -> ContinuousAction {
        ContinuousAction(
            self.lower
                .iter()
                .zip(&self.upper)
                .map(|(&lo, &hi)| rng.gen_range(lo..=hi))
                .collect(),
        )
    }

    fn contains(&self, action: &ContinuousAction) -> bool {
        action.len() == self.width()
            && action
                .0
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(x, (lo, hi))| (lo..=hi).contains(&x))
    }

    fn width(&self) -> usize {
        self.lower.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mismatched_bounds_rejected() {
        let err = BoundedSpace::new(vec![-1.0, -1.0], vec![1.0]).unwrap_err();
        assert!(matches!(err, AgentError::WrongLength { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_inverted_or_nan_bounds_rejected() {
        let inverted = BoundedSpace::new(vec![0.0, 1.0], vec![1.0, -1.0]);
        assert!(matches!(inverted, Err(AgentError::Config(_))));

        let nan = BoundedSpace::new(vec![f64::NAN], vec![1.0]);
        assert!(matches!(nan, Err(AgentError::Config(_))));

        let point = BoundedSpace::new(vec![0.5], vec![0.5]).unwrap();
        assert_eq!(point.sample(&mut StdRng::seed_from_u64(1)), ContinuousAction(vec![0.5]));
    }

    #[test]
    fn test_samples_stay_inside_space() {
        let space = BoundedSpace::unit(2);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            let action = space.sample(&mut rng);
            assert!(space.contains(&action));
        }
        assert!(!space.contains(&ContinuousAction(vec![0.0, 1.5])));
        assert!(!space.contains(&ContinuousAction(vec![0.0])));
    }
}
