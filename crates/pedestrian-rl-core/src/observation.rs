//! What the policy sees, and the bounds on it

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::marker::PhantomData;

use crate::{AgentError, Result};

/// Fixed-width feature vector produced each tick
pub trait Observation: Clone + Debug + Send + Sync {
    /// Features in policy order
    fn to_features(&self) -> Vec<f64>;

    /// Number of features
    fn width(&self) -> usize {
        self.to_features().len()
    }
}

/// Set of valid observations
pub trait ObservationSpace: Send + Sync {
    /// Observations in this space
    type Observation: Observation;

    /// Whether `observation` has the right width and lies inside the bounds
    fn contains(&self, observation: &Self::Observation) -> bool;

    /// Number of features per observation
    fn width(&self) -> usize;
}

/// Untyped observation, handy for hosts and tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub Vec<f64>);

impl Observation for FeatureVector {
    fn to_features(&self) -> Vec<f64> {
        self.0.clone()
    }

    fn width(&self) -> usize {
        self.0.len()
    }
}

/// Per-feature bounds on observations of type `O`
#[derive(Debug, Clone)]
pub struct BoundedObservations<O = FeatureVector> {
    /// Per-feature minimum
    pub lower: Vec<f64>,
    /// Per-feature maximum
    pub upper: Vec<f64>,
    observation: PhantomData<fn() -> O>,
}

impl<O> BoundedObservations<O> {
    /// Bounds from explicit vectors of equal length
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(AgentError::WrongLength {
                expected: lower.len(),
                actual: upper.len(),
            });
        }
        Ok(Self {
            lower,
            upper,
            observation: PhantomData,
        })
    }

    /// `width` features, each allowed to take any value
    #[must_use]
    pub fn unbounded(width: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; width],
            upper: vec![f64::INFINITY; width],
            observation: PhantomData,
        }
    }
}

impl<O: Observation> ObservationSpace for BoundedObservations<O> {
    type Observation = O;

    fn contains(&self, observation: &O) -> bool {
        let features = observation.to_features();
        features.len() == self.lower.len()
            && features
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

    #[test]
    fn test_bounds_must_match() {
        assert!(BoundedObservations::<FeatureVector>::new(vec![0.0; 3], vec![1.0; 4]).is_err());
    }

    #[test]
    fn test_contains_checks_width_and_range() {
        let space = BoundedObservations::new(vec![-1.0; 2], vec![1.0; 2]).unwrap();
        assert!(space.contains(&FeatureVector(vec![-1.0, 0.5])));
        assert!(!space.contains(&FeatureVector(vec![-1.5, 0.5])));
        assert!(!space.contains(&FeatureVector(vec![0.0])));
    }

    #[test]
    fn test_unbounded_rejects_only_nan() {
        let space = BoundedObservations::<FeatureVector>::unbounded(2);
        assert_eq!(space.width(), 2);
        assert!(space.contains(&FeatureVector(vec![-1e9, 1e9])));
        assert!(!space.contains(&FeatureVector(vec![f64::NAN, 0.0])));
    }
}
