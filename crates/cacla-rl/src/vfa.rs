//! Function approximation

use cacla_core::{Action, State};

use crate::features::{FeatureList, FeatureMap};

/// Parametric function of a (state, action) pair updated by additive steps
pub trait FunctionApproximator: Send {
    /// Current output for the pair
    fn evaluate(&self, state: &State, action: &Action) -> f64;

    /// Write the features of the pair into caller-supplied storage
    fn features(&self, state: &State, action: &Action, out: &mut FeatureList);

    /// `weights += factor * features`
    fn add(&mut self, features: &FeatureList, factor: f64);
}

/// Linear function approximator over a feature map
#[derive(Debug, Clone)]
pub struct LinearVfa<F: FeatureMap> {
    feature_map: F,
    weights: Vec<f64>,
}

impl<F: FeatureMap> LinearVfa<F> {
    /// Zero-initialized weights
    pub fn new(feature_map: F) -> Self {
        Self::with_initial_value(feature_map, 0.0)
    }

    /// Weights initialized so that the output starts at `value` for normalized features
    pub fn with_initial_value(feature_map: F, value: f64) -> Self {
        let weights = vec![value; feature_map.num_features()];
        Self {
            feature_map,
            weights,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn feature_map(&self) -> &F {
        &self.feature_map
    }
}

impl<F: FeatureMap> FunctionApproximator for LinearVfa<F> {
    fn evaluate(&self, state: &State, action: &Action) -> f64 {
        let weights = &self.weights;
        let mut value = 0.0;
        self.feature_map.visit(state, action, &mut |index, feature| {
            value += weights[index] * feature;
        });
        value
    }

    fn features(&self, state: &State, action: &Action, out: &mut FeatureList) {
        self.feature_map.features(state, action, out);
    }

    fn add(&mut self, features: &FeatureList, factor: f64) {
        for (index, feature) in features.iter() {
            if let Some(weight) = self.weights.get_mut(index) {
                *weight += factor * feature;
            }
        }
    }
}
