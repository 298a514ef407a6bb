//! Feature vectors and feature maps
//!
//! Feature extraction writes into caller-owned [`FeatureList`] storage so
//! that learners can reuse one buffer for every update.

use cacla_core::{Action, CaclaError, Result, Space, State, Variable};

/// Sparse feature vector of (index, value) pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureList {
    entries: Vec<(usize, f64)>,
}

impl FeatureList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Build a list holding every element of a dense vector
    pub fn from_dense(values: &[f64]) -> Self {
        Self {
            entries: values.iter().copied().enumerate().collect(),
        }
    }

    /// Remove all entries, keeping the allocation
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn push(&mut self, index: usize, value: f64) {
        self.entries.push((index, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }


    /// Inner product with a dense weight vector. Out-of-range indices count as zero.
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|&(i, v)| weights.get(i).map_or(0.0, |w| w * v))
            .sum()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }
}

/// Maps a (state, action) pair to a feature vector
pub trait FeatureMap: Send + Sync {
    /// Size of the feature space; every visited index is below this
    fn num_features(&self) -> usize;

    /// Call `f` with each (index, value) feature of the pair
    fn visit(&self, state: &State, action: &Action, f: &mut dyn FnMut(usize, f64));

    /// Write the features of the pair into `out`, replacing its contents
    fn features(&self, state: &State, action: &Action, out: &mut FeatureList) {
        out.clear();
        self.visit(state, action, &mut |index, value| out.push(index, value));
    }
}

/// Which snapshot a grid dimension reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    State(usize),
    Action(usize),
}

/// One axis of an RBF grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridDimension {
    input: Input,
    min: f64,
    max: f64,
    points: usize,
}

impl GridDimension {
    pub fn new(input: Input, min: f64, max: f64, points: usize) -> Self {
        Self {
            input,
            min,
            max,
            points,
        }
    }

    pub fn state(index: usize, variable: &Variable, points: usize) -> Self {
        Self::new(Input::State(index), variable.min, variable.max, points)
    }

    pub fn action(index: usize, variable: &Variable, points: usize) -> Self {
        Self::new(Input::Action(index), variable.min, variable.max, points)
    }

    fn spacing(&self) -> f64 {
        (self.max - self.min) / (self.points - 1) as f64
    }

    fn center(&self, k: usize) -> f64 {
        self.min + k as f64 * self.spacing()
    }

    fn activation(&self, x: f64, k: usize) -> f64 {
        let z = (x - self.center(k)) / self.spacing();
        (-0.5 * z * z).exp()
    }

    fn read(&self, state: &State, action: &Action) -> f64 {
        let value = match self.input {
            Input::State(i) => state.get(i),
            Input::Action(i) => action.get(i),
        };
        debug_assert!(value.is_some(), "grid input {:?} out of range", self.input);
        value.unwrap_or(self.min).clamp(self.min, self.max)
    }
}

/// Normalized Gaussian radial-basis functions on a regular grid.
///
/// Each axis has `points` evenly spaced centers with a width equal to the
/// spacing. Activations are normalized per axis, so the features of any
/// input sum to one.
#[derive(Debug, Clone)]
pub struct RbfGrid {
    dimensions: Vec<GridDimension>,
    num_features: usize,
    total_points: usize,
}

impl RbfGrid {
    pub fn new(dimensions: Vec<GridDimension>) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(CaclaError::Config(
                "RBF grid needs at least one dimension".to_string(),
            ));
        }
        for dimension in &dimensions {
            if dimension.points < 2 {
                return Err(CaclaError::Config(format!(
                    "RBF grid axis {:?} needs at least 2 points",
                    dimension.input
                )));
            }
            if !(dimension.max > dimension.min) {
                return Err(CaclaError::Config(format!(
                    "RBF grid axis {:?} has an empty range",
                    dimension.input
                )));
            }
        }

        let num_features = dimensions
            .iter()
            .try_fold(1_usize, |acc, d| acc.checked_mul(d.points))
            .ok_or_else(|| CaclaError::Config("RBF grid is too large".to_string()))?;
        let total_points = dimensions.iter().map(|d| d.points).sum();

        Ok(Self {
            dimensions,
            num_features,
            total_points,
        })
    }

    /// Grid over every variable of a state space
    pub fn over_state(space: &Space, points: usize) -> Result<Self> {
        Self::new(
            space
                .variables()
                .iter()
                .enumerate()
                .map(|(i, v)| GridDimension::state(i, v, points))
                .collect(),
        )
    }

    pub fn dimensions(&self) -> &[GridDimension] {
        &self.dimensions
    }
}

impl FeatureMap for RbfGrid {
    fn num_features(&self) -> usize {
        self.num_features
    }

    fn visit(&self, state: &State, action: &Action, f: &mut dyn FnMut(usize, f64)) {
        // Normalized activations of every axis, laid out axis after axis
        let mut activations = Vec::with_capacity(self.total_points);
        for dimension in &self.dimensions {
            let x = dimension.read(state, action);
            let start = activations.len();
            activations.extend((0..dimension.points).map(|k| dimension.activation(x, k)));
            let sum: f64 = activations[start..].iter().sum();
            for activation in &mut activations[start..] {
                *activation /= sum;
            }
        }

        for index in 0..self.num_features {
            let mut rest = index;
            let mut offset = 0;
            let mut value = 1.0;
            for dimension in &self.dimensions {
                value *= activations[offset + rest % dimension.points];
                rest /= dimension.points;
                offset += dimension.points;
            }
            f(index, value);
        }
    }
}
