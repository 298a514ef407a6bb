//! State and action snapshots
//!
//! A [`Snapshot`] is a fixed-dimension vector of variable values. States and
//! actions share the representation; the dimension is set once by the
//! [`Space`] that created the instance and never changes afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{CaclaError, Result};

/// Reward value from the environment
pub type Reward = f64;

/// State snapshot
pub type State = Snapshot;

/// Action snapshot
pub type Action = Snapshot;

/// Fixed-dimension vector of variable values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    values: Vec<f64>,
}

impl Snapshot {
    /// Create a zeroed snapshot with the given dimension
    pub fn zeros(dimension: usize) -> Self {
        Self {
            values: vec![0.0; dimension],
        }
    }

    /// Wrap existing values
    pub fn from_vec(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Set a variable, failing if the index is outside the snapshot
    pub fn set(&mut self, index: usize, value: f64) -> Result<()> {
        let dimension = self.values.len();
        let slot = self
            .values
            .get_mut(index)
            .ok_or(CaclaError::DimensionMismatch {
                expected: dimension,
                actual: index + 1,
            })?;
        *slot = value;
        Ok(())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Copy all values from another snapshot of the same dimension.
    ///
    /// Never reallocates: the receiver keeps its storage.
    pub fn copy_from(&mut self, other: &Snapshot) -> Result<()> {
        self.ensure_dimension(other.dimension())?;
        self.values.copy_from_slice(&other.values);
        Ok(())
    }

    /// Check that `dimension` matches this snapshot
    pub fn ensure_dimension(&self, dimension: usize) -> Result<()> {
        if self.values.len() == dimension {
            Ok(())
        } else {
            Err(CaclaError::DimensionMismatch {
                expected: self.values.len(),
                actual: dimension,
            })
        }
    }
}

impl From<Vec<f64>> for Snapshot {
    fn from(values: Vec<f64>) -> Self {
        Self::from_vec(values)
    }
}

/// Description of one state or action variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

impl Variable {
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Ordered set of variables defining a state or action space
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Space {
    variables: Vec<Variable>,
}

impl Space {
    pub fn new(variables: Vec<Variable>) -> Self {
        Self { variables }
    }

    /// Add a variable, builder style
    pub fn with(mut self, name: impl Into<String>, min: f64, max: f64) -> Self {
        self.variables.push(Variable::new(name, min, max));
        self
    }

    pub fn dimension(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, index: usize) -> Option<&Variable> {
        self.variables.get(index)
    }

    /// New zeroed snapshot sized for this space
    pub fn instance(&self) -> Snapshot {
        Snapshot::zeros(self.dimension())
    }

    /// Clamp every value of `snapshot` into its variable's range
    pub fn clamp(&self, snapshot: &mut Snapshot) -> Result<()> {
        snapshot.ensure_dimension(self.dimension())?;
        for (value, variable) in snapshot.values_mut().iter_mut().zip(&self.variables) {
            *value = variable.clamp(*value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_space() -> Space {
        Space::default()
            .with("position", -1.0, 1.0)
            .with("velocity", -2.0, 2.0)
    }

    #[test]
    fn test_instance_dimension() {
        let space = create_test_space();
        let state = space.instance();

        assert_eq!(state.dimension(), 2);
        assert_eq!(state.values(), &[0.0, 0.0]);
    }

    #[test]
    fn test_copy_from_keeps_storage() {
        let mut target = Snapshot::zeros(3);
        let source = Snapshot::from_vec(vec![1.0, 2.0, 3.0]);
        let ptr = target.values().as_ptr();

        target.copy_from(&source).unwrap();

        assert_eq!(target, source);
        assert_eq!(target.values().as_ptr(), ptr);
    }

    #[test]
    fn test_copy_from_dimension_mismatch() {
        let mut target = Snapshot::zeros(2);
        let source = Snapshot::from_vec(vec![1.0, 2.0, 3.0]);

        let err = target.copy_from(&source).unwrap_err();
        assert!(matches!(
            err,
            CaclaError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
        assert_eq!(target.values(), &[0.0, 0.0]);
    }

    #[test]
    fn test_set_out_of_range() {
        let mut snapshot = Snapshot::zeros(1);
        assert!(snapshot.set(0, 0.5).is_ok());
        assert!(snapshot.set(1, 0.5).is_err());
        assert_eq!(snapshot.get(0), Some(0.5));
        assert_eq!(snapshot.get(1), None);
    }

    #[test]
    fn test_space_clamp() {
        let space = create_test_space();
        let mut state = Snapshot::from_vec(vec![3.0, -5.0]);

        space.clamp(&mut state).unwrap();
        assert_eq!(state.values(), &[1.0, -2.0]);
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = Snapshot::from_vec(vec![0.25, -0.5]);
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, snapshot);
    }
}
