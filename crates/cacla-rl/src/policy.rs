//! Gaussian exploration policy over a single action variable

use rand::RngCore;
use rand_distr::{Distribution, Normal};

use cacla_core::{Action, CaclaError, Result, ScalarSource, State, Variable};

use crate::vfa::FunctionApproximator;

/// Deterministic mean from a function approximator plus Gaussian exploration
pub struct GaussianPolicy<V: FunctionApproximator> {
    vfa: V,
    output_action_index: usize,
    bounds: Variable,
    sigma: Box<dyn ScalarSource>,
}

impl<V: FunctionApproximator> GaussianPolicy<V> {
    pub fn new(
        vfa: V,
        output_action_index: usize,
        bounds: Variable,
        sigma: Box<dyn ScalarSource>,
    ) -> Self {
        Self {
            vfa,
            output_action_index,
            bounds,
            sigma,
        }
    }

    pub fn vfa(&self) -> &V {
        &self.vfa
    }

    pub fn vfa_mut(&mut self) -> &mut V {
        &mut self.vfa
    }

    pub fn output_action_index(&self) -> usize {
        self.output_action_index
    }

    pub fn bounds(&self) -> &Variable {
        &self.bounds
    }

    /// Current exploration width
    pub fn sigma(&self) -> f64 {
        self.sigma.value()
    }

    /// Policy mean for the state, before clamping
    pub fn mean(&self, state: &State, action: &Action) -> f64 {
        self.vfa.evaluate(state, action)
    }

    /// Write the noiseless, clamped policy output into `action`
    pub fn greedy_action(&self, state: &State, action: &mut Action) -> Result<()> {
        let value = self.bounds.clamp(self.mean(state, action));
        action.set(self.output_action_index, value)
    }

    /// Write the mean plus Gaussian noise, clamped to the action bounds
    pub fn select_action(
        &self,
        state: &State,
        action: &mut Action,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        let mean = self.mean(state, action);
        let sigma = self.sigma();
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(CaclaError::Config(format!(
                "exploration sigma must be finite and non-negative, got {sigma}"
            )));
        }
        let noise = if sigma > 0.0 {
            Normal::new(0.0, sigma)
                .map_err(|e| CaclaError::Config(format!("exploration sigma {sigma}: {e}")))?
                .sample(rng)
        } else {
            0.0
        };
        action.set(self.output_action_index, self.bounds.clamp(mean + noise))
    }
}

impl<V: FunctionApproximator + std::fmt::Debug> std::fmt::Debug for GaussianPolicy<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaussianPolicy")
            .field("vfa", &self.vfa)
            .field("output_action_index", &self.output_action_index)
            .field("bounds", &self.bounds)
            .field("sigma", &self.sigma.value())
            .finish()
    }
}
