//! Critics producing the value signal for actor updates

use cacla_core::{Action, CaclaError, Result, Reward, ScalarSource, State};

use crate::features::FeatureList;
use crate::vfa::FunctionApproximator;

/// Trait for value-function learners
pub trait Critic: Send {
    fn name(&self) -> &str;

    /// Learn from one transition and return its temporal-difference error
    fn update(
        &mut self,
        state: &State,
        action: &Action,
        next_state: &State,
        reward: Reward,
    ) -> Result<f64>;

    /// Current value estimate
    fn value(&self, state: &State, action: &Action) -> f64;
}

/// TD(0) state-value critic
pub struct TdCritic<V: FunctionApproximator> {
    vfa: V,
    alpha: Box<dyn ScalarSource>,
    gamma: f64,
    features: FeatureList,
}

impl<V: FunctionApproximator> TdCritic<V> {
    pub fn new(vfa: V, alpha: Box<dyn ScalarSource>, gamma: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&gamma) {
            return Err(CaclaError::Config(format!(
                "discount factor must be within [0, 1], got {gamma}"
            )));
        }
        Ok(Self {
            vfa,
            alpha,
            gamma,
            features: FeatureList::new(),
        })
    }

    pub fn vfa(&self) -> &V {
        &self.vfa
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// `r + gamma * V(s') - V(s)` without learning
    pub fn td_error(
        &self,
        state: &State,
        action: &Action,
        next_state: &State,
        reward: Reward,
    ) -> f64 {
        reward + self.gamma * self.vfa.evaluate(next_state, action)
            - self.vfa.evaluate(state, action)
    }
}

impl<V: FunctionApproximator> Critic for TdCritic<V> {
    fn name(&self) -> &str {
        "td0"
    }

    fn update(
        &mut self,
        state: &State,
        action: &Action,
        next_state: &State,
        reward: Reward,
    ) -> Result<f64> {
        let td = self.td_error(state, action, next_state, reward);

        let alpha = self.alpha.value();
        if alpha != 0.0 {
            self.vfa.features(state, action, &mut self.features);
            self.vfa.add(&self.features, alpha * td);
        }
        Ok(td)
    }

    fn value(&self, state: &State, action: &Action) -> f64 {
        self.vfa.evaluate(state, action)
    }
}
