//! Policy learner trait and the CACLA actor

use rand::RngCore;

use cacla_core::{Action, CaclaError, Result, Reward, ScalarSource, State};

use crate::features::FeatureList;
use crate::policy::GaussianPolicy;
use crate::vfa::FunctionApproximator;

/// Trait for actor update rules
pub trait PolicyLearner: Send {
    /// Algorithm name
    fn name(&self) -> &str;

    /// Improve the policy from one transition and the critic's value signal
    fn update(
        &mut self,
        state: &State,
        action: &Action,
        next_state: &State,
        reward: Reward,
        value_signal: f64,
    ) -> Result<()>;

    /// Exploratory action for the state
    fn select_action(&self, state: &State, action: &mut Action, rng: &mut dyn RngCore)
        -> Result<()>;

    /// Noiseless action for the state
    fn greedy_action(&self, state: &State, action: &mut Action) -> Result<()>;

    /// Get algorithm parameters as JSON
    fn get_params(&self) -> serde_json::Value;
}

/// Continuous Actor Critic Learning Automaton.
///
/// Moves the policy mean toward the executed action:
/// `theta += alpha * (a - pi(s)) * phi(s)`.
///
/// The step is applied for every transition, scaled by the signed
/// deviation between the executed action and the policy output; the value
/// signal is not used to gate it.
pub struct CaclaLearner<V: FunctionApproximator> {
    policy: GaussianPolicy<V>,
    alpha: Box<dyn ScalarSource>,
    state_features: FeatureList,
    updates: u64,
    skipped: u64,
}

impl<V: FunctionApproximator> CaclaLearner<V> {
    pub fn new(policy: GaussianPolicy<V>, alpha: Box<dyn ScalarSource>) -> Self {
        Self {
            policy,
            alpha,
            state_features: FeatureList::new(),
            updates: 0,
            skipped: 0,
        }
    }

    pub fn policy(&self) -> &GaussianPolicy<V> {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut GaussianPolicy<V> {
        &mut self.policy
    }

    /// Updates that reached the function approximator
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Updates skipped because the learning rate was zero
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<V: FunctionApproximator> PolicyLearner for CaclaLearner<V> {
    fn name(&self) -> &str {
        "cacla"
    }

    fn update(
        &mut self,
        state: &State,
        action: &Action,
        _next_state: &State,
        _reward: Reward,
        _value_signal: f64,
    ) -> Result<()> {
        let index = self.policy.output_action_index();
        let executed = action.get(index).ok_or(CaclaError::DimensionMismatch {
            expected: index + 1,
            actual: action.dimension(),
        })?;

        let alpha = self.alpha.value();
        let noise = executed - self.policy.vfa().evaluate(state, action);

        self.policy
            .vfa()
            .features(state, action, &mut self.state_features);

        if alpha != 0.0 {
            self.policy
                .vfa_mut()
                .add(&self.state_features, alpha * noise);
            self.updates += 1;
        } else {
            self.skipped += 1;
        }
        Ok(())
    }

    fn select_action(
        &self,
        state: &State,
        action: &mut Action,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        self.policy.select_action(state, action, rng)
    }

    fn greedy_action(&self, state: &State, action: &mut Action) -> Result<()> {
        self.policy.greedy_action(state, action)
    }

    fn get_params(&self) -> serde_json::Value {
        serde_json::json!({
            "alpha": self.alpha.value(),
            "exploration_sigma": self.policy.sigma(),
            "output_action_index": self.policy.output_action_index(),
            "updates": self.updates,
            "skipped": self.skipped
        })
    }
}
