//! Transition tuples recorded from environment interaction

use serde::{Deserialize, Serialize};

use cacla_core::{Action, Result, Reward, State};

/// A single transition (s, a, s', r) with its importance-sampling probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: State,
    pub action: Action,
    pub next_state: State,
    pub reward: Reward,
    pub probability: f64,
}

impl Transition {
    /// Probability used when transitions are not importance weighted
    pub const DEFAULT_PROBABILITY: f64 = 1.0;

    /// Create a new transition with the default probability
    pub fn new(state: State, action: Action, next_state: State, reward: Reward) -> Self {
        Self {
            state,
            action,
            next_state,
            reward,
            probability: Self::DEFAULT_PROBABILITY,
        }
    }

    /// Zeroed transition used as a pre-allocated buffer slot
    pub fn blank(state_dimension: usize, action_dimension: usize) -> Self {
        Self::new(
            State::zeros(state_dimension),
            Action::zeros(action_dimension),
            State::zeros(state_dimension),
            0.0,
        )
    }

    /// Overwrite this transition in place.
    ///
    /// All dimensions are checked before anything is written, so a failed
    /// copy leaves the slot untouched.
    pub fn copy_from(
        &mut self,
        state: &State,
        action: &Action,
        next_state: &State,
        reward: Reward,
        probability: f64,
    ) -> Result<()> {
        self.state.ensure_dimension(state.dimension())?;
        self.action.ensure_dimension(action.dimension())?;
        self.next_state.ensure_dimension(next_state.dimension())?;

        self.state.copy_from(state)?;
        self.action.copy_from(action)?;
        self.next_state.copy_from(next_state)?;
        self.reward = reward;
        self.probability = probability;
        Ok(())
    }
}
