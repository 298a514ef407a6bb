//! Built-in environment for experiments
//!
//! A first-order system: the position follows the commanded velocity and the
//! agent is rewarded for keeping it close to a setpoint.

use rand::{Rng, RngCore};

use cacla_core::{Action, Result, Reward, Space, State};

/// Environment dynamics consumed by the training loop
pub trait World {
    fn state_space(&self) -> &Space;
    fn action_space(&self) -> &Space;

    /// Write an initial state into `state`
    fn reset(&mut self, state: &mut State, rng: &mut dyn RngCore) -> Result<()>;

    /// Advance one step, writing the successor into `next_state`
    fn step(&mut self, state: &State, action: &Action, next_state: &mut State) -> Result<Reward>;
}

/// Drive a point on a line to a moving setpoint
pub struct SetpointWorld {
    state_space: Space,
    action_space: Space,
    dt: f64,
}

impl SetpointWorld {
    pub const POSITION: usize = 0;
    pub const SETPOINT: usize = 1;
    pub const VELOCITY: usize = 0;

    pub fn new(dt: f64) -> Self {
        Self {
            state_space: Space::default()
                .with("position", -1.0, 1.0)
                .with("setpoint", -0.5, 0.5),
            action_space: Space::default().with("velocity", -1.0, 1.0),
            dt,
        }
    }
}

impl Default for SetpointWorld {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl World for SetpointWorld {
    fn state_space(&self) -> &Space {
        &self.state_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reset(&mut self, state: &mut State, rng: &mut dyn RngCore) -> Result<()> {
        state.set(Self::POSITION, rng.gen_range(-1.0..=1.0))?;
        state.set(Self::SETPOINT, rng.gen_range(-0.5..=0.5))?;
        Ok(())
    }

    fn step(&mut self, state: &State, action: &Action, next_state: &mut State) -> Result<Reward> {
        next_state.copy_from(state)?;

        let position = state.get(Self::POSITION).unwrap_or_default();
        let setpoint = state.get(Self::SETPOINT).unwrap_or_default();
        let velocity = action.get(Self::VELOCITY).unwrap_or_default();

        next_state.set(Self::POSITION, position + self.dt * velocity)?;
        self.state_space.clamp(next_state)?;

        let error = next_state.get(Self::POSITION).unwrap_or_default() - setpoint;
        Ok(-error.abs())
    }
}
