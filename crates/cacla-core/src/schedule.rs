//! Scalar parameter sources and decay schedules
//!
//! Learning rates and exploration widths are read through [`ScalarSource`]
//! so that the update code never depends on where a value comes from. A
//! plain `f64` is a constant source; [`ScheduledValue`] evaluates a
//! [`Schedule`] against the progress of a shared [`TrainingClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CaclaError, Result};

/// Provider of a scalar value that may change over training time
pub trait ScalarSource: Send + Sync {
    fn value(&self) -> f64;
}

impl ScalarSource for f64 {
    fn value(&self) -> f64 {
        *self
    }
}

impl<T: ScalarSource + ?Sized> ScalarSource for Arc<T> {
    fn value(&self) -> f64 {
        (**self).value()
    }
}

/// Shape of a schedule between its initial and end values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decay {
    #[default]
    Constant,
    Linear,
    Exponential,
}

/// Value schedule over normalized training progress in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub initial: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub decay: Decay,
}

impl Schedule {
    pub fn constant(value: f64) -> Self {
        Self {
            initial: value,
            end: value,
            decay: Decay::Constant,
        }
    }

    pub fn linear(initial: f64, end: f64) -> Self {
        Self {
            initial,
            end,
            decay: Decay::Linear,
        }
    }

    pub fn exponential(initial: f64, end: f64) -> Self {
        Self {
            initial,
            end,
            decay: Decay::Exponential,
        }
    }

    /// Evaluate the schedule at `progress`, clamped to `[0, 1]`
    pub fn value_at(&self, progress: f64) -> f64 {
        let p = progress.clamp(0.0, 1.0);
        match self.decay {
            Decay::Constant => self.initial,
            Decay::Linear => self.initial + (self.end - self.initial) * p,
            Decay::Exponential => self.initial * (self.end / self.initial).powf(p),
        }
    }

    /// Check the schedule can be evaluated over its whole range
    pub fn validate(&self, name: &str) -> Result<()> {
        if !self.initial.is_finite() || !self.end.is_finite() {
            return Err(CaclaError::Config(format!("{name}: values must be finite")));
        }
        if self.decay == Decay::Exponential && (self.initial <= 0.0 || self.end <= 0.0) {
            return Err(CaclaError::Config(format!(
                "{name}: exponential decay needs positive initial and end values"
            )));
        }
        Ok(())
    }

    /// Bind the schedule to a clock, producing a scalar source
    pub fn bind(self, clock: Arc<TrainingClock>) -> ScheduledValue {
        ScheduledValue {
            schedule: self,
            clock,
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::constant(0.0)
    }
}

/// Shared step counter driving schedules
#[derive(Debug, Default)]
pub struct TrainingClock {
    step: AtomicU64,
    horizon: u64,
}

impl TrainingClock {
    /// Create a clock that reaches full progress after `horizon` steps
    pub fn new(horizon: u64) -> Self {
        Self {
            step: AtomicU64::new(0),
            horizon,
        }
    }

    pub fn tick(&self) {
        self.step.fetch_add(1, Ordering::Relaxed);
    }

    pub fn step(&self) -> u64 {
        self.step.load(Ordering::Relaxed)
    }

    pub fn horizon(&self) -> u64 {
        self.horizon
    }

    /// Fraction of the horizon elapsed, in `[0, 1]`. A zero horizon never advances.
    pub fn progress(&self) -> f64 {
        if self.horizon == 0 {
            return 0.0;
        }
        (self.step() as f64 / self.horizon as f64).min(1.0)
    }
}

/// A schedule evaluated against a shared clock
#[derive(Debug, Clone)]
pub struct ScheduledValue {
    schedule: Schedule,
    clock: Arc<TrainingClock>,
}

impl ScheduledValue {
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }
}

impl ScalarSource for ScheduledValue {
    fn value(&self) -> f64 {
        self.schedule.value_at(self.clock.progress())
    }
}
