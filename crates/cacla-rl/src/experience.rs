//! Experience replay buffer for RL
//!
//! The buffer is built in two phases: construction records the capacity and
//! batch size, and [`ExperienceBuffer::allocate`] creates the slots once the
//! state and action dimensions are known. After that no insertion allocates;
//! every push copies into an existing slot, overwriting the oldest one once
//! the ring is full.

use rand::Rng;
use tracing::info;

use cacla_core::config::{ReplayConfig, DEFAULT_MIN_UPDATE_SIZE_TIMES};
use cacla_core::{Action, CaclaError, Result, Reward, State};

use crate::transition::Transition;

/// Fixed-capacity ring buffer of transitions
#[derive(Debug)]
pub struct ExperienceBuffer {
    slots: Box<[Transition]>,
    allocated: bool,
    capacity: usize,
    batch_size: usize,
    min_batch_multiplier: usize,
    write_cursor: usize,
    filled: usize,
}

impl ExperienceBuffer {
    /// Configure a buffer. Storage is not allocated until [`allocate`](Self::allocate).
    ///
    /// A capacity of 0 yields an inert buffer.
    pub fn new(capacity: usize, batch_size: usize) -> Self {
        Self {
            slots: Box::default(),
            allocated: false,
            capacity,
            batch_size,
            min_batch_multiplier: DEFAULT_MIN_UPDATE_SIZE_TIMES,
            write_cursor: 0,
            filled: 0,
        }
    }

    /// Buffer for learners that do not use replay
    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    pub fn from_config(config: &ReplayConfig) -> Self {
        Self::new(config.buffer_size, config.update_batch_size)
            .with_min_batch_multiplier(config.min_update_size_times)
    }

    /// Set how many batches worth of transitions are needed before sampling.
    ///
    /// Zero is rejected by [`allocate`](Self::allocate).
    pub fn with_min_batch_multiplier(mut self, multiplier: usize) -> Self {
        self.min_batch_multiplier = multiplier;
        self
    }

    /// Change the configured sizes. Only valid before allocation.
    pub fn configure(&mut self, capacity: usize, batch_size: usize) -> Result<()> {
        if self.allocated {
            return Err(CaclaError::AlreadyAllocated);
        }
        self.capacity = capacity;
        self.batch_size = batch_size;
        Ok(())
    }

    /// Allocate `capacity` slots sized for the given dimensions.
    ///
    /// Must be called exactly once before the first push. Does nothing for a
    /// disabled buffer.
    pub fn allocate(&mut self, state_dimension: usize, action_dimension: usize) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        if self.allocated {
            return Err(CaclaError::AlreadyAllocated);
        }
        if self.batch_size == 0 {
            return Err(CaclaError::Config(
                "experience replay batch size must be at least 1".to_string(),
            ));
        }
        if self.min_batch_multiplier == 0 {
            return Err(CaclaError::Config(
                "experience replay warm-up multiplier must be at least 1".to_string(),
            ));
        }

        self.slots = (0..self.capacity)
            .map(|_| Transition::blank(state_dimension, action_dimension))
            .collect();
        self.allocated = true;

        info!(
            capacity = self.capacity,
            batch_size = self.batch_size,
            "Experience replay buffer initialized"
        );
        Ok(())
    }

    /// Copy a transition into the slot at the write cursor.
    ///
    /// Once the buffer is full this overwrites the oldest transition.
    pub fn push(
        &mut self,
        state: &State,
        action: &Action,
        next_state: &State,
        reward: Reward,
        probability: f64,
    ) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        if !self.allocated {
            return Err(CaclaError::NotAllocated);
        }

        self.slots[self.write_cursor].copy_from(state, action, next_state, reward, probability)?;

        if self.filled < self.capacity {
            self.filled += 1;
        }
        self.write_cursor = (self.write_cursor + 1) % self.capacity;
        Ok(())
    }

    pub fn push_transition(&mut self, transition: &Transition) -> Result<()> {
        self.push(
            &transition.state,
            &transition.action,
            &transition.next_state,
            transition.reward,
            transition.probability,
        )
    }

    /// Number of stored transitions needed before sampling is allowed
    pub fn min_required(&self) -> usize {
        self.capacity
            .min(self.min_batch_multiplier.saturating_mul(self.batch_size))
    }

    /// Whether the warm-up threshold has been reached.
    ///
    /// Always false when disabled, unallocated or empty, so a `true` answer
    /// guarantees [`sample_one`](Self::sample_one) succeeds.
    pub fn has_enough_data(&self) -> bool {
        self.allocated && self.filled > 0 && self.filled >= self.min_required()
    }

    /// Draw one stored transition uniformly at random.
    ///
    /// Only slots that have been written are eligible.
    ///
    /// # Panics
    /// Panics if the buffer holds no transitions.
    pub fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> &Transition {
        assert!(
            self.filled > 0,
            "Cannot sample from an empty experience buffer"
        );
        &self.slots[rng.gen_range(0..self.filled)]
    }

    /// Draw `batch_size` transitions with replacement.
    ///
    /// # Panics
    /// Panics if the buffer holds no transitions.
    pub fn sample_batch<'a, R: Rng + ?Sized>(
        &'a self,
        rng: &'a mut R,
    ) -> impl Iterator<Item = &'a Transition> + 'a {
        assert!(
            self.filled > 0,
            "Cannot sample from an empty experience buffer"
        );
        (0..self.batch_size).map(move |_| self.sample_one(&mut *rng))
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity != 0
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Number of valid transitions
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn is_full(&self) -> bool {
        self.is_enabled() && self.filled == self.capacity
    }

    /// Slot the next push will overwrite
    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    /// Forget all stored transitions, keeping the allocated slots
    pub fn clear(&mut self) {
        self.filled = 0;
        self.write_cursor = 0;
    }

    /// Stored transitions in slot order (not insertion order once wrapped)
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.slots[..self.filled].iter()
    }
}

impl Default for ExperienceBuffer {
    fn default() -> Self {
        Self::from_config(&ReplayConfig::default())
    }
}
