//! Learning engine - coordinates replay, critic and actor updates

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::debug;

use cacla_core::{Action, ActorGate, CaclaError, Result, Reward, Snapshot, State, TrainingClock};

use crate::actor::PolicyLearner;
use crate::critic::Critic;
use crate::experience::ExperienceBuffer;

/// Per-step learner driving a critic and an actor.
///
/// With replay disabled every step learns from the live transition. With
/// replay enabled the transition is stored, and once the warm-up threshold
/// is reached each step learns from `batch_size` sampled transitions.
///
/// The critic sees every transition. Whether the actor does is decided by
/// the [`ActorGate`]; the default forwards all of them.
pub struct LearningEngine {
    critic: Box<dyn Critic>,
    actor: Box<dyn PolicyLearner>,
    gate: ActorGate,
    replay: ExperienceBuffer,
    dimensions: Option<(usize, usize)>,
    rng: StdRng,
    clock: Arc<TrainingClock>,
    total_steps: u64,
    total_updates: u64,
    actor_updates: u64,
    total_rewards: f64,
    last_td_error: f64,
}

impl LearningEngine {
    pub fn new(
        critic: Box<dyn Critic>,
        actor: Box<dyn PolicyLearner>,
        replay: ExperienceBuffer,
        clock: Arc<TrainingClock>,
        seed: u64,
    ) -> Self {
        Self {
            critic,
            actor,
            gate: ActorGate::default(),
            replay,
            dimensions: None,
            rng: StdRng::seed_from_u64(seed),
            clock,
            total_steps: 0,
            total_updates: 0,
            actor_updates: 0,
            total_rewards: 0.0,
            last_td_error: 0.0,
        }
    }

    pub fn with_actor_gate(mut self, gate: ActorGate) -> Self {
        self.gate = gate;
        self
    }

    /// Allocate replay storage once the state and action dimensions are known.
    ///
    /// Every later step is checked against these dimensions.
    pub fn allocate(&mut self, state_dimension: usize, action_dimension: usize) -> Result<()> {
        self.replay.allocate(state_dimension, action_dimension)?;
        self.dimensions = Some((state_dimension, action_dimension));
        Ok(())
    }

    /// Exploratory action from the actor's policy
    pub fn select_action(&mut self, state: &State, action: &mut Action) -> Result<()> {
        self.actor.select_action(state, action, &mut self.rng)
    }

    pub fn greedy_action(&self, state: &State, action: &mut Action) -> Result<()> {
        self.actor.greedy_action(state, action)
    }

    /// Process one environment step. Returns the number of transitions learned from.
    ///
    /// A step rejected by validation or by the replay buffer leaves the
    /// statistics and the training clock untouched.
    pub fn step(
        &mut self,
        state: &State,
        action: &Action,
        next_state: &State,
        reward: Reward,
        probability: f64,
    ) -> Result<usize> {
        self.check_dimensions(state, action, next_state)?;

        if !self.replay.is_enabled() {
            self.record_step(reward);
            self.learn(state, action, next_state, reward)?;
            return Ok(1);
        }

        self.replay
            .push(state, action, next_state, reward, probability)?;
        self.record_step(reward);

        if !self.replay.has_enough_data() {
            return Ok(0);
        }

        let batch_size = self.replay.batch_size();
        for _ in 0..batch_size {
            let t = self.replay.sample_one(&mut self.rng);
            let td = self
                .critic
                .update(&t.state, &t.action, &t.next_state, t.reward)?;
            if Self::passes(self.gate, td) {
                self.actor
                    .update(&t.state, &t.action, &t.next_state, t.reward, td)?;
                self.actor_updates += 1;
            }
            self.last_td_error = td;
            self.total_updates += 1;
        }

        debug!(
            step = self.total_steps,
            batch_size,
            td_error = self.last_td_error,
            "Replay batch update complete"
        );

        Ok(batch_size)
    }

    fn learn(
        &mut self,
        state: &State,
        action: &Action,
        next_state: &State,
        reward: Reward,
    ) -> Result<()> {
        let td = self.critic.update(state, action, next_state, reward)?;
        if Self::passes(self.gate, td) {
            self.actor.update(state, action, next_state, reward, td)?;
            self.actor_updates += 1;
        }
        self.last_td_error = td;
        self.total_updates += 1;
        Ok(())
    }

    fn record_step(&mut self, reward: Reward) {
        self.total_steps += 1;
        self.total_rewards += reward;
        self.clock.tick();
    }

    fn check_dimensions(&self, state: &State, action: &Action, next_state: &State) -> Result<()> {
        let Some((state_dimension, action_dimension)) = self.dimensions else {
            return Ok(());
        };
        let check = |snapshot: &Snapshot, expected: usize| {
            if snapshot.dimension() == expected {
                Ok(())
            } else {
                Err(CaclaError::DimensionMismatch {
                    expected,
                    actual: snapshot.dimension(),
                })
            }
        };
        check(state, state_dimension)?;
        check(action, action_dimension)?;
        check(next_state, state_dimension)
    }

    fn passes(gate: ActorGate, td: f64) -> bool {
        match gate {
            ActorGate::Always => true,
            ActorGate::PositiveTd => td > 0.0,
        }
    }

    pub fn replay(&self) -> &ExperienceBuffer {
        &self.replay
    }

    pub fn clock(&self) -> &Arc<TrainingClock> {
        &self.clock
    }

    pub fn value(&self, state: &State, action: &Action) -> f64 {
        self.critic.value(state, action)
    }

    /// Get statistics
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_steps: self.total_steps,
            total_updates: self.total_updates,
            actor_updates: self.actor_updates,
            total_rewards: self.total_rewards,
            average_reward: if self.total_steps > 0 {
                self.total_rewards / self.total_steps as f64
            } else {
                0.0
            },
            last_td_error: self.last_td_error,
            buffer_size: self.replay.len(),
            replay_enabled: self.replay.is_enabled(),
            actor: self.actor.name().to_string(),
            critic: self.critic.name().to_string(),
        }
    }

    /// Get actor parameters
    pub fn actor_params(&self) -> serde_json::Value {
        self.actor.get_params()
    }

    /// Clear experience buffer
    pub fn clear_buffer(&mut self) {
        self.replay.clear();
    }
}

/// Engine statistics
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub total_steps: u64,
    pub total_updates: u64,
    pub actor_updates: u64,
    pub total_rewards: f64,
    pub average_reward: f64,
    pub last_td_error: f64,
    pub buffer_size: usize,
    pub replay_enabled: bool,
    pub actor: String,
    pub critic: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use cacla_core::{CaclaError, Snapshot};
    use rand::RngCore;

    /// Critic returning a fixed TD error and counting calls
    struct CountingCritic {
        td: f64,
        calls: Arc<Mutex<Vec<f64>>>,
    }

    impl Critic for CountingCritic {
        fn name(&self) -> &str {
            "counting"
        }

        fn update(&mut self, _: &State, _: &Action, _: &State, reward: Reward) -> Result<f64> {
            self.calls.lock().unwrap().push(reward);
            Ok(self.td)
        }

        fn value(&self, _: &State, _: &Action) -> f64 {
            0.0
        }
    }

    /// Actor recording the rewards and value signals it sees
    struct RecordingActor {
        seen: Arc<Mutex<Vec<(f64, f64)>>>,
    }

    impl PolicyLearner for RecordingActor {
        fn name(&self) -> &str {
            "recording"
        }

        fn update(
            &mut self,
            _: &State,
            _: &Action,
            _: &State,
            reward: Reward,
            td: f64,
        ) -> Result<()> {
            self.seen.lock().unwrap().push((reward, td));
            Ok(())
        }

        fn select_action(&self, _: &State, action: &mut Action, _: &mut dyn RngCore) -> Result<()> {
            action.set(0, 0.5)
        }

        fn greedy_action(&self, _: &State, action: &mut Action) -> Result<()> {
            action.set(0, 0.0)
        }

        fn get_params(&self) -> serde_json::Value {
            serde_json::json!({})
        }
    }

    type Log<T> = Arc<Mutex<Vec<T>>>;

    fn create_engine(replay: ExperienceBuffer) -> (LearningEngine, Log<f64>, Log<(f64, f64)>) {
        let critic_calls = Arc::new(Mutex::new(Vec::new()));
        let actor_calls = Arc::new(Mutex::new(Vec::new()));
        let mut engine = LearningEngine::new(
            Box::new(CountingCritic {
                td: 0.7,
                calls: Arc::clone(&critic_calls),
            }),
            Box::new(RecordingActor {
                seen: Arc::clone(&actor_calls),
            }),
            replay,
            Arc::new(TrainingClock::new(100)),
            1,
        );
        engine.allocate(1, 1).unwrap();
        (engine, critic_calls, actor_calls)
    }

    fn step(engine: &mut LearningEngine, reward: f64) -> Result<usize> {
        let s = Snapshot::from_vec(vec![0.0]);
        let a = Snapshot::from_vec(vec![0.0]);
        engine.step(&s, &a, &s, reward, 1.0)
    }

    #[test]
    fn test_online_learning_without_replay() {
        let (mut engine, critic_calls, actor_calls) = create_engine(ExperienceBuffer::disabled());

        assert_eq!(step(&mut engine, 1.0).unwrap(), 1);
        assert_eq!(step(&mut engine, 2.0).unwrap(), 1);

        assert_eq!(*critic_calls.lock().unwrap(), vec![1.0, 2.0]);
        // Actor receives the critic's TD error, in temporal order
        assert_eq!(*actor_calls.lock().unwrap(), vec![(1.0, 0.7), (2.0, 0.7)]);

        let stats = engine.stats();
        assert_eq!(stats.total_steps, 2);
        assert_eq!(stats.total_updates, 2);
        assert_eq!(stats.actor_updates, 2);
        assert_eq!(stats.buffer_size, 0);
        assert!(!stats.replay_enabled);
        assert_eq!(stats.last_td_error, 0.7);
    }

    #[test]
    fn test_replay_waits_for_warm_up() {
        let replay = ExperienceBuffer::new(10, 2).with_min_batch_multiplier(2);
        let (mut engine, critic_calls, _) = create_engine(replay);

        for _ in 0..3 {
            assert_eq!(step(&mut engine, 1.0).unwrap(), 0);
        }
        assert!(critic_calls.lock().unwrap().is_empty());

        // Fourth transition reaches min(10, 2 * 2)
        assert_eq!(step(&mut engine, 1.0).unwrap(), 2);
        assert_eq!(critic_calls.lock().unwrap().len(), 2);
        assert_eq!(engine.stats().buffer_size, 4);
    }

    #[test]
    fn test_replay_samples_stored_transitions() {
        let replay = ExperienceBuffer::new(3, 4).with_min_batch_multiplier(1);
        let (mut engine, _, actor_calls) = create_engine(replay);

        for reward in [1.0, 2.0, 3.0, 4.0, 5.0] {
            step(&mut engine, reward).unwrap();
        }

        // Only the three most recent rewards can be sampled once 1 and 2 are evicted
        let seen = actor_calls.lock().unwrap();
        let last_batch = &seen[seen.len() - 4..];
        assert!(last_batch.iter().all(|(r, _)| *r >= 3.0));
    }

    #[test]
    fn test_positive_td_gate() {
        let critic_calls = Arc::new(Mutex::new(Vec::new()));
        let actor_calls = Arc::new(Mutex::new(Vec::new()));
        let mut engine = LearningEngine::new(
            Box::new(CountingCritic {
                td: -0.2,
                calls: Arc::clone(&critic_calls),
            }),
            Box::new(RecordingActor {
                seen: Arc::clone(&actor_calls),
            }),
            ExperienceBuffer::disabled(),
            Arc::new(TrainingClock::new(10)),
            0,
        )
        .with_actor_gate(ActorGate::PositiveTd);

        step(&mut engine, 1.0).unwrap();

        assert_eq!(critic_calls.lock().unwrap().len(), 1);
        assert!(actor_calls.lock().unwrap().is_empty());
        assert_eq!(engine.stats().actor_updates, 0);
        assert_eq!(engine.stats().total_updates, 1);
    }

    #[test]
    fn test_step_ticks_clock() {
        let (mut engine, _, _) = create_engine(ExperienceBuffer::disabled());
        step(&mut engine, 0.0).unwrap();
        step(&mut engine, 0.0).unwrap();
        assert_eq!(engine.clock().step(), 2);
    }

    #[test]
    fn test_unallocated_replay_is_reported() {
        let mut engine = LearningEngine::new(
            Box::new(CountingCritic {
                td: 0.0,
                calls: Arc::new(Mutex::new(Vec::new())),
            }),
            Box::new(RecordingActor {
                seen: Arc::new(Mutex::new(Vec::new())),
            }),
            ExperienceBuffer::new(4, 1),
            Arc::new(TrainingClock::new(10)),
            0,
        );

        assert!(matches!(step(&mut engine, 1.0), Err(CaclaError::NotAllocated)));
    }

    /// Critic that fails on its `fail_at`-th call
    struct FlakyCritic {
        calls: usize,
        fail_at: usize,
    }

    impl Critic for FlakyCritic {
        fn name(&self) -> &str {
            "flaky"
        }

        fn update(&mut self, _: &State, _: &Action, _: &State, _: Reward) -> Result<f64> {
            self.calls += 1;
            if self.calls == self.fail_at {
                return Err(CaclaError::Config("critic failure".to_string()));
            }
            Ok(1.0)
        }

        fn value(&self, _: &State, _: &Action) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_rejected_push_leaves_state_untouched() {
        let replay = ExperienceBuffer::new(4, 1);
        let (mut engine, critic_calls, _) = create_engine(replay);
        let wide = Snapshot::zeros(3);
        let a = Snapshot::zeros(1);

        let err = engine.step(&wide, &a, &wide, 5.0, 1.0).unwrap_err();
        assert!(matches!(err, CaclaError::DimensionMismatch { .. }));

        let stats = engine.stats();
        assert_eq!(stats.total_steps, 0);
        assert_eq!(stats.total_rewards, 0.0);
        assert_eq!(stats.buffer_size, 0);
        assert_eq!(engine.clock().step(), 0);
        assert!(critic_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_online_step_checks_dimensions_before_learning() {
        let (mut engine, critic_calls, actor_calls) = create_engine(ExperienceBuffer::disabled());
        let s = Snapshot::zeros(1);
        let wide_action = Snapshot::zeros(2);

        let err = engine.step(&s, &wide_action, &s, 5.0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            CaclaError::DimensionMismatch {
                expected: 1,
                actual: 2
            }
        ));

        assert_eq!(engine.stats().total_steps, 0);
        assert_eq!(engine.stats().total_updates, 0);
        assert_eq!(engine.clock().step(), 0);
        assert!(critic_calls.lock().unwrap().is_empty());
        assert!(actor_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_batch_counts_finished_samples() {
        let actor_calls = Arc::new(Mutex::new(Vec::new()));
        let mut engine = LearningEngine::new(
            Box::new(FlakyCritic {
                calls: 0,
                fail_at: 2,
            }),
            Box::new(RecordingActor {
                seen: Arc::clone(&actor_calls),
            }),
            ExperienceBuffer::new(4, 3).with_min_batch_multiplier(1),
            Arc::new(TrainingClock::new(10)),
            0,
        );
        engine.allocate(1, 1).unwrap();

        for _ in 0..2 {
            assert_eq!(step(&mut engine, 1.0).unwrap(), 0);
        }
        // The third push reaches the threshold; the second sample fails
        assert!(step(&mut engine, 1.0).is_err());

        let stats = engine.stats();
        assert_eq!(stats.total_steps, 3);
        assert_eq!(stats.total_updates, 1);
        assert_eq!(stats.actor_updates, 1);
        assert_eq!(actor_calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_select_action_delegates_to_actor() {
        let (mut engine, _, _) = create_engine(ExperienceBuffer::disabled());
        let s = Snapshot::zeros(1);
        let mut a = Snapshot::zeros(1);

        engine.select_action(&s, &mut a).unwrap();
        assert_eq!(a.values(), &[0.5]);
    }

    #[test]
    fn test_clear_buffer() {
        let replay = ExperienceBuffer::new(10, 1);
        let (mut engine, _, _) = create_engine(replay);

        step(&mut engine, 1.0).unwrap();
        assert_eq!(engine.stats().buffer_size, 1);

        engine.clear_buffer();
        assert_eq!(engine.stats().buffer_size, 0);
    }
}
