//! Training command

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use cacla_core::{Config, TrainingClock};
use cacla_rl::{
    CaclaLearner, EngineStats, ExperienceBuffer, GaussianPolicy, LearningEngine, LinearVfa,
    RbfGrid, TdCritic,
};

use crate::world::{SetpointWorld, World};

#[derive(Args, Debug, Default)]
pub struct TrainArgs {
    /// Number of episodes (overrides experiment.episodes)
    #[arg(short, long)]
    pub episodes: Option<usize>,

    /// Steps per episode (overrides experiment.steps_per_episode)
    #[arg(long)]
    pub steps: Option<usize>,

    /// Random seed (overrides experiment.seed)
    #[arg(short, long)]
    pub seed: Option<u64>,
}

/// Outcome of a training run
#[derive(Debug, Serialize)]
pub struct TrainingSummary {
    pub episodes: usize,
    pub first_return: f64,
    pub last_return: f64,
    pub best_return: f64,
    pub engine: EngineStats,
}

pub fn run(settings: &Config, args: &TrainArgs) -> Result<()> {
    let mut settings = settings.clone();
    if let Some(episodes) = args.episodes {
        settings.experiment.episodes = episodes;
    }
    if let Some(steps) = args.steps {
        settings.experiment.steps_per_episode = steps;
    }
    if let Some(seed) = args.seed {
        settings.experiment.seed = seed;
    }
    settings.validate()?;

    let mut world = SetpointWorld::default();
    let summary = train(&settings, &mut world)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to render summary")?
    );
    Ok(())
}

/// Assemble critic, actor and replay for `world` from configuration
pub fn build_engine(settings: &Config, world: &dyn World) -> Result<LearningEngine> {
    let state_space = world.state_space();
    let action_space = world.action_space();
    let bounds = action_space
        .variable(SetpointWorld::VELOCITY)
        .context("World has no action variable")?
        .clone();
    let points = settings.features.points_per_dimension;
    let clock = Arc::new(TrainingClock::new(settings.experiment.total_steps()));

    let critic = TdCritic::new(
        LinearVfa::new(RbfGrid::over_state(state_space, points)?),
        Box::new(settings.critic.alpha.bind(Arc::clone(&clock))),
        settings.critic.gamma,
    )?;

    let policy = GaussianPolicy::new(
        LinearVfa::new(RbfGrid::over_state(state_space, points)?),
        SetpointWorld::VELOCITY,
        bounds,
        Box::new(settings.actor.exploration_sigma.bind(Arc::clone(&clock))),
    );
    let actor = CaclaLearner::new(
        policy,
        Box::new(settings.actor.alpha.bind(Arc::clone(&clock))),
    );

    let mut engine = LearningEngine::new(
        Box::new(critic),
        Box::new(actor),
        ExperienceBuffer::from_config(&settings.replay),
        clock,
        settings.experiment.seed,
    )
    .with_actor_gate(settings.actor.gate);
    engine.allocate(state_space.dimension(), action_space.dimension())?;

    Ok(engine)
}

/// Run the configured number of episodes
pub fn train(settings: &Config, world: &mut dyn World) -> Result<TrainingSummary> {
    let mut engine = build_engine(settings, world)?;
    let mut rng = StdRng::seed_from_u64(settings.experiment.seed.wrapping_add(1));

    let mut state = world.state_space().instance();
    let mut next_state = world.state_space().instance();
    let mut action = world.action_space().instance();

    let episodes = settings.experiment.episodes;
    let mut returns = Vec::with_capacity(episodes);

    info!(
        episodes,
        steps_per_episode = settings.experiment.steps_per_episode,
        replay = engine.replay().is_enabled(),
        "Starting training"
    );

    for episode in 0..episodes {
        world.reset(&mut state, &mut rng)?;
        let mut episode_return = 0.0;
        let mut updates = 0;

        for _ in 0..settings.experiment.steps_per_episode {
            engine.select_action(&state, &mut action)?;
            let reward = world.step(&state, &action, &mut next_state)?;
            updates += engine.step(&state, &action, &next_state, reward, 1.0)?;
            episode_return += reward;
            state.copy_from(&next_state)?;
        }

        debug!(episode, updates, "Episode updates");
        info!(
            episode,
            episode_return,
            progress = engine.clock().progress(),
            "Episode finished"
        );
        returns.push(episode_return);
    }

    let stats = engine.stats();
    info!(
        total_steps = stats.total_steps,
        total_updates = stats.total_updates,
        actor_updates = stats.actor_updates,
        "Training complete"
    );

    Ok(TrainingSummary {
        episodes,
        first_return: returns.first().copied().unwrap_or_default(),
        last_return: returns.last().copied().unwrap_or_default(),
        best_return: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        engine: stats,
    })
}
