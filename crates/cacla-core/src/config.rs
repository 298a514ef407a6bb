//! Configuration loading for CACLA

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::CaclaError;
use crate::schedule::Schedule;

/// Default number of batches worth of tuples required before replay starts
pub const DEFAULT_MIN_UPDATE_SIZE_TIMES: usize = 2;

/// Top-level learner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub replay: ReplayConfig,
    pub actor: ActorConfig,
    pub critic: CriticConfig,
    pub features: FeatureConfig,
    pub experiment: ExperimentConfig,
    pub logging: LoggingConfig,
}

/// Experience replay settings. A `buffer_size` of 0 disables replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub buffer_size: usize,
    pub update_batch_size: usize,
    pub min_update_size_times: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            update_batch_size: 10,
            min_update_size_times: DEFAULT_MIN_UPDATE_SIZE_TIMES,
        }
    }
}

/// When the engine forwards a transition to the actor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorGate {
    /// Every transition reaches the actor
    #[default]
    Always,
    /// Only transitions whose TD error is positive reach the actor
    PositiveTd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    pub gate: ActorGate,
    pub alpha: Schedule,
    pub exploration_sigma: Schedule,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            gate: ActorGate::Always,
            alpha: Schedule::constant(0.05),
            exploration_sigma: Schedule::linear(0.5, 0.05),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticConfig {
    pub gamma: f64,
    pub alpha: Schedule,
}

impl Default for CriticConfig {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            alpha: Schedule::constant(0.1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Number of RBF centers along each input variable
    pub points_per_dimension: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            points_per_dimension: 11,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub episodes: usize,
    pub steps_per_episode: usize,
    pub seed: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            episodes: 200,
            steps_per_episode: 100,
            seed: 42,
        }
    }
}

impl ExperimentConfig {
    /// Total number of environment steps in the experiment
    pub fn total_steps(&self) -> u64 {
        (self.episodes as u64).saturating_mul(self.steps_per_episode as u64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// An explicit `path` must exist; otherwise the usual locations are searched.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path.is_some();
        let config_path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(),
        };

        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        if let Some(path) = &config_path {
            tracing::info!("Loading config from: {:?}", path);
            builder = builder.add_source(File::from(path.clone()).required(explicit));
        } else {
            tracing::info!("No config file found, using defaults");
        }

        // Environment variables with CACLA_ prefix, e.g. CACLA__REPLAY__BUFFER_SIZE
        builder = builder.add_source(
            Environment::with_prefix("CACLA")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> std::result::Result<(), CaclaError> {
        if self.replay.buffer_size > 0 && self.replay.update_batch_size == 0 {
            return Err(CaclaError::Config(
                "replay.update_batch_size must be at least 1 when replay is enabled".to_string(),
            ));
        }
        if self.replay.min_update_size_times == 0 {
            return Err(CaclaError::Config(
                "replay.min_update_size_times must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.critic.gamma) {
            return Err(CaclaError::Config(format!(
                "critic.gamma must be within [0, 1], got {}",
                self.critic.gamma
            )));
        }
        if self.features.points_per_dimension < 2 {
            return Err(CaclaError::Config(
                "features.points_per_dimension must be at least 2".to_string(),
            ));
        }
        if self.experiment.steps_per_episode == 0 {
            return Err(CaclaError::Config(
                "experiment.steps_per_episode must be at least 1".to_string(),
            ));
        }
        self.actor.alpha.validate("actor.alpha")?;
        self.actor.exploration_sigma.validate("actor.exploration_sigma")?;
        self.critic.alpha.validate("critic.alpha")?;
        Ok(())
    }

    /// Find the configuration file
    pub fn find_config_file() -> Option<PathBuf> {
        // Check in order: CACLA_CONFIG env, ./cacla.toml, ~/.config/cacla/cacla.toml
        if let Ok(path) = std::env::var("CACLA_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from("cacla.toml");
        if local.exists() {
            return Some(local);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config").join("cacla").join("cacla.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }
}
