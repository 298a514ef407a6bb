//! Configuration loading and validation tests

#![allow(clippy::float_cmp)]

use std::io::Write;

use cacla_core::schedule::Decay;
use cacla_core::{ActorGate, CaclaError, Config};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    assert_eq!(config.replay.buffer_size, 1000);
    assert_eq!(config.replay.update_batch_size, 10);
    assert_eq!(config.replay.min_update_size_times, 2);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.actor.gate, ActorGate::Always);
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
[replay]
buffer_size = 64
update_batch_size = 4

[actor]
gate = "positive_td"

[actor.alpha]
initial = 0.2
end = 0.0
decay = "linear"

[critic]
gamma = 0.5

[experiment]
episodes = 3
seed = 7
"#,
    );

    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.replay.buffer_size, 64);
    assert_eq!(config.replay.update_batch_size, 4);
    // Untouched fields keep their defaults
    assert_eq!(config.replay.min_update_size_times, 2);
    assert_eq!(config.actor.gate, ActorGate::PositiveTd);
    assert_eq!(config.actor.alpha.decay, Decay::Linear);
    assert_eq!(config.actor.alpha.initial, 0.2);
    assert_eq!(config.critic.gamma, 0.5);
    assert_eq!(config.experiment.episodes, 3);
    assert_eq!(config.experiment.steps_per_episode, 100);
    assert_eq!(config.experiment.seed, 7);
}

#[test]
fn test_load_disabled_replay() {
    let file = write_config(
        r#"
[replay]
buffer_size = 0
update_batch_size = 0
"#,
    );

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.replay.buffer_size, 0);
}

#[test]
fn test_load_rejects_zero_batch_with_enabled_replay() {
    let file = write_config(
        r#"
[replay]
buffer_size = 10
update_batch_size = 0
"#,
    );

    assert!(Config::load(Some(file.path())).is_err());
}

#[test]
fn test_load_missing_explicit_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");

    assert!(Config::load(Some(&missing)).is_err());
}

#[test]
fn test_validate_gamma_range() {
    let mut config = Config::default();
    config.critic.gamma = 1.5;

    let err = config.validate().unwrap_err();
    assert!(matches!(err, CaclaError::Config(_)));
}

#[test]
fn test_validate_feature_points() {
    let mut config = Config::default();
    config.features.points_per_dimension = 1;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_multiplier() {
    let mut config = Config::default();
    config.replay.min_update_size_times = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_total_steps() {
    let config = Config::default();
    assert_eq!(config.experiment.total_steps(), 200 * 100);
}

#[test]
fn test_config_renders_as_toml() {
    let config = Config::default();
    let rendered = toml::to_string_pretty(&config).unwrap();

    assert!(rendered.contains("[replay]"));
    assert!(rendered.contains("buffer_size = 1000"));
}
