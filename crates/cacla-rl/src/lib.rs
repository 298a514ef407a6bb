//! CACLA RL - Experience replay and continuous-action actor-critic learning
//!
//! This crate provides the per-step update path of a continuous-action
//! learner: a fixed-capacity experience replay buffer, a CACLA actor, a
//! TD(0) critic and the engine that drives them.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::float_cmp)]
#![allow(clippy::similar_names)]

pub mod actor;
pub mod critic;
pub mod engine;
pub mod experience;
pub mod features;
pub mod policy;
pub mod transition;
pub mod vfa;

pub use actor::{CaclaLearner, PolicyLearner};
pub use critic::{Critic, TdCritic};
pub use engine::{EngineStats, LearningEngine};
pub use experience::ExperienceBuffer;
pub use features::{FeatureList, FeatureMap, GridDimension, Input, RbfGrid};
pub use policy::GaussianPolicy;
pub use transition::Transition;
pub use vfa::{FunctionApproximator, LinearVfa};
