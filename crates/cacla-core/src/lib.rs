//! CACLA Core - Core types, schedules, and configuration
//!
//! This crate provides the state/action snapshots, scalar parameter
//! sources, error type and configuration shared by the learner and the CLI.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]

pub mod config;
pub mod error;
pub mod schedule;
pub mod snapshot;

pub use config::{ActorGate, Config};
pub use error::{CaclaError, Result};
pub use schedule::{Decay, ScalarSource, Schedule, ScheduledValue, TrainingClock};
pub use snapshot::{Action, Reward, Snapshot, Space, State, Variable};
