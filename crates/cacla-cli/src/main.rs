//! CACLA CLI - run continuous-action learning experiments
//!
//! Trains an actor-critic agent on the built-in setpoint world and inspects
//! the effective configuration.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cacla_core::Config;

mod commands;
mod world;

use commands::{config, train};

#[derive(Parser)]
#[command(name = "cacla")]
#[command(author, version, about = "CACLA - continuous actor-critic learning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent on the setpoint world
    Train(train::TrainArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Config::load(cli.config.as_deref())?;

    // Initialize logging based on verbosity, falling back to the configured level
    let log_level = if cli.verbose {
        "debug"
    } else {
        settings.logging.level.as_str()
    };
    init_logging(log_level, settings.logging.json);

    // Config loading runs before the subscriber is installed
    match config::config_source(cli.config.as_deref()) {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    match cli.command {
        Commands::Train(args) => train::run(&settings, &args),
        Commands::Config(cmd) => config::run(cmd, &settings, cli.config.as_deref()),
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("cacla_cli={level},cacla_rl={level},cacla_core={level}").into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}
