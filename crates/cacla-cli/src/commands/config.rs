//! Configuration management commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;

use cacla_core::Config;

const DEFAULT_CONFIG_PATH: &str = "cacla.toml";

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub fn run(cmd: ConfigCommands, settings: &Config, explicit: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(settings, explicit),
        ConfigCommands::Init { force } => init(Path::new(DEFAULT_CONFIG_PATH), force),
    }
}

fn show(settings: &Config, explicit: Option<&Path>) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    match config_source(explicit) {
        Some(path) => println!("Config file: {}\n", path.display()),
        None => println!("No configuration file found. Using defaults.\n"),
    }

    println!("{}", render(settings)?);
    Ok(())
}

/// File the effective configuration was read from, if any
pub fn config_source(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(Config::find_config_file)
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    std::fs::write(path, render(&Config::default())?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Configuration file created: {}", path.display());

    Ok(())
}

fn render(settings: &Config) -> Result<String> {
    toml::to_string_pretty(settings).context("Failed to render configuration")
}
