//! Configuration management command
//!
//! Provides CLI interface to view and edit system configuration.

use crate::system_config::{self, SystemConfig};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

const KEYS: &[&str] = &[
    "github.api_base",
    "github.owner",
    "github.repo",
    "github.branch",
    "github.token_env",
    "poll.interval_ms",
    "poll.max_attempts",
];

fn get_value(config: &SystemConfig, key: &str) -> Result<String> {
    let value = match key {
        "github.api_base" => config.github.api_base.clone(),
        "github.owner" => config.github.owner.clone(),
        "github.repo" => config.github.repo.clone(),
        "github.branch" => config.github.branch.clone(),
        "github.token_env" => config.github.token_env.clone(),
        "poll.interval_ms" => config.poll.interval_ms.to_string(),
        "poll.max_attempts" => config.poll.max_attempts.to_string(),
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'treepatch config list' to see available keys.",
            key
        ),
    };
    Ok(value)
}

fn set_value(config: &mut SystemConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "github.api_base" => config.github.api_base = value.to_string(),
        "github.owner" => config.github.owner = value.to_string(),
        "github.repo" => config.github.repo = value.to_string(),
        "github.branch" => config.github.branch = value.to_string(),
        "github.token_env" => config.github.token_env = value.to_string(),
        "poll.interval_ms" => {
            config.poll.interval_ms = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "poll.max_attempts" => {
            config.poll.max_attempts = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'treepatch config list' to see available keys.",
            key
        ),
    }
    Ok(())
}

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let config = system_config::load()?;
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", "System Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    let mut section = "";
    for &key in KEYS {
        let (prefix, name) = key.split_once('.').unwrap_or(("", key));
        if prefix != section {
            if !section.is_empty() {
                println!();
            }
            println!("{}", format!("[{}]", prefix).yellow());
            section = prefix;
        }
        println!("  {} = {}", name.cyan(), get_value(&config, key)?);
    }

    let token_state = if config.token().is_some() {
        "set".green().to_string()
    } else {
        "not set".red().to_string()
    };
    println!("\n{} ${}: {}", "Token".bold(), config.github.token_env, token_state);

    println!("\n{}", "Valid Ranges:".bold());
    println!("  interval_ms: 100-60,000");
    println!("  max_attempts: 1-10,000");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let config = system_config::load()?;
    println!("{}", get_value(&config, key)?);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load()?;
    set_value(&mut config, key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;

    system_config::save(&config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    if create && !config_path.exists() {
        system_config::init_if_missing()?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", system_config::example_config());
    Ok(())
}
