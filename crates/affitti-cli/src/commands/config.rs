//! Config command - manage configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use affitti_core::models::config::{AffittiConfig, StrategyKind};

use super::default_config_path;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "schedule.discount_percentage")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show => show_config(&path),
        ConfigCommand::Init(init_args) => init_config(init_args, &path),
        ConfigCommand::Get { key } => get_config(&path, &key),
        ConfigCommand::Set { key, value } => set_config(&path, &key, &value),
        ConfigCommand::Path => show_path(&path),
    }
}

fn show_config(config_path: &Path) -> anyhow::Result<()> {
    if !config_path.exists() {
        println!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
    }
    let config = read_config(config_path)?;

    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs, config_path: &Path) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| config_path.to_path_buf());

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    // Create parent directory if needed
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config = AffittiConfig::default();
    config.save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn read_config(config_path: &Path) -> anyhow::Result<AffittiConfig> {
    if config_path.exists() {
        Ok(AffittiConfig::from_file(config_path)?)
    } else {
        Ok(AffittiConfig::default())
    }
}

fn get_config(config_path: &Path, key: &str) -> anyhow::Result<()> {
    let json = serde_json::to_value(read_config(config_path)?)?;

    let mut current = &json;
    for part in key.split('.') {
        current = current
            .get(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
    }

    println!("{}", serde_json::to_string_pretty(current)?);

    Ok(())
}

fn set_config(config_path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let config = read_config(config_path)?;

    // Bare words such as `delegate` are taken as strings.
    let parsed_value: serde_json::Value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

    let mut json = serde_json::to_value(&config)?;

    // Only existing keys can be set; unknown keys would be dropped on load.
    let mut current = &mut json;
    for part in key.split('.') {
        current = current
            .get_mut(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
    }
    if current.is_object() {
        anyhow::bail!("Cannot replace configuration section: {}", key);
    }
    *current = parsed_value.clone();

    let config: AffittiConfig = serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(config_path)?;

    println!(
        "{} Set {} = {}",
        style("✓").green(),
        key,
        serde_json::to_string(&parsed_value)?
    );

    if config.extraction.strategy == StrategyKind::Delegate
        && std::env::var_os(&config.delegate.api_key_env).is_none()
    {
        println!(
            "{} Delegate extraction needs the {} environment variable.",
            style("⚠").yellow(),
            config.delegate.api_key_env
        );
    }

    Ok(())
}

fn show_path(config_path: &Path) -> anyhow::Result<()> {
    println!("Configuration file: {}", config_path.display());

    if config_path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'affitti config init' to create a configuration file.");
    }

    Ok(())
}
