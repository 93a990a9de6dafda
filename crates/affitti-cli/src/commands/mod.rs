//! Subcommands and the helpers they share.

pub mod analyze;
pub mod batch;
pub mod config;
pub mod extract;
pub mod schedule;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use console::style;
use tracing::debug;

use affitti_core::models::config::{AffittiConfig, StrategyKind};

/// Extraction strategy selectable on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum StrategyArg {
    /// Template regex rules
    Pattern,
    /// Remote language-model service
    Delegate,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Pattern => StrategyKind::Pattern,
            StrategyArg::Delegate => StrategyKind::Delegate,
        }
    }
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("affitti")
        .join("config.json")
}

/// Load the configuration from `path`, else from the default location when
/// it exists, else use defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<AffittiConfig> {
    if let Some(path) = path {
        return Ok(AffittiConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading configuration from {}", default_path.display());
        Ok(AffittiConfig::from_file(&default_path)?)
    } else {
        Ok(AffittiConfig::default())
    }
}

/// Read contract text from a file, or from stdin when the path is `-`.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }

    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    Ok(fs::read_to_string(path)?)
}

/// Write to a file with a confirmation line, or print to stdout.
pub fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            println!(
                "{} Output written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", content),
    }
    Ok(())
}
