use crate::cli::{load_config, ConfigCommands};
use crate::config::TicketGlassConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Config commands see the same effective config as every other command:
/// the file (or defaults) with command-line overrides applied.
pub fn run(cmd: ConfigCommands, config_path: &Path, data_dir: Option<&Path>) -> Result<()> {
    let config = load_config(config_path, data_dir)?;
    match cmd {
        ConfigCommands::Validate => {
            check(&config).with_context(|| format!("{} is not usable", config_path.display()))?;
            println!("✅ {} is valid.", config_path.display());
        }
        ConfigCommands::Show => print!("{}", render(&config)?),
    }
    Ok(())
}

fn check(config: &TicketGlassConfig) -> Result<()> {
    let problems = config.validate();
    if problems.is_empty() {
        return Ok(());
    }
    anyhow::bail!("{} problem(s):\n  - {}", problems.len(), problems.join("\n  - "))
}

fn render(config: &TicketGlassConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}
