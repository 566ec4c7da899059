//! `salesreel onboard` — initialize configuration and the output directory.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use salesreel_core::config::{load_config, save_config};
use salesreel_core::utils::get_output_path;

use crate::helpers::{config_source, print_heading};

/// Run the onboard command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    print_heading("SalesReel — Setup");

    let config_path = config_source(config_path).path();
    let created = write_default_config(&config_path)?;
    if created {
        println!("  {} created config at {}", "✓".green(), config_path.display());
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    }

    let output = get_output_path();
    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create output dir: {}", output.display()))?;
    println!("  {} output at {}", "✓".green(), output.display());

    println!();
    println!(
        "{}",
        "  Setup complete! Add API keys to the config, then run `salesreel status`.".green()
    );
    println!();

    Ok(())
}

/// Write a default config unless one exists. Returns `true` if written.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let config = load_config(Some(path)); // defaults + env
    save_config(&config, Some(path))
        .with_context(|| format!("failed to write config: {}", path.display()))?;
    Ok(true)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
