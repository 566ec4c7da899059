//! `salesreel status` — show configuration, credential pools and gate limits.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use salesreel_core::config::ConfigSource;
use salesreel_core::credentials::merge_credentials;
use salesreel_providers::registry::PROVIDERS;

use crate::helpers::{config_source, print_heading};

/// Run the status command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let source = config_source(config_path);
    let path = source.path();
    let config = source.load();

    print_heading("SalesReel Status");

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        path.display(),
        if path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );
    println!(
        "  {:<18} {} (fallback: {})",
        "Image provider:".bold(),
        format!("{:?}", config.image.provider).to_lowercase(),
        match config.image.provider {
            salesreel_core::config::ImageProviderChoice::Gemini => "whisk",
            salesreel_core::config::ImageProviderChoice::Whisk => "gemini",
        }
    );
    println!(
        "  {:<18} {}",
        "Timeouts:".bold(),
        format!(
            "dispatch {}s | image {}s | text {}s",
            config.dispatch.timeout_secs, config.image.timeout_secs, config.text.timeout_secs
        )
        .dimmed()
    );

    println!();
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        let count = merge_credentials(spec.name, &config.credentials).len();
        let creds = if count > 0 {
            format!("{} {} credential(s)", "✓".green(), count)
        } else {
            format!("{}", "· no credentials (anonymous)".dimmed())
        };
        let base = config
            .dispatch
            .api_bases
            .get(spec.name)
            .map(String::as_str)
            .unwrap_or(spec.default_api_base);
        println!(
            "    {:<20} {:<14} {:<28} {}",
            spec.display_name,
            spec.capability_label(),
            creds,
            format!("max {} in flight | {}", config.dispatch.limit_for(spec.name), base).dimmed()
        );
    }

    println!();

    Ok(())
}
