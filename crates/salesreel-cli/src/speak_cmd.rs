//! `salesreel speak` — ElevenLabs text-to-speech into a file.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::helpers::{build_hub, expand_tilde, format_bytes};

/// Run the speak command.
pub async fn run(config_path: Option<&Path>, voice: &str, text: &str, out: &Path) -> Result<()> {
    let audio = build_hub(config_path)
        .speech()
        .synthesize(voice, text)
        .await
        .context("speech synthesis failed")?;

    let out = expand_tilde(out);
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(&out, &audio)
        .await
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!(
        "  {} {} ({})",
        "✓".green(),
        out.display(),
        format_bytes(audio.len())
    );
    Ok(())
}
