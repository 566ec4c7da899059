//! `salesreel images` — render a scene batch through the fallback orchestrator.
//!
//! Ctrl-C cancels between scenes; scenes already rendered are kept.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use salesreel_core::utils::{get_output_path, safe_filename, timestamp};
use salesreel_providers::{ImageRequest, ReferenceImage, ReferenceRole, Scene};

use crate::helpers::{build_hub, expand_tilde, format_bytes, print_heading};

pub struct ImagesArgs<'a> {
    pub config_path: Option<&'a Path>,
    pub prompts: PathBuf,
    pub out: Option<PathBuf>,
    pub model_image: Option<PathBuf>,
    pub product_image: Option<PathBuf>,
}

/// Run the images command.
pub async fn run(args: ImagesArgs<'_>) -> Result<()> {
    let prompts_path = expand_tilde(&args.prompts);
    let content = tokio::fs::read_to_string(&prompts_path)
        .await
        .with_context(|| format!("failed to read prompts: {}", prompts_path.display()))?;
    let prompts = parse_prompts(&content);
    if prompts.is_empty() {
        bail!("no prompts in {}", prompts_path.display());
    }

    let mut references = Vec::new();
    if let Some(path) = &args.model_image {
        references.push(ReferenceImage::from_path(ReferenceRole::Subject, expand_tilde(path)).await?);
    }
    if let Some(path) = &args.product_image {
        references.push(ReferenceImage::from_path(ReferenceRole::Scene, expand_tilde(path)).await?);
    }

    let out_dir = match &args.out {
        Some(dir) => expand_tilde(dir),
        None => get_output_path().join(safe_filename(&timestamp())),
    };
    tokio::fs::create_dir_all(&out_dir)
        .await
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let scenes: Vec<Scene> = prompts
        .into_iter()
        .enumerate()
        .map(|(i, prompt)| Scene {
            index: i + 1,
            request: ImageRequest {
                prompt,
                references: references.clone(),
            },
        })
        .collect();

    let hub = build_hub(args.config_path);
    let batch = hub.scene_batch();

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "  cancelling after the current scene…".yellow());
            on_ctrl_c.cancel();
        }
    });

    print_heading(&format!("Rendering {} scene(s)", scenes.len()));
    let report = batch.run(scenes, cancel).await;

    println!();
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(output) => {
                let path = out_dir.join(format!("scene_{:02}.png", outcome.index));
                tokio::fs::write(&path, &output.bytes)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!(
                    "  {} scene {:>2} → {} ({}, {})",
                    "✓".green(),
                    outcome.index,
                    path.display(),
                    output.provider,
                    format_bytes(output.bytes.len())
                );
            }
            Err(e) => {
                warn!(scene = outcome.index, error = %e, "scene not rendered");
                println!("  {} scene {:>2}: {}", "✗".red(), outcome.index, e);
            }
        }
    }
    println!();
    println!(
        "  {} rendered, {} failed{}",
        report.succeeded(),
        report.failed(),
        if report.cancelled { ", cancelled" } else { "" }
    );
    println!();

    if report.succeeded() == 0 {
        bail!("no scene was rendered");
    }
    Ok(())
}

/// One prompt per non-empty line; `#` starts a comment line.
fn parse_prompts(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect()
}
