//! `salesreel text` — one Gemini text-generation dispatch.

use std::path::Path;

use anyhow::{Context, Result};

use crate::helpers::build_hub;

/// Run the text command.
pub async fn run(config_path: Option<&Path>, system: &str, user: &str, json: bool) -> Result<()> {
    let text = build_hub(config_path).text();

    if json {
        let value = text
            .generate_json(system, user)
            .await
            .context("text generation failed")?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        let reply = text
            .generate(system, user)
            .await
            .context("text generation failed")?;
        println!("{reply}");
    }

    Ok(())
}
