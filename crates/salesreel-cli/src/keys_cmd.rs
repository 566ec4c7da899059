//! `salesreel keys` — preview credential rotation.
//!
//! Shows, per provider, which credential the next N dispatches would try
//! first. Credentials are printed redacted.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};
use colored::Colorize;

use salesreel_core::credentials::{merge_credentials, KNOWN_PROVIDERS};
use salesreel_core::{ConfigSource, CredentialRegistry};

use crate::helpers::{config_source, print_heading};

/// Run the keys command.
pub fn run(config_path: Option<&Path>, provider: Option<&str>, count: usize) -> Result<()> {
    let providers: Vec<&str> = match provider {
        Some(p) if KNOWN_PROVIDERS.contains(&p) => vec![p],
        Some(p) => bail!(
            "unknown provider '{p}' (expected one of: {})",
            KNOWN_PROVIDERS.join(", ")
        ),
        None => KNOWN_PROVIDERS.to_vec(),
    };

    let source = Arc::new(config_source(config_path));
    let config = source.load();
    let registry = CredentialRegistry::new(source);
    registry.refresh();

    print_heading("Credential rotation");
    for name in providers {
        println!("  {}", name.bold());
        let base = merge_credentials(name, &config.credentials);
        if base.is_empty() {
            println!("    {}", "(no credentials, dispatches go out anonymously)".dimmed());
            continue;
        }
        for (i, line) in preview(&registry, name, base.as_slice(), count).iter().enumerate() {
            println!("    {:>2}. {}", i + 1, line);
        }
    }
    println!();

    Ok(())
}

/// One line per upcoming dispatch: the rotated view, redacted.
fn preview(
    registry: &CredentialRegistry,
    provider: &str,
    base: &[salesreel_core::Credential],
    count: usize,
) -> Vec<String> {
    (0..count)
        .map(|_| {
            registry
                .rotated_list(provider, base)
                .iter()
                .map(|c| c.redacted())
                .collect::<Vec<_>>()
                .join(" → ")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesreel_core::config::{Config, SharedConfig};
    use salesreel_core::Credential;

    #[test]
    fn preview_walks_the_rotation() {
        let mut config = Config::default();
        config.credentials.labs_tokens = vec!["aaaa-1".into(), "bbbb-2".into()];
        let registry = CredentialRegistry::new(Arc::new(SharedConfig::new(config)));
        registry.refresh();

        let base = vec![Credential::new("aaaa-1"), Credential::new("bbbb-2")];
        let lines = preview(&registry, "labs", &base, 3);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("aaaa"));
        assert!(lines[1].starts_with("bbbb"));
        assert!(lines[2].starts_with("aaaa"));
        assert!(!lines[0].contains("aaaa-1"));
    }
}
