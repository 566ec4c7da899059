//! Shared CLI helpers — path expansion, hub construction, progress printing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;

use salesreel_core::config::FileConfigSource;
use salesreel_core::ProgressSink;
use salesreel_providers::{DispatchHub, ReqwestTransport};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if s == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    path.to_path_buf()
}

/// Config source for the `--config` flag (or the default location).
pub fn config_source(config_path: Option<&Path>) -> FileConfigSource {
    FileConfigSource::new(config_path.map(expand_tilde))
}

/// Hub reading `config_path` on every dispatch, narrating to stderr.
pub fn build_hub(config_path: Option<&Path>) -> DispatchHub {
    DispatchHub::with_transport(
        Arc::new(config_source(config_path)),
        Arc::new(ReqwestTransport::new()),
        stderr_progress(),
    )
}

/// Progress sink printing dimmed lines to stderr.
pub fn stderr_progress() -> ProgressSink {
    ProgressSink::new(|message| eprintln!("  {} {}", "·".dimmed(), message.dimmed()))
}

/// Print a section heading.
pub fn print_heading(title: &str) {
    println!();
    println!("{}", format!("🎬 {title}").cyan().bold());
    println!();
}

/// Human-readable byte count.
pub fn format_bytes(n: usize) -> String {
    const KIB: f64 = 1024.0;
    let n = n as f64;
    if n < KIB {
        format!("{n} B")
    } else if n < KIB * KIB {
        format!("{:.1} KiB", n / KIB)
    } else {
        format!("{:.1} MiB", n / (KIB * KIB))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
