//! Utility helpers — path resolution, timestamps, string trimming.

use std::path::PathBuf;

/// Get the SalesReel data directory (e.g. `~/.salesreel/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".salesreel")
}

/// Default directory for generated artifacts (e.g. `~/.salesreel/output/`).
pub fn get_output_path() -> PathBuf {
    get_data_path().join("output")
}

/// Get current ISO 8601 timestamp.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Sanitize a string for use as a filename.
pub fn safe_filename(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        let result = truncate_string("upstream returned a very long error body", 15);
        assert_eq!(result, "upstream ret...");
        assert!(result.chars().count() <= 15);
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate_string("こんにちは世界です", 5), "こん...");
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("scene 1/final"), "scene_1_final");
        assert_eq!(safe_filename("scene-01.png"), "scene-01.png");
    }

    #[test]
    fn test_timestamp_is_valid() {
        let ts = timestamp();
        chrono::DateTime::parse_from_rfc3339(&ts).unwrap();
    }

    #[test]
    fn test_data_paths() {
        assert!(get_data_path().ends_with(".salesreel"));
        let out = get_output_path();
        assert!(out.ends_with("output"));
        assert!(out.parent().unwrap().ends_with(".salesreel"));
    }
}
