//! Helpers for text normalization, logging, and output-path validation.

use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::info;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Number of whitespace-separated words in a string.
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Cap a string at `max` characters without splitting a codepoint.
///
/// Used to bound prompt payloads the way the scorer and comparator expect.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes with an ellipsis and the dropped byte
/// count appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let cut = (0..=max).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0);
        format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// A model response cut off at the token limit fails to parse with an EOF
/// error; those calls are worth one re-ask.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Ensure the parent directory of an output file exists and is writable.
///
/// Creates missing directories, then probes with a throwaway file so
/// permission problems surface before the run spends money on model calls.
pub async fn ensure_parent_dir(path: &str) -> Result<()> {
    let parent = Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| Path::new(".").to_path_buf());

    fs::create_dir_all(&parent).await?;

    let probe_path = parent.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!(path, "Output location is writable");
    Ok(())
}
