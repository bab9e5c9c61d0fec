//! Normalization rules shared by category and tag names.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Labels longer than this (after whitespace collapsing) are rejected.
pub const MAX_LABEL_LENGTH: usize = 64;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));

/// Collapse internal whitespace runs to single spaces and trim. Returns
/// `None` when nothing is left.
pub fn collapse_whitespace(input: &str) -> Option<String> {
    let compressed = WHITESPACE_RUN.replace_all(input, " ");
    let trimmed = compressed.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalize a single category/tag name. Rejects empty results and names
/// over [`MAX_LABEL_LENGTH`] characters.
pub fn normalize_label(input: &str) -> Option<String> {
    let compressed = collapse_whitespace(input)?;
    if compressed.chars().count() > MAX_LABEL_LENGTH {
        return None;
    }
    Some(compressed)
}

/// Normalize a batch of label names, dropping rejects and deduplicating
/// case-insensitively. The casing of the first occurrence wins and input
/// order is preserved.
pub fn unique_normalized_labels(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut labels = Vec::new();
    for value in values {
        let Some(normalized) = normalize_label(value) else {
            continue;
        };
        if seen.insert(normalized.to_lowercase()) {
            labels.push(normalized);
        }
    }
    labels
}
