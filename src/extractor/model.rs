use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Which extraction strategy produced a metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    /// Structured Open-Graph / Twitter-card scrape of the parsed document.
    Og,
    /// Raw tag scan over the HTML text.
    Html,
    /// Hostname-derived minimal record; always available.
    Fallback,
}

/// A partially-populated metadata result produced by one extraction
/// strategy. Not yet finalized: the orchestrator stamps the fetch timestamp
/// when folding a candidate into the final record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataCandidate {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub favicon_url: Option<String>,
    pub image_url: Option<String>,
    pub source: MetadataSource,
}

impl MetadataCandidate {
    /// A candidate with no extracted field at all is worthless; callers fall
    /// through to the next strategy instead.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.favicon_url.is_none()
            && self.image_url.is_none()
    }
}

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&(amp|quot|#39|lt|gt|nbsp);").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Sanitize text pulled out of markup: decode the handful of entities that
/// actually show up in titles and descriptions, collapse whitespace runs and
/// trim. Empty-after-cleaning counts as absent.
pub fn clean_text(input: &str) -> Option<String> {
    let decoded = ENTITY_RE.replace_all(input, |caps: &Captures| {
        match caps[1].to_ascii_lowercase().as_str() {
            "amp" => "&",
            "quot" => "\"",
            "#39" => "'",
            "lt" => "<",
            "gt" => ">",
            "nbsp" => " ",
            _ => "",
        }
        .to_string()
    });
    let collapsed = WHITESPACE_RE.replace_all(&decoded, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
