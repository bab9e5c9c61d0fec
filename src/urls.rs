//! URL normalization for user-supplied input.
//!
//! Submitted URLs frequently arrive without a scheme ("example.com") or with
//! stray whitespace. Normalization tries the input as-is, then with an
//! https:// prefix, then http://, and accepts the first parse that yields an
//! http(s) URL. The canonical `Url` string form is returned, so normalizing
//! an already-normalized URL is a no-op.

use url::Url;

/// Canonicalize a user-supplied URL string. Returns `None` when no valid
/// http(s) URL can be constructed from the input.
pub fn normalize_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    attempt(trimmed)
        .or_else(|| attempt(&format!("https://{trimmed}")))
        .or_else(|| attempt(&format!("http://{trimmed}")))
}

fn attempt(value: &str) -> Option<String> {
    let url = Url::parse(value).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url.to_string()),
        _ => None,
    }
}

/// Resolve a possibly-relative reference against a base URL. Used for
/// favicon and preview-image links found in scraped pages. The same http(s)
/// scheme restriction applies, so javascript: and data: links are dropped.
pub fn resolve_absolute(base: &Url, target: &str) -> Option<String> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return None;
    }

    let absolute = base.join(trimmed).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}
