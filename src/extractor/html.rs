//! Raw-HTML metadata extraction.
//!
//! A regex tag scan used when the structured scrape yields nothing. Only
//! `<title>`, `<meta>` content attributes and `<link rel*=icon>` need to be
//! found, so no DOM tree is built.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::extractor::model::{MetadataCandidate, MetadataSource, clean_text};
use crate::urls;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

static ICON_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<link[^>]+rel=["'][^"']*icon[^"']*["'][^>]*>"#).unwrap());

static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)href=["']([^"']+)["']"#).unwrap());

/// Scan raw HTML for a metadata candidate, resolving favicon/image links
/// against `base`. Yields `None` when every field comes up empty.
pub fn extract(html: &str, base: &Url) -> Option<MetadataCandidate> {
    let title = TITLE_RE
        .captures(html)
        .and_then(|caps| clean_text(&caps[1]));
    let description = meta_content(
        html,
        &["description", "og:description", "twitter:description"],
    );
    let favicon_url = icon_link(html, base);
    let image_url = meta_content(html, &["og:image", "twitter:image", "image"])
        .and_then(|value| urls::resolve_absolute(base, &value));

    let candidate = MetadataCandidate {
        url: base.to_string(),
        title,
        description,
        favicon_url,
        image_url,
        source: MetadataSource::Html,
    };
    if candidate.is_empty() {
        None
    } else {
        Some(candidate)
    }
}

/// First non-empty content attribute of a `<meta>` whose name or property
/// matches one of `keys`, checked in priority order.
fn meta_content(html: &str, keys: &[&str]) -> Option<String> {
    for key in keys {
        let pattern = format!(
            r#"(?i)<meta[^>]+(?:name|property)=["']{}["'][^>]*content=["']([^"']+)["']"#,
            regex::escape(key)
        );
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        if let Some(caps) = re.captures(html)
            && let Some(cleaned) = clean_text(&caps[1])
        {
            return Some(cleaned);
        }
    }
    None
}

/// First icon `<link>` whose href resolves to an absolute http(s) URL.
fn icon_link(html: &str, base: &Url) -> Option<String> {
    for link in ICON_LINK_RE.find_iter(html) {
        if let Some(href) = HREF_RE.captures(link.as_str())
            && let Some(absolute) = urls::resolve_absolute(base, &href[1])
        {
            return Some(absolute);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn extracts_title_with_entities_and_whitespace() {
        let html = "<html><head><title>\n  Fish &amp; Chips \n</title></head></html>";
        let candidate = extract(html, &base()).unwrap();
        assert_eq!(candidate.title.as_deref(), Some("Fish & Chips"));
        assert_eq!(candidate.source, MetadataSource::Html);
        assert_eq!(candidate.url, "https://example.com/page");
    }

    #[test]
    fn meta_description_priority_order() {
        let html = r#"<html><head>
            <meta property="og:description" content="og desc">
            <meta name="description" content="plain desc">
        </head></html>"#;
        let candidate = extract(html, &base()).unwrap();
        // "description" is checked before "og:description"
        assert_eq!(candidate.description.as_deref(), Some("plain desc"));
    }

    #[test]
    fn finds_icon_link_variants() {
        for rel in ["icon", "shortcut icon", "apple-touch-icon"] {
            let html = format!(r#"<html><head><link rel="{rel}" href="/fav.png"></head></html>"#);
            let candidate = extract(&html, &base()).unwrap();
            assert_eq!(
                candidate.favicon_url.as_deref(),
                Some("https://example.com/fav.png"),
                "rel={rel}"
            );
        }
    }

    #[test]
    fn image_resolved_against_base() {
        let html = r#"<html><head><meta property="og:image" content="img/cover.jpg"></head></html>"#;
        let candidate = extract(html, &base()).unwrap();
        assert_eq!(
            candidate.image_url.as_deref(),
            Some("https://example.com/img/cover.jpg")
        );
    }

    #[test]
    fn twitter_image_when_og_image_missing() {
        let html =
            r#"<html><head><meta name="twitter:image" content="/t.png"></head></html>"#;
        let candidate = extract(html, &base()).unwrap();
        assert_eq!(
            candidate.image_url.as_deref(),
            Some("https://example.com/t.png")
        );
    }

    #[test]
    fn empty_page_yields_no_candidate() {
        assert!(extract("<html><body><p>nothing here</p></body></html>", &base()).is_none());
        assert!(extract("", &base()).is_none());
    }

    #[test]
    fn blank_title_counts_as_absent() {
        assert!(extract("<html><head><title>   </title></head></html>", &base()).is_none());
    }
}
