//! Structured metadata extraction from a parsed HTML document.
//!
//! The page is first scraped into a [`StructuredScrape`]: per-field lists of
//! Open-Graph / Twitter-card values in document order. Selection then walks
//! the fields in priority order, which keeps the scrape and the picking
//! rules independently testable.

use scraper::{Html, Selector};
use url::Url;

use crate::extractor::model::{MetadataCandidate, MetadataSource, clean_text};
use crate::urls;

/// One scraped value. Icon and image fields carry URL-shaped values, the
/// rest are plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeValue {
    Text(String),
    Link { url: String },
}

impl ScrapeValue {
    fn as_str(&self) -> &str {
        match self {
            ScrapeValue::Text(text) => text,
            ScrapeValue::Link { url } => url,
        }
    }
}

/// Open-Graph-style fields scraped from a document, each a list of raw
/// values in document order.
#[derive(Debug, Default)]
pub struct StructuredScrape {
    pub og_title: Vec<ScrapeValue>,
    pub twitter_title: Vec<ScrapeValue>,
    pub title: Vec<ScrapeValue>,
    pub og_site_name: Vec<ScrapeValue>,
    pub og_description: Vec<ScrapeValue>,
    pub twitter_description: Vec<ScrapeValue>,
    pub dc_description: Vec<ScrapeValue>,
    pub description: Vec<ScrapeValue>,
    pub favicon: Vec<ScrapeValue>,
    pub og_image: Vec<ScrapeValue>,
    pub twitter_image: Vec<ScrapeValue>,
}

impl StructuredScrape {
    pub fn from_document(html: &str) -> Self {
        let document = Html::parse_document(html);

        let mut scrape = StructuredScrape {
            og_title: meta_values(&document, "og:title"),
            twitter_title: meta_values(&document, "twitter:title"),
            title: Vec::new(),
            og_site_name: meta_values(&document, "og:site_name"),
            og_description: meta_values(&document, "og:description"),
            twitter_description: meta_values(&document, "twitter:description"),
            dc_description: meta_values(&document, "dc.description"),
            description: meta_values(&document, "description"),
            favicon: icon_links(&document),
            og_image: link_values(&document, "og:image"),
            twitter_image: link_values(&document, "twitter:image"),
        };

        if let Ok(selector) = Selector::parse("title") {
            for element in document.select(&selector) {
                scrape
                    .title
                    .push(ScrapeValue::Text(element.text().collect::<String>()));
            }
        }

        scrape
    }
}

/// Select a final candidate from a scrape, resolving icon/image links
/// against `base` (the effective post-redirect URL). Yields `None` when
/// every field comes up empty.
pub fn extract(scrape: &StructuredScrape, base: &Url) -> Option<MetadataCandidate> {
    let title = pick_first_text(&[
        &scrape.og_title,
        &scrape.twitter_title,
        &scrape.title,
        &scrape.og_site_name,
    ]);
    let description = pick_first_text(&[
        &scrape.og_description,
        &scrape.twitter_description,
        &scrape.dc_description,
        &scrape.description,
    ]);
    let favicon_url = pick_first_link(&[&scrape.favicon], base);
    let image_url = pick_first_link(&[&scrape.og_image, &scrape.twitter_image], base);

    let candidate = MetadataCandidate {
        url: base.to_string(),
        title,
        description,
        favicon_url,
        image_url,
        source: MetadataSource::Og,
    };
    if candidate.is_empty() {
        None
    } else {
        Some(candidate)
    }
}

/// First value across the groups that survives text cleaning. `Link` values
/// contribute their URL string, mirroring scrape results that wrap plain
/// strings in `{url}` objects.
fn pick_first_text(groups: &[&Vec<ScrapeValue>]) -> Option<String> {
    for group in groups {
        for value in group.iter() {
            if let Some(cleaned) = clean_text(value.as_str()) {
                return Some(cleaned);
            }
        }
    }
    None
}

/// First value across the groups that resolves to an absolute http(s) URL.
fn pick_first_link(groups: &[&Vec<ScrapeValue>], base: &Url) -> Option<String> {
    for group in groups {
        for value in group.iter() {
            if let Some(absolute) = urls::resolve_absolute(base, value.as_str()) {
                return Some(absolute);
            }
        }
    }
    None
}

fn meta_values(document: &Html, key: &str) -> Vec<ScrapeValue> {
    meta_contents(document, key)
        .into_iter()
        .map(ScrapeValue::Text)
        .collect()
}

fn link_values(document: &Html, key: &str) -> Vec<ScrapeValue> {
    meta_contents(document, key)
        .into_iter()
        .map(|url| ScrapeValue::Link { url })
        .collect()
}

/// Content attributes of every `<meta>` whose name or property matches.
fn meta_contents(document: &Html, key: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(&format!("meta[property='{key}'], meta[name='{key}']"))
    else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(str::to_string)
        .collect()
}

/// Every `<link>` whose rel contains "icon": plain icons, shortcut icons,
/// apple-touch icons.
fn icon_links(document: &Html) -> Vec<ScrapeValue> {
    let Ok(selector) = Selector::parse("link[rel*='icon']") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| ScrapeValue::Link {
            url: href.to_string(),
        })
        .collect()
}
