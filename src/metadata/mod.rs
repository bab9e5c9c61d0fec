//! Metadata enrichment pipeline.
//!
//! Given a user-supplied URL, produce the best metadata record we can get:
//! a structured Open-Graph scrape of the page first, a raw tag scan second,
//! and a hostname-derived minimal record as the terminal fallback. Network
//! failures and empty pages are absorbed here; the only error callers ever
//! see is an input URL that fails normalization.

pub mod handlers;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;
use utoipa::ToSchema;

use crate::extractor::structured::StructuredScrape;
use crate::extractor::{self, MetadataCandidate, MetadataSource};
use crate::fetcher::{self, FetchOptions, FetchedPage};
use crate::urls;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("invalid url")]
    InvalidUrl,
}

/// The finalized enrichment record for one URL. Folded into the site row on
/// creation and returned verbatim by the metadata endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteMetadata {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub favicon_url: Option<String>,
    pub image_url: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub source: MetadataSource,
}

impl SiteMetadata {
    fn from_candidate(candidate: MetadataCandidate, fetched_at: DateTime<Utc>) -> Self {
        Self {
            url: candidate.url,
            title: candidate.title,
            description: candidate.description,
            favicon_url: candidate.favicon_url,
            image_url: candidate.image_url,
            fetched_at,
            source: candidate.source,
        }
    }
}

/// Fetch and extract metadata for a URL. Rejects up front when the URL fails
/// normalization; after that every failure degrades to the next strategy and
/// the call cannot fail. At most two sequential network requests are made.
#[instrument(skip(options))]
pub async fn fetch_site_metadata(
    input_url: &str,
    options: &FetchOptions,
) -> Result<SiteMetadata, MetadataError> {
    let normalized = urls::normalize_url(input_url).ok_or(MetadataError::InvalidUrl)?;
    let base = Url::parse(&normalized).map_err(|_| MetadataError::InvalidUrl)?;
    let fetched_at = Utc::now();

    if let Some(candidate) = structured_pass(&normalized, options).await {
        return Ok(SiteMetadata::from_candidate(candidate, fetched_at));
    }

    if let Some(candidate) = raw_pass(&normalized, options).await {
        return Ok(SiteMetadata::from_candidate(candidate, fetched_at));
    }

    Ok(fallback_metadata(&base, fetched_at))
}

async fn structured_pass(url: &str, options: &FetchOptions) -> Option<MetadataCandidate> {
    let page = fetch_page(url, options, "structured").await?;
    let scrape = StructuredScrape::from_document(&page.body);
    extractor::structured::extract(&scrape, &page.url_final)
}

async fn raw_pass(url: &str, options: &FetchOptions) -> Option<MetadataCandidate> {
    let page = fetch_page(url, options, "raw").await?;
    extractor::html::extract(&page.body, &page.url_final)
}

async fn fetch_page(url: &str, options: &FetchOptions, pass: &str) -> Option<FetchedPage> {
    match fetcher::fetch(url, options).await {
        Ok(page) => {
            debug!(
                "{pass} fetch for {url} resolved to {} ({}, charset {:?})",
                page.url_final, page.status, page.charset
            );
            Some(page)
        }
        Err(err) => {
            if err.is_transient() {
                warn!("{pass} fetch for {url} failed: {err}");
            } else {
                info!("{pass} fetch for {url} failed: {err}");
            }
            None
        }
    }
}

/// The always-available minimal record: hostname as title, conventional
/// favicon location, nothing else.
fn fallback_metadata(base: &Url, fetched_at: DateTime<Utc>) -> SiteMetadata {
    let title = base
        .host_str()
        .map(str::to_string)
        .unwrap_or_else(|| base.to_string());
    SiteMetadata {
        url: base.to_string(),
        title: Some(title),
        description: None,
        favicon_url: urls::resolve_absolute(base, "/favicon.ico"),
        image_url: None,
        fetched_at,
        source: MetadataSource::Fallback,
    }
}
