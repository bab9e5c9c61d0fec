use crate::config::Config;
use crate::fetcher::{errors::FetchError, pipeline::decode_page, types::FetchedPage};
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::instrument;

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const MAX_REDIRECTS: usize = 5;

/// Per-request settings derived from [`Config`]. The underlying client is
/// process-wide; timeout and User-Agent vary per deployment.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub user_agent: String,
}

impl FetchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_millis(config.metadata_timeout_ms()),
            user_agent: config.metadata_user_agent().to_string(),
        }
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .default_headers({
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                    .parse()
                    .expect("Failed to build Accept header"),
            );
            headers
        })
        .build()
        .expect("Failed to build HTTP client")
});

/// Fetch a single HTML page, following up to [`MAX_REDIRECTS`] redirects and
/// decoding the body to UTF-8. Rejects non-success statuses, non-HTML
/// content types and bodies over [`MAX_BODY_SIZE`].
#[instrument(skip(options), fields(url = %url))]
pub async fn fetch(url: &str, options: &FetchOptions) -> Result<FetchedPage, FetchError> {
    let parsed_url = url::Url::parse(url)?;

    let response = HTTP_CLIENT
        .get(parsed_url)
        .timeout(options.timeout)
        .header(reqwest::header::USER_AGENT, options.user_agent.as_str())
        .send()
        .await
        .map_err(FetchError::from_reqwest)?;

    // Check content length before downloading
    if let Some(content_length) = response.content_length()
        && content_length > MAX_BODY_SIZE
    {
        return Err(FetchError::BodyTooLarge(content_length));
    }

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    // Metadata only lives in HTML documents
    if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
        return Err(FetchError::UnsupportedContentType(content_type));
    }

    let url_final = response.url().clone();

    let body_bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    // Re-check after download in case Content-Length was missing
    if body_bytes.len() as u64 > MAX_BODY_SIZE {
        return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
    }

    decode_page(url_final, status, &content_type, body_bytes)
}
