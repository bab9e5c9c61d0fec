//! End-to-end tests for the metadata enrichment pipeline against a local
//! mock server: structured extraction first, raw tag scan second, hostname
//! fallback last.

use std::time::Duration;

use waypost::extractor::MetadataSource;
use waypost::fetcher::FetchOptions;
use waypost::metadata::{MetadataError, fetch_site_metadata};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn html_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(body.as_bytes())
        .insert_header("Content-Type", "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_structured_extraction_wins_on_og_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(html_response(
            r#"<html><head>
                <title>Doc Title</title>
                <meta property="og:title" content="A Great Article">
                <meta property="og:description" content="All about things">
                <meta property="og:image" content="/img/cover.png">
                <link rel="icon" href="/favicon.svg">
            </head><body></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let url = format!("{}/article", mock_server.uri());
    let metadata = fetch_site_metadata(&url, &FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(metadata.source, MetadataSource::Og);
    assert_eq!(metadata.title.as_deref(), Some("A Great Article"));
    assert_eq!(metadata.description.as_deref(), Some("All about things"));
    assert_eq!(
        metadata.favicon_url.as_deref(),
        Some(format!("{}/favicon.svg", mock_server.uri()).as_str())
    );
    assert_eq!(
        metadata.image_url.as_deref(),
        Some(format!("{}/img/cover.png", mock_server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_raw_scan_when_first_fetch_fails() {
    let mock_server = MockServer::start().await;

    // The first request errors out; the retry pass gets usable HTML.
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html_response(
            "<html><head><title>Recovered Page</title></head><body></body></html>",
        ))
        .mount(&mock_server)
        .await;

    let url = format!("{}/flaky", mock_server.uri());
    let metadata = fetch_site_metadata(&url, &FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(metadata.source, MetadataSource::Html);
    assert_eq!(metadata.title.as_deref(), Some("Recovered Page"));
}

#[tokio::test]
async fn test_unreachable_page_degrades_to_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/gone", mock_server.uri());
    let metadata = fetch_site_metadata(&url, &FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(metadata.source, MetadataSource::Fallback);
    assert_eq!(metadata.title.as_deref(), Some("127.0.0.1"));
    assert_eq!(
        metadata.favicon_url.as_deref(),
        Some(format!("{}/favicon.ico", mock_server.uri()).as_str())
    );
    assert_eq!(metadata.description, None);
    assert_eq!(metadata.image_url, None);
}

#[tokio::test]
async fn test_empty_page_degrades_to_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(html_response("<html><body><p>no metadata here</p></body></html>"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/empty", mock_server.uri());
    let metadata = fetch_site_metadata(&url, &FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(metadata.source, MetadataSource::Fallback);
    assert_eq!(metadata.title.as_deref(), Some("127.0.0.1"));
}

#[tokio::test]
async fn test_timeouts_degrade_to_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            html_response("<html><head><title>Too Slow</title></head></html>")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let options = FetchOptions {
        timeout: Duration::from_millis(50),
        ..FetchOptions::default()
    };
    let url = format!("{}/slow", mock_server.uri());
    let metadata = fetch_site_metadata(&url, &options).await.unwrap();

    assert_eq!(metadata.source, MetadataSource::Fallback);
    assert_eq!(metadata.title.as_deref(), Some("127.0.0.1"));
}

#[tokio::test]
async fn test_redirect_changes_resolution_base() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/home"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new/home"))
        .respond_with(html_response(
            r#"<html><head>
                <meta property="og:title" content="Moved Page">
                <meta property="og:image" content="cover.png">
            </head></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let url = format!("{}/moved", mock_server.uri());
    let metadata = fetch_site_metadata(&url, &FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(metadata.source, MetadataSource::Og);
    // Relative links resolve against the post-redirect URL
    assert_eq!(
        metadata.image_url.as_deref(),
        Some(format!("{}/new/cover.png", mock_server.uri()).as_str())
    );
    assert_eq!(
        metadata.url,
        format!("{}/new/home", mock_server.uri())
    );
}

#[tokio::test]
async fn test_invalid_url_rejected_up_front() {
    let result = fetch_site_metadata("   ", &FetchOptions::default()).await;
    assert_eq!(result.unwrap_err(), MetadataError::InvalidUrl);
}
