//! Charset sniffing and UTF-8 decoding of fetched page bodies.

use crate::fetcher::{
    errors::FetchError,
    types::{Charset, FetchedPage},
};
use bytes::Bytes;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::StatusCode;
use std::sync::LazyLock;
use url::Url;

/// Only the head of the document is scanned for charset declarations.
const SNIFF_WINDOW: usize = 4096;

static HEADER_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

pub(crate) fn decode_page(
    url_final: Url,
    status: StatusCode,
    content_type: &str,
    body_bytes: Bytes,
) -> Result<FetchedPage, FetchError> {
    let encoding = sniff_encoding(content_type, &body_bytes);

    // `decode` also honors a BOM, which overrides the sniffed label.
    let (body, actual_encoding, had_errors) = encoding.decode(&body_bytes);
    if had_errors {
        return Err(FetchError::Decode(format!(
            "undecodable byte sequence for {}",
            actual_encoding.name()
        )));
    }

    Ok(FetchedPage {
        url_final,
        status,
        body: body.into_owned(),
        charset: Charset::from_encoding(actual_encoding),
    })
}

/// Pick the most plausible encoding: Content-Type header first, then
/// `<meta charset>` / http-equiv declarations in the document head, then
/// chardetng's statistical guess.
fn sniff_encoding(content_type: &str, body_bytes: &[u8]) -> &'static Encoding {
    if let Some(encoding) = labelled_encoding(&HEADER_CHARSET_RE, content_type) {
        return encoding;
    }

    let head = &body_bytes[..body_bytes.len().min(SNIFF_WINDOW)];
    let head_str = String::from_utf8_lossy(head);
    for re in [&*META_CHARSET_RE, &*META_HTTP_EQUIV_RE] {
        if let Some(encoding) = labelled_encoding(re, &head_str) {
            return encoding;
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(head, false);
    detector.guess(None, true)
}

fn labelled_encoding(re: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let captures = re.captures(haystack)?;
    let label = captures.get(1)?.as_str();
    Encoding::for_label(label.trim().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_from_content_type_header() {
        let body = b"<html><head><title>Test</title></head></html>";
        let encoding = sniff_encoding("text/html; charset=utf-8", body);
        assert_eq!(encoding, encoding_rs::UTF_8);
    }

    #[test]
    fn charset_from_meta_tag() {
        let body = b"<html><head><meta charset=\"iso-8859-1\"><title>Test</title></head></html>";
        let encoding = sniff_encoding("text/html", body);
        // encoding_rs maps the ISO-8859-1 label to its windows-1252 superset
        assert_eq!(encoding, encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn charset_from_http_equiv_meta() {
        let body = b"<html><head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=shift_jis\"></head></html>";
        let encoding = sniff_encoding("text/html", body);
        assert_eq!(encoding, encoding_rs::SHIFT_JIS);
    }

    #[test]
    fn decodes_utf8_body() {
        let url = Url::parse("https://example.com/").unwrap();
        let page = decode_page(
            url,
            StatusCode::OK,
            "text/html; charset=utf-8",
            Bytes::from("Hello, 世界!".as_bytes().to_vec()),
        )
        .unwrap();
        assert_eq!(page.body, "Hello, 世界!");
        assert_eq!(page.charset, Charset::Utf8);
    }

    #[test]
    fn decodes_windows_1252_body() {
        let url = Url::parse("https://example.com/").unwrap();
        // 0x93/0x94 are curly quotes in windows-1252
        let page = decode_page(
            url,
            StatusCode::OK,
            "text/html; charset=windows-1252",
            Bytes::from(vec![0x93, 0x68, 0x69, 0x94]),
        )
        .unwrap();
        assert_eq!(page.body, "\u{201C}hi\u{201D}");
        assert_eq!(page.charset, Charset::Windows1252);
    }
}
