use encoding_rs::Encoding;
use reqwest::StatusCode;
use url::Url;

/// Character set a page body was decoded from. Mostly informational; the
/// decoded body is always UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    Windows1252,
    ShiftJis,
    Gbk,
    Big5,
    Other(String),
}

impl Charset {
    pub fn from_encoding(encoding: &'static Encoding) -> Self {
        match encoding.name() {
            "UTF-8" => Self::Utf8,
            "windows-1252" => Self::Windows1252,
            "Shift_JIS" => Self::ShiftJis,
            "GBK" | "gb18030" => Self::Gbk,
            "Big5" => Self::Big5,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A successfully fetched, UTF-8 decoded HTML page.
#[derive(Debug)]
pub struct FetchedPage {
    /// Effective URL after following redirects.
    pub url_final: Url,
    pub status: StatusCode,
    pub body: String,
    pub charset: Charset,
}
