use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("http status {0}")]
    Status(reqwest::StatusCode),

    #[error("body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),

    #[error("charset decode failed: {0}")]
    Decode(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Whether the failure is plausibly temporary. The fetch path never
    /// retries on its own; callers use this to pick a log level.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidUrl(_)
            | Self::BodyTooLarge(_)
            | Self::UnsupportedContentType(_)
            | Self::Decode(_) => false,
            Self::Status(status) => status.is_server_error(),
            Self::Connect(_) | Self::Timeout | Self::TooManyRedirects | Self::Transport(_) => true,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_redirect() {
            Self::TooManyRedirects
        } else if let Some(status) = err.status() {
            Self::Status(status)
        } else if err.is_connect() || err.is_request() {
            // DNS resolution, refused connections, TLS handshake failures
            Self::Connect(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
