//! Decoder error taxonomy.
//!
//! Every variant ends up as "this stream is unavailable" once it reaches the
//! dispatch layer; the distinction only matters for logging.

use thiserror::Error;

pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(Debug, Error)]
pub enum DecodeError {
    /// Transport failure: DNS, connect, TLS, timeout, body read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Expected pattern or field absent from the upstream page.
    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("decode error: {0}")]
    Decode(String),

    /// Tag mismatch or malformed key material.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Upstream answered but refused to hand out what we asked for.
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl From<base64::DecodeError> for DecodeError {
    fn from(err: base64::DecodeError) -> Self {
        DecodeError::Decode(format!("base64: {err}"))
    }
}

impl From<url::ParseError> for DecodeError {
    fn from(err: url::ParseError) -> Self {
        DecodeError::InvalidUrl(err.to_string())
    }
}
