//! Dood
//!
//! The page exposes a `/pass_md5/<id>` path and a `token`. Fetching the path
//! on the same origin returns a URL prefix; the playable URL is that prefix
//! plus ten random alphanumerics, the token and a millisecond expiry stamp.
//! Each constructed URL is single-use.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use reqwest::header::REFERER;

use crate::error::{DecodeError, DecodeResult};
use crate::http_client::HttpClient;
use crate::stream::decoder::{Decoder, Host, ResolvedStream};
use crate::stream::extract::{capture, random_alphanumeric};

static PASS_PATH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"/pass_md5/([^'"]+)"#).ok());

static TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[?&]token=([a-zA-Z0-9]+)").ok());

const SUFFIX_LEN: usize = 10;

pub struct DoodDecoder {
    client: Arc<HttpClient>,
}

impl DoodDecoder {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }
}

/// `(pass path, token)` from the embed markup. A missing token is tolerated.
pub fn pass_request(html: &str) -> Option<(String, String)> {
    let id = PASS_PATH.as_ref().and_then(|re| capture(re, html))?;
    let token = TOKEN
        .as_ref()
        .and_then(|re| capture(re, html))
        .unwrap_or_default();
    Some((format!("/pass_md5/{id}"), token.to_string()))
}

pub fn build_direct_url(prefix: &str, token: &str, expiry_ms: i64) -> String {
    format!(
        "{prefix}{}?token={token}&expiry={expiry_ms}",
        random_alphanumeric(SUFFIX_LEN)
    )
}

#[async_trait]
impl Decoder for DoodDecoder {
    fn host(&self) -> Host {
        Host::Dood
    }

    async fn decode(&self, embed_url: &str) -> DecodeResult<ResolvedStream> {
        let page = self.client.fetch_page(embed_url, Some(embed_url)).await?;
        let referer = page.url.to_string();

        let (pass_path, token) =
            pass_request(&page.body).ok_or(DecodeError::NotFound("pass_md5 path"))?;

        let request = self
            .client
            .get(&format!("{}{pass_path}", page.origin()))
            .header(REFERER, &referer);
        let prefix = HttpClient::send_page(request).await?.body;
        let prefix = prefix.trim();

        if !prefix.starts_with("http") {
            return Err(DecodeError::Rejected("pass_md5 returned no URL".into()));
        }

        let direct = build_direct_url(prefix, &token, Utc::now().timestamp_millis());
        ResolvedStream::with_referer(direct, &referer)
    }
}
