//! HTTP client shared by every decoder.
//!
//! Features:
//! - Browser-profile default headers (User-Agent, Accept-Language, client hints)
//! - Per-request and connect timeouts so one stuck host cannot stall siblings
//! - Cookie store for multi-step session flows
//! - Brotli, Zstd, Gzip compression (auto-negotiated)

use std::time::Duration;

use anyhow::Result;
use reqwest::header::REFERER;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::HttpConfig;
use crate::error::{DecodeError, DecodeResult};
use crate::fingerprint::{chrome_profile, BrowserProfile};

/// A fetched document: final URL after redirects, status and body text.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub status: StatusCode,
    pub body: String,
}

impl Page {
    /// Scheme + host + port of the final URL, without trailing slash.
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }
}

pub struct HttpClient {
    client: Client,
    profile: BrowserProfile,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let profile = chrome_profile().with_overrides(
            config.user_agent.as_deref(),
            Some(config.accept_language.as_str()),
        );
        Self::with_profile(profile, config)
    }

    pub fn with_profile(profile: BrowserProfile, config: &HttpConfig) -> Result<Self> {
        let headers = profile.to_headers()?;

        let client = Client::builder()
            .http2_adaptive_window(true)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .brotli(true)
            .zstd(true)
            .gzip(true)
            .deflate(true)
            .default_headers(headers)
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .cookie_store(true)
            .build()?;

        Ok(Self { client, profile })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// GET a page, optionally with a `Referer`. Non-2xx is an error.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &str, referer: Option<&str>) -> DecodeResult<Page> {
        let mut request = self.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }
        Self::send_page(request).await
    }

    /// Send a prepared request and read the body as text.
    pub async fn send_page(request: RequestBuilder) -> DecodeResult<Page> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();

        debug!(status = %status, final_url = %url, "Response received");

        if !status.is_success() {
            return Err(DecodeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(Page { url, status, body })
    }

    /// Send a prepared request and deserialize a JSON body.
    ///
    /// Error statuses are not rejected up front: these APIs report failures
    /// inside the JSON body, which the caller inspects.
    pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> DecodeResult<T> {
        let response = request.send().await?;
        debug!(status = %response.status(), url = %response.url(), "JSON response received");
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn profile(&self) -> &BrowserProfile {
        &self.profile
    }

    /// Get the underlying reqwest client
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}
