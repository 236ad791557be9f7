//! Current base URL of the referring catalog site.
//!
//! The site rotates domains; a landing page advertises the live one in an
//! `<a id="mainUrl">` anchor. The value is refreshed lazily once its TTL has
//! elapsed and the last known value (initially the configured fallback)
//! stays in use whenever the landing page cannot be read.

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::config::SiteConfig;
use crate::error::{DecodeError, DecodeResult};
use crate::http_client::HttpClient;

struct State {
    base_url: String,
    resolved_at: Option<Instant>,
}

pub struct SiteOrigin {
    landing_url: String,
    ttl: Duration,
    state: RwLock<State>,
}

impl SiteOrigin {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            landing_url: config.landing_url.clone(),
            ttl: Duration::from_secs(config.origin_ttl_secs),
            state: RwLock::new(State {
                base_url: trim_base(&config.fallback_base_url),
                resolved_at: None,
            }),
        }
    }

    /// Last known base URL, no I/O.
    pub fn current(&self) -> String {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .base_url
            .clone()
    }

    /// Base URL with a trailing slash, as browsers send it in `Referer`.
    pub fn referer(&self) -> String {
        format!("{}/", self.current())
    }

    /// [`Self::referer`] after a lazy refresh of the base URL.
    pub async fn resolve_referer(&self, client: &HttpClient) -> String {
        format!("{}/", self.resolve(client).await)
    }

    fn is_fresh(&self) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .resolved_at
            .is_some_and(|at| at.elapsed() < self.ttl)
    }

    /// Return the base URL, re-reading the landing page if the cached value
    /// has expired.
    pub async fn resolve(&self, client: &HttpClient) -> String {
        if self.is_fresh() {
            return self.current();
        }

        match self.fetch_landing(client).await {
            Ok(base_url) => {
                info!(base_url = %base_url, "Site origin resolved");
                let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
                state.base_url = base_url.clone();
                state.resolved_at = Some(Instant::now());
                base_url
            }
            Err(e) => {
                warn!(error = %e, "Failed to resolve site origin, keeping last known");
                self.current()
            }
        }
    }

    async fn fetch_landing(&self, client: &HttpClient) -> DecodeResult<String> {
        let page = client.fetch_page(&self.landing_url, None).await?;
        main_url_from_landing(&page.body).ok_or(DecodeError::NotFound("#mainUrl anchor"))
    }
}

/// Extract the advertised base URL from the landing page markup.
pub fn main_url_from_landing(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a#mainUrl").ok()?;
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(trim_base)
        .find(|href| href.starts_with("http"))
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
