//! Catalog page lookup by numeric site id.
//!
//! Content pages live under `/<id>-<slug>.html`, sometimes below a category
//! prefix. The slug is not needed: the site redirects `/<id>-.html` to the
//! canonical page, so each candidate path is fetched and the first one that
//! answers 2xx gives the final URL.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info};
use url::Url;

use crate::cache::{ns, CacheStore};
use crate::http_client::HttpClient;
use crate::matching::ContentKind;
use crate::origin::SiteOrigin;

static SITE_ID: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"/(\d+)-").ok());

/// Paths to try for `site_id`, most specific first.
pub fn candidate_paths(site_id: &str, kind: ContentKind) -> [String; 2] {
    let category = match kind {
        ContentKind::Movie => "films",
        ContentKind::Series => "s-tv",
    };
    [
        format!("/{category}/{site_id}-.html"),
        format!("/{site_id}-.html"),
    ]
}

/// Numeric id from a content page URL such as `/films/15124302-slug.html`.
pub fn site_id_from_url(url: &str) -> Option<String> {
    SITE_ID
        .as_ref()?
        .captures(url)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

pub struct PageLocator {
    client: Arc<HttpClient>,
    origin: Arc<SiteOrigin>,
    cache: Arc<CacheStore>,
}

impl PageLocator {
    pub fn new(client: Arc<HttpClient>, origin: Arc<SiteOrigin>, cache: Arc<CacheStore>) -> Self {
        Self {
            client,
            origin,
            cache,
        }
    }

    /// Final URL of the content page for `site_id`, or `None` when no
    /// candidate path answers.
    pub async fn locate(&self, site_id: &str, kind: ContentKind) -> Option<Url> {
        let cache_key = format!("{}:{site_id}", kind.as_str());
        if let Some(url) = self.cache.get::<Url>(ns::PAGE_URL, &cache_key) {
            return Some(url);
        }

        let base = self.origin.resolve(&self.client).await;
        let referer = format!("{base}/");

        for path in candidate_paths(site_id, kind) {
            let url = format!("{base}{path}");
            match self.client.fetch_page(&url, Some(&referer)).await {
                Ok(page) => {
                    info!(site_id, page_url = %page.url, "Content page located");
                    self.cache.set(ns::PAGE_URL, &cache_key, page.url.clone());
                    return Some(page.url);
                }
                Err(e) => debug!(url = %url, error = %e, "Candidate path failed"),
            }
        }

        info!(site_id, kind = kind.as_str(), "No content page found");
        None
    }
}
