//! Wiring of the shared client, cache, site origin and resolver.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use url::Url;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::http_client::HttpClient;
use crate::matching::ContentKind;
use crate::origin::SiteOrigin;
use crate::page::PageLocator;
use crate::stream::{all_decoders, resolve_all, EmbedReference, ResolvedStream, Resolver, StreamDescriptor};

pub struct Engine {
    client: Arc<HttpClient>,
    cache: Arc<CacheStore>,
    origin: Arc<SiteOrigin>,
    resolver: Resolver,
    locator: PageLocator,
    resolve_timeout: Duration,
}

impl Engine {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Arc::new(HttpClient::new(&config.http)?);
        let cache = Arc::new(CacheStore::with_policies(config.cache_policies()));
        let origin = Arc::new(SiteOrigin::new(&config.site));

        let resolver = Resolver::new(Arc::clone(&cache), all_decoders(&client, &origin));
        let locator = PageLocator::new(Arc::clone(&client), Arc::clone(&origin), Arc::clone(&cache));

        Ok(Self {
            client,
            cache,
            origin,
            resolver,
            locator,
            resolve_timeout: config.resolve.timeout(),
        })
    }

    pub async fn resolve(&self, embed_url: &str, host_key: &str) -> Option<ResolvedStream> {
        self.resolver.resolve(embed_url, host_key).await
    }

    /// Resolve a page's stream list concurrently; failures are dropped.
    pub async fn streams(&self, references: &[EmbedReference]) -> Vec<StreamDescriptor> {
        resolve_all(&self.resolver, references, self.resolve_timeout).await
    }

    pub async fn locate(&self, site_id: &str, kind: ContentKind) -> Option<Url> {
        self.locator.locate(site_id, kind).await
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn origin(&self) -> &Arc<SiteOrigin> {
        &self.origin
    }

    pub fn client(&self) -> &Arc<HttpClient> {
        &self.client
    }
}
