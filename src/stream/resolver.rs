//! Routes embed URLs to their host decoder through the shared cache.
//!
//! - Unknown host key: absent, no decoder runs
//! - Single-use hosts: decoder runs on every call, cache untouched
//! - Other hosts: `resolved` namespace keyed by embed URL; only successes
//!   are stored so a transient failure is retried next time

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::cache::{ns, CacheStore};
use crate::stream::decoder::{Decoder, Host, ResolvedStream};

const LOG_URL_PREFIX: usize = 70;

pub struct Resolver {
    cache: Arc<CacheStore>,
    decoders: HashMap<Host, Arc<dyn Decoder>>,
}

impl Resolver {
    /// Register `decoders` by their host. A later decoder for the same host
    /// replaces an earlier one.
    pub fn new(cache: Arc<CacheStore>, decoders: impl IntoIterator<Item = Arc<dyn Decoder>>) -> Self {
        let decoders = decoders
            .into_iter()
            .map(|decoder| (decoder.host(), decoder))
            .collect();
        Self { cache, decoders }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn supports(&self, host_key: &str) -> bool {
        Host::from_key(host_key).is_some_and(|host| self.decoders.contains_key(&host))
    }

    /// Resolve one embed URL. Never fails: every error is logged and
    /// reported as `None`.
    pub async fn resolve(&self, embed_url: &str, host_key: &str) -> Option<ResolvedStream> {
        let Some((host, decoder)) = Host::from_key(host_key)
            .and_then(|host| self.decoders.get(&host).map(|d| (host, d)))
        else {
            info!(host = host_key, "No decoder for host");
            return None;
        };

        let cacheable = !host.is_single_use();

        if cacheable {
            if let Some(hit) = self.cache.get::<ResolvedStream>(ns::RESOLVED, embed_url) {
                info!(host = %host, "Cache hit");
                return Some(hit);
            }
        }

        let start = Instant::now();
        let outcome = decoder.decode(embed_url).await;
        let ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(stream) => {
                info!(
                    host = %host,
                    ms,
                    url = %url_prefix(stream.direct_url()),
                    "Resolved"
                );
                if cacheable {
                    self.cache.set(ns::RESOLVED, embed_url, stream.clone());
                }
                Some(stream)
            }
            Err(e) => {
                warn!(host = %host, ms, embed_url, error = %e, "Resolution failed");
                None
            }
        }
    }
}

fn url_prefix(url: &str) -> &str {
    match url.char_indices().nth(LOG_URL_PREFIX) {
        Some((idx, _)) => &url[..idx],
        None => url,
    }
}
