//! Concurrent resolution of a content page's stream list.
//!
//! Every embed reference resolves independently under its own timeout. A
//! failure, timeout or unknown host drops that one entry; the others are
//! unaffected and keep their input order.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::stream::decoder::{EmbedReference, Host, PlaybackKind, ResolvedStream};
use crate::stream::resolver::Resolver;

/// Player label for a host key, including hosts without a decoder.
pub fn player_name(host_key: &str) -> String {
    match Host::from_key(host_key) {
        Some(host) => host.display_name().to_string(),
        None if host_key == "netu" => "Netu".to_string(),
        None => host_key.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyHeaders {
    pub request: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorHints {
    /// Set for HLS playlists and for streams needing extra request headers.
    pub not_web_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_headers: Option<ProxyHeaders>,
}

/// One playable stream as presented to the catalog client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDescriptor {
    pub name: String,
    pub title: String,
    pub url: String,
    pub behavior_hints: BehaviorHints,
}

impl StreamDescriptor {
    pub fn new(reference: &EmbedReference, stream: ResolvedStream) -> Self {
        let player = player_name(&reference.host_key);
        let needs_headers = !stream.headers().is_empty();
        let not_web_ready = needs_headers || stream.kind() == PlaybackKind::Hls;

        Self {
            name: format!("[{}] {player}", reference.language),
            title: format!("{player} - {}", reference.language),
            url: stream.direct_url().to_string(),
            behavior_hints: BehaviorHints {
                not_web_ready,
                proxy_headers: needs_headers.then(|| ProxyHeaders {
                    request: stream.headers().clone(),
                }),
            },
        }
    }
}

/// Resolve every reference concurrently and keep the successes.
pub async fn resolve_all(
    resolver: &Resolver,
    references: &[EmbedReference],
    per_item_timeout: Duration,
) -> Vec<StreamDescriptor> {
    let tasks = references.iter().map(|reference| async move {
        let attempt = resolver.resolve(&reference.embed_url, &reference.host_key);
        match tokio::time::timeout(per_item_timeout, attempt).await {
            Ok(resolved) => resolved.map(|stream| StreamDescriptor::new(reference, stream)),
            Err(_) => {
                warn!(
                    host = %reference.host_key,
                    embed_url = %reference.embed_url,
                    "Resolution timed out"
                );
                None
            }
        }
    });

    let descriptors: Vec<StreamDescriptor> = join_all(tasks).await.into_iter().flatten().collect();
    debug!(
        requested = references.len(),
        resolved = descriptors.len(),
        "Stream list resolved"
    );
    descriptors
}
