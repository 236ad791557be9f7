//! FSvid (`premium`)
//!
//! A packed JWPlayer setup. The host refuses self-referencing requests, so
//! the catalog site is sent as `Referer`. The resulting playlist needs no
//! extra headers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{DecodeError, DecodeResult};
use crate::http_client::HttpClient;
use crate::origin::SiteOrigin;
use crate::stream::decoder::{Decoder, Host, ResolvedStream};
use crate::stream::extract::find_source;
use crate::stream::packer::unpack;

pub struct PremiumDecoder {
    client: Arc<HttpClient>,
    origin: Arc<SiteOrigin>,
}

impl PremiumDecoder {
    pub fn new(client: Arc<HttpClient>, origin: Arc<SiteOrigin>) -> Self {
        Self { client, origin }
    }
}

/// Unpacked script first, raw page patterns second.
pub fn scan(body: &str) -> Option<String> {
    unpack(body)
        .and_then(|script| find_source(&script))
        .or_else(|| find_source(body))
}

#[async_trait]
impl Decoder for PremiumDecoder {
    fn host(&self) -> Host {
        Host::Premium
    }

    async fn decode(&self, embed_url: &str) -> DecodeResult<ResolvedStream> {
        let site = self.origin.resolve_referer(&self.client).await;
        let page = self.client.fetch_page(embed_url, Some(&site)).await?;
        let source = scan(&page.body).ok_or(DecodeError::NotFound("fsvid source"))?;
        ResolvedStream::new(source)
    }
}
