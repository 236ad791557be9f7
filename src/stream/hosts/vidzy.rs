//! Vidzy
//!
//! The player is sometimes inline, sometimes packed, and sometimes hidden
//! behind a download countdown. The countdown form is submitted directly
//! (`op=download1`) and the response is scanned the same way.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, REFERER};
use tracing::debug;

use crate::error::{DecodeError, DecodeResult};
use crate::form::{encode_urlencoded, Form};
use crate::http_client::HttpClient;
use crate::stream::decoder::{Decoder, Host, ResolvedStream};
use crate::stream::extract::find_source;
use crate::stream::packer::unpack;

pub struct VidzyDecoder {
    client: Arc<HttpClient>,
}

impl VidzyDecoder {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }
}

/// Direct patterns first, then the unpacked script.
pub fn scan(body: &str) -> Option<String> {
    find_source(body).or_else(|| unpack(body).and_then(|script| find_source(&script)))
}

/// File id for the countdown bypass form.
pub fn bypass_file_id(html: &str) -> Option<String> {
    Form::parse_all(html)
        .iter()
        .find_map(|form| form.field("id").filter(|v| !v.is_empty()).map(str::to_string))
        .or_else(|| Form::input_value(html, "id"))
}

#[async_trait]
impl Decoder for VidzyDecoder {
    fn host(&self) -> Host {
        Host::Vidzy
    }

    async fn decode(&self, embed_url: &str) -> DecodeResult<ResolvedStream> {
        let page = self.client.fetch_page(embed_url, Some(embed_url)).await?;
        let referer = page.url.to_string();

        if let Some(source) = scan(&page.body) {
            return ResolvedStream::with_referer(source, &referer);
        }

        let file_id = bypass_file_id(&page.body).ok_or(DecodeError::NotFound("vidzy source"))?;
        debug!(file_id = %file_id, "Submitting countdown bypass");

        let body = encode_urlencoded(&[
            ("op", "download1"),
            ("id", &file_id),
            ("method_free", "Free Download"),
        ]);
        let request = self
            .client
            .post(&referer)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(REFERER, &referer)
            .body(body);
        let submitted = HttpClient::send_page(request).await?;

        let source = scan(&submitted.body).ok_or(DecodeError::NotFound("vidzy source after bypass"))?;
        ResolvedStream::with_referer(source, &referer)
    }
}
