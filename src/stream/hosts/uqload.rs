//! Uqload: the player config carries a plain `sources: ["…"]` array.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{DecodeError, DecodeResult};
use crate::http_client::HttpClient;
use crate::stream::decoder::{Decoder, Host, ResolvedStream};
use crate::stream::extract::first_array_source;

pub struct UqloadDecoder {
    client: Arc<HttpClient>,
}

impl UqloadDecoder {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Decoder for UqloadDecoder {
    fn host(&self) -> Host {
        Host::Uqload
    }

    async fn decode(&self, embed_url: &str) -> DecodeResult<ResolvedStream> {
        let page = self.client.fetch_page(embed_url, Some(embed_url)).await?;
        let source =
            first_array_source(&page.body).ok_or(DecodeError::NotFound("sources array"))?;
        ResolvedStream::with_referer(source, embed_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FixtureServer, Reply};

    #[tokio::test]
    async fn decode_takes_first_source_with_embed_referer() {
        let server = FixtureServer::start().await;
        server.route(
            "GET",
            "/embed-abc.html",
            Reply::html(
                r#"<script>var player = new Clappr.Player({sources: ["https://m5.uqload.example/v.mp4", "https://m6.uqload.example/v.mp4"], poster: "p.jpg"});</script>"#,
            ),
        );
        let embed = server.url("/embed-abc.html");

        let stream = UqloadDecoder::new(testing::client())
            .decode(&embed)
            .await
            .unwrap();

        assert_eq!(stream.direct_url(), "https://m5.uqload.example/v.mp4");
        assert_eq!(stream.headers().get("Referer"), Some(&embed));
        let requests = server.requests_to("/embed-abc.html");
        assert_eq!(requests[0].header("referer"), Some(embed.as_str()));
    }

    #[tokio::test]
    async fn decode_without_sources_is_not_found() {
        let server = FixtureServer::start().await;
        server.route("GET", "/embed-gone.html", Reply::html("<p>File was deleted</p>"));

        let err = UqloadDecoder::new(testing::client())
            .decode(&server.url("/embed-gone.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::NotFound(_)), "{err}");
    }

    #[tokio::test]
    async fn decode_error_status_is_reported() {
        let server = FixtureServer::start().await;

        let err = UqloadDecoder::new(testing::client())
            .decode(&server.url("/embed-missing.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::Status { status: 404, .. }), "{err}");
    }
}
