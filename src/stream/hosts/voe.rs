//! Voe
//!
//! The embed domain bounces to a rotating mirror through a script redirect.
//! The mirror page carries the player config in a JSON script block,
//! obfuscated by a fixed chain:
//!
//! 1. ROT13
//! 2. drop everything outside the base64 alphabet (separator junk)
//! 3. base64 decode
//! 4. shift every byte down by 3
//! 5. reverse
//! 6. base64 decode
//!
//! The result is JSON with a `source`/`file`/`url` field, or occasionally the
//! bare URL.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use base64::Engine as _;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{DecodeError, DecodeResult};
use crate::http_client::HttpClient;
use crate::origin::SiteOrigin;
use crate::stream::decoder::{Decoder, Host, ResolvedStream};
use crate::stream::extract::{capture, find_source, rot13, BASE64_LENIENT};

static SCRIPT_REDIRECT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"window\.location\.href\s*=\s*'([^']+)'").ok());

static JSON_SCRIPT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script\s+type="application/json"[^>]*>(.*?)</script>"#).ok()
});

pub struct VoeDecoder {
    client: Arc<HttpClient>,
    origin: Arc<SiteOrigin>,
}

impl VoeDecoder {
    pub fn new(client: Arc<HttpClient>, origin: Arc<SiteOrigin>) -> Self {
        Self { client, origin }
    }
}

#[async_trait]
impl Decoder for VoeDecoder {
    fn host(&self) -> Host {
        Host::Voe
    }

    async fn decode(&self, embed_url: &str) -> DecodeResult<ResolvedStream> {
        let site = self.origin.resolve_referer(&self.client).await;
        let mut page = self.client.fetch_page(embed_url, Some(&site)).await?;

        let redirect = SCRIPT_REDIRECT
            .as_ref()
            .and_then(|re| capture(re, &page.body))
            .map(str::to_string);
        if let Some(target) = redirect {
            debug!(target = %target, "Following script redirect");
            let referer = page.url.to_string();
            page = self.client.fetch_page(&target, Some(&referer)).await?;
        }

        let referer = page.url.to_string();

        let block = JSON_SCRIPT.as_ref().and_then(|re| capture(re, &page.body));
        if let Some(block) = block {
            match decode_script_block(block) {
                Ok(url) => return ResolvedStream::with_referer(url, &referer),
                Err(e) => debug!(error = %e, "Script block did not decode, trying page patterns"),
            }
        }

        let direct = find_source(&page.body).ok_or(DecodeError::NotFound("voe source"))?;
        ResolvedStream::with_referer(direct, &referer)
    }
}

/// Decode the JSON script block body (a string or one-element list).
pub fn decode_script_block(raw: &str) -> DecodeResult<String> {
    let value: Value = serde_json::from_str(raw.trim())?;
    let encoded = match &value {
        Value::String(s) => s.as_str(),
        Value::Array(items) => items
            .first()
            .and_then(Value::as_str)
            .ok_or(DecodeError::NotFound("encoded payload"))?,
        _ => return Err(DecodeError::NotFound("encoded payload")),
    };

    let decoded = decode_payload(encoded)?;
    source_from_decoded(&decoded)
}

/// Undo the six-step obfuscation chain.
pub fn decode_payload(encoded: &str) -> DecodeResult<String> {
    let rotated = rot13(encoded);

    let cleaned: String = rotated
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();

    let mut bytes = BASE64_LENIENT.decode(cleaned)?;

    for b in &mut bytes {
        *b = b.wrapping_sub(3);
    }
    bytes.reverse();

    let plain = BASE64_LENIENT.decode(&bytes)?;
    String::from_utf8(plain).map_err(|e| DecodeError::Decode(e.to_string()))
}

fn source_from_decoded(decoded: &str) -> DecodeResult<String> {
    let Ok(json) = serde_json::from_str::<Value>(decoded) else {
        let trimmed = decoded.trim();
        if trimmed.starts_with("http") {
            return Ok(trimmed.to_string());
        }
        return Err(DecodeError::Decode("payload is neither JSON nor a URL".into()));
    };

    ["source", "file", "url"]
        .iter()
        .find_map(|key| json.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .filter(|url| url.starts_with("http"))
        .map(str::to_string)
        .ok_or(DecodeError::NotFound("source field"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FixtureServer, Reply};
    use base64::engine::general_purpose::STANDARD;

    /// Apply the inverse of each decoding step, in reverse order.
    fn encode_fixture(plain: &str) -> String {
        let inner = STANDARD.encode(plain);
        let mut bytes = inner.into_bytes();
        bytes.reverse();
        for b in &mut bytes {
            *b += 3;
        }
        let outer = STANDARD.encode(&bytes);

        let junk = ["~@", "^^", "%?", "*!"];
        let mut with_junk = String::new();
        for (i, chunk) in outer.as_bytes().chunks(5).enumerate() {
            with_junk.push_str(std::str::from_utf8(chunk).unwrap());
            with_junk.push_str(junk[i % junk.len()]);
        }

        rot13(&with_junk)
    }

    #[test]
    fn payload_round_trip_recovers_json() {
        let json = r#"{"source":"https://delivery.example/engine/hls2/01/abc/master.m3u8?t=x"}"#;
        let encoded = encode_fixture(json);
        assert_ne!(encoded, json);
        assert_eq!(decode_payload(&encoded).unwrap(), json);
    }

    #[test]
    fn script_block_as_list() {
        let url = "https://delivery.example/v/master.m3u8";
        let block = format!(r#"["{}"]"#, encode_fixture(&format!(r#"{{"file":"{url}"}}"#)));
        assert_eq!(decode_script_block(&block).unwrap(), url);
    }

    #[test]
    fn script_block_as_bare_string() {
        let url = "https://delivery.example/v/video.mp4";
        let block = format!(r#"  "{}"  "#, encode_fixture(&format!(r#"{{"url":"{url}"}}"#)));
        assert_eq!(decode_script_block(&block).unwrap(), url);
    }

    #[test]
    fn decoded_bare_url_is_accepted() {
        let url = "https://delivery.example/direct.mp4";
        let block = format!(r#"["{}"]"#, encode_fixture(&format!("{url}\n")));
        assert_eq!(decode_script_block(&block).unwrap(), url);
    }

    #[test]
    fn relative_source_is_rejected() {
        let block = format!(r#"["{}"]"#, encode_fixture(r#"{"source":"/local.m3u8"}"#));
        assert!(decode_script_block(&block).is_err());
    }

    #[test]
    fn non_payload_json_is_rejected() {
        assert!(decode_script_block(r#"{"a":1}"#).is_err());
        assert!(decode_script_block("[]").is_err());
        assert!(decode_script_block("not json").is_err());
    }

    #[test]
    fn patterns_compile() {
        assert!(SCRIPT_REDIRECT.is_some());
        let page = r#"<script>window.location.href = 'https://mirror.example/e/abc';</script>"#;
        let re = SCRIPT_REDIRECT.as_ref().unwrap();
        assert_eq!(capture(re, page), Some("https://mirror.example/e/abc"));

        let page = r#"<script type="application/json" id="cfg">["payload"]</script>"#;
        let re = JSON_SCRIPT.as_ref().unwrap();
        assert_eq!(capture(re, page), Some(r#"["payload"]"#));
    }


    fn serve_landing(server: &FixtureServer) {
        server.route(
            "GET",
            "/landing",
            Reply::html(r#"<a id="mainUrl" href="https://catalog.example/">Entrer</a>"#),
        );
    }

    #[tokio::test]
    async fn decode_follows_script_redirect_once() {
        let server = FixtureServer::start().await;
        serve_landing(&server);

        let mirror = server.url("/mirror/e/abc");
        let third = server.url("/third/e/abc");
        server.route(
            "GET",
            "/e/abc",
            Reply::html(format!("<script>window.location.href = '{mirror}';</script>")),
        );
        let payload = encode_fixture(r#"{"source":"https://delivery.example/hls/master.m3u8"}"#);
        server.route(
            "GET",
            "/mirror/e/abc",
            Reply::html(format!(
                r#"<script>window.location.href = '{third}';</script>
                <script type="application/json">["{payload}"]</script>"#
            )),
        );

        let embed = server.url("/e/abc");
        let decoder = VoeDecoder::new(testing::client(), server.site_origin());
        let stream = decoder.decode(&embed).await.unwrap();

        assert_eq!(stream.direct_url(), "https://delivery.example/hls/master.m3u8");
        assert_eq!(stream.headers().get("Referer"), Some(&mirror));

        assert_eq!(
            server.requests_to("/e/abc")[0].header("referer"),
            Some("https://catalog.example/")
        );
        assert_eq!(
            server.requests_to("/mirror/e/abc")[0].header("referer"),
            Some(embed.as_str())
        );
        assert!(server.requests_to("/third/e/abc").is_empty());
        assert_eq!(server.requests_to("/landing").len(), 1);
    }

    #[tokio::test]
    async fn decode_without_script_block_uses_page_patterns() {
        let server = FixtureServer::start().await;
        serve_landing(&server);
        server.route(
            "GET",
            "/e/plain",
            Reply::html(r#"<script>player.setup({file:"https://delivery.example/v/video.mp4"});</script>"#),
        );

        let embed = server.url("/e/plain");
        let decoder = VoeDecoder::new(testing::client(), server.site_origin());
        let stream = decoder.decode(&embed).await.unwrap();

        assert_eq!(stream.direct_url(), "https://delivery.example/v/video.mp4");
        assert_eq!(stream.headers().get("Referer"), Some(&embed));
    }

    #[tokio::test]
    async fn decode_with_broken_block_falls_back_to_page_patterns() {
        let server = FixtureServer::start().await;
        serve_landing(&server);
        server.route(
            "GET",
            "/e/broken",
            Reply::html(
                r#"<script type="application/json">["!!!"]</script>
                <script>var cfg = {source:"https://delivery.example/fallback.m3u8"};</script>"#,
            ),
        );

        let decoder = VoeDecoder::new(testing::client(), server.site_origin());
        let stream = decoder.decode(&server.url("/e/broken")).await.unwrap();
        assert_eq!(stream.direct_url(), "https://delivery.example/fallback.m3u8");
    }
}
