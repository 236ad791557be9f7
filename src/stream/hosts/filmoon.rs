//! Filmoon
//!
//! Playback URLs are handed out only after a device attestation handshake:
//!
//! 1. `details` on the embed origin names the real player origin
//! 2. `settings` on the player origin opens the session
//! 3. `challenge` returns a challenge id and nonce
//! 4. `attest` takes the nonce signed with a fresh P-256 key (raw `r||s`),
//!    the public key as JWK coordinates and a browser fingerprint, and
//!    returns a bearer token
//! 5. `playback` exchanges the token for an AES-256-GCM sealed source list
//!
//! The key arrives split in two base64url halves; the payload is
//! `ciphertext || tag`.

use std::sync::{Arc, LazyLock};

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use regex::Regex;
use reqwest::header::{ACCEPT, REFERER};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::{DecodeError, DecodeResult};
use crate::fingerprint::ClientFingerprint;
use crate::http_client::HttpClient;
use crate::stream::decoder::{Decoder, Host, ResolvedStream};
use crate::stream::extract::{capture, BASE64URL_LENIENT};

const KEY_LEN: usize = 32;
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

const EMBED_PARENT: &str = "x-embed-parent";

static VIDEO_CODE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/e/([a-zA-Z0-9]+)").ok());

#[derive(Debug, Deserialize)]
struct Details {
    embed_frame_url: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Challenge {
    challenge_id: Option<String>,
    nonce: Option<String>,
    viewer_hint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Attestation {
    token: Option<String>,
    viewer_id: Option<Value>,
    device_id: Option<Value>,
    confidence: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct PlaybackEnvelope {
    playback: Option<Playback>,
}

/// Sealed source list returned by the playback endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Playback {
    pub key_parts: Vec<String>,
    pub iv: String,
    pub payload: String,
}

#[derive(Debug, Deserialize)]
struct SourceList {
    #[serde(default)]
    sources: Vec<SourceVariant>,
}

#[derive(Debug, Deserialize)]
struct SourceVariant {
    url: Option<String>,
    file: Option<String>,
    src: Option<String>,
    height: Option<f64>,
}

impl SourceVariant {
    fn location(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or(self.file.as_deref())
            .or(self.src.as_deref())
    }
}

/// Public half of the ephemeral key, JWK-shaped.
#[derive(Debug, Serialize)]
pub struct PublicJwk {
    crv: &'static str,
    ext: bool,
    key_ops: [&'static str; 1],
    kty: &'static str,
    x: String,
    y: String,
}

/// Per-attempt P-256 key used to sign the challenge nonce.
pub struct EphemeralKey {
    signing: SigningKey,
}

impl EphemeralKey {
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::random(&mut OsRng),
        }
    }

    /// Sign with SHA-256, fixed-width `r || s`, base64url.
    pub fn sign(&self, nonce: &str) -> String {
        let signature: Signature = self.signing.sign(nonce.as_bytes());
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    }

    pub fn public_jwk(&self) -> DecodeResult<PublicJwk> {
        let point = self.signing.verifying_key().as_affine().to_encoded_point(false);
        let (Some(x), Some(y)) = (point.x(), point.y()) else {
            return Err(DecodeError::Crypto("public key has no affine coordinates".into()));
        };
        Ok(PublicJwk {
            crv: "P-256",
            ext: true,
            key_ops: ["verify"],
            kty: "EC",
            x: URL_SAFE_NO_PAD.encode(x),
            y: URL_SAFE_NO_PAD.encode(y),
        })
    }
}

#[derive(Debug, Serialize)]
struct StorageIds {
    cookie: String,
    local_storage: String,
    indexed_db: String,
    cache_storage: String,
}

#[derive(Debug, Serialize)]
struct AttestRequest<'a> {
    viewer_id: &'a str,
    device_id: &'a str,
    challenge_id: &'a str,
    nonce: &'a str,
    signature: String,
    public_key: PublicJwk,
    client: ClientFingerprint,
    storage: StorageIds,
    attributes: Value,
}

pub struct FilmoonDecoder {
    client: Arc<HttpClient>,
}

impl FilmoonDecoder {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    fn api(request: RequestBuilder, referer: &str) -> RequestBuilder {
        request
            .header(ACCEPT, "application/json")
            .header(REFERER, referer)
    }

    /// Embed URL in `/e/<code>` form, following the short-link redirect if
    /// the given URL is not already in that shape.
    async fn player_embed_url(&self, embed_url: &str) -> DecodeResult<String> {
        if video_code(embed_url).is_some() {
            return Ok(embed_url.to_string());
        }
        let page = HttpClient::send_page(self.client.get(embed_url)).await?;
        debug!(final_url = %page.url, "Embed redirect followed");
        Ok(page.url.to_string())
    }

    async fn attest(
        &self,
        player_origin: &str,
        player_url: &str,
        challenge: Challenge,
    ) -> DecodeResult<Attestation> {
        let (Some(challenge_id), Some(nonce)) = (challenge.challenge_id, challenge.nonce) else {
            return Err(DecodeError::Rejected("challenge without id or nonce".into()));
        };

        let key = EphemeralKey::generate();
        let viewer_id = challenge
            .viewer_hint
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let device_id = Uuid::new_v4().simple().to_string();
        let paired = format!("{viewer_id}:{device_id}");

        let body = AttestRequest {
            viewer_id: &viewer_id,
            device_id: &device_id,
            challenge_id: &challenge_id,
            nonce: &nonce,
            signature: key.sign(&nonce),
            public_key: key.public_jwk()?,
            client: ClientFingerprint::synthetic(self.client.profile()),
            storage: StorageIds {
                cookie: viewer_id.clone(),
                local_storage: viewer_id.clone(),
                indexed_db: paired.clone(),
                cache_storage: paired,
            },
            attributes: json!({ "entropy": "high" }),
        };

        let request = Self::api(
            self.client.post(&format!("{player_origin}/api/videos/access/attest")),
            player_url,
        )
        .json(&body);
        HttpClient::send_json(request).await
    }
}

#[async_trait]
impl Decoder for FilmoonDecoder {
    fn host(&self) -> Host {
        Host::Filmoon
    }

    async fn decode(&self, embed_url: &str) -> DecodeResult<ResolvedStream> {
        let embed = self.player_embed_url(embed_url).await?;
        let code = video_code(&embed)
            .ok_or(DecodeError::NotFound("video code"))?
            .to_string();
        let embed_origin = Url::parse(&embed)?.origin().ascii_serialization();

        let details: Details = HttpClient::send_json(
            Self::api(
                self.client
                    .get(&format!("{embed_origin}/api/videos/{code}/embed/details")),
                &embed,
            )
            .header(EMBED_PARENT, &embed),
        )
        .await?;
        let player_url = details.embed_frame_url.ok_or_else(|| {
            DecodeError::Rejected(details.error.unwrap_or_else(|| "no embed_frame_url".into()))
        })?;
        let player_origin = Url::parse(&player_url)?.origin().ascii_serialization();
        debug!(code = %code, player = %player_origin, "Player origin resolved");

        // Session bootstrap; the body is not needed.
        Self::api(
            self.client
                .get(&format!("{player_origin}/api/videos/{code}/embed/settings")),
            &player_url,
        )
        .header(EMBED_PARENT, &embed)
        .send()
        .await?;

        let challenge: Challenge = HttpClient::send_json(Self::api(
            self.client
                .post(&format!("{player_origin}/api/videos/access/challenge")),
            &player_url,
        ))
        .await?;

        let attestation = self.attest(&player_origin, &player_url, challenge).await?;
        let Some(token) = attestation.token else {
            return Err(DecodeError::Rejected("attestation returned no token".into()));
        };
        debug!(code = %code, confidence = ?attestation.confidence, "Attestation accepted");

        let envelope: PlaybackEnvelope = HttpClient::send_json(
            Self::api(
                self.client
                    .post(&format!("{player_origin}/api/videos/{code}/embed/playback")),
                &player_url,
            )
            .header(EMBED_PARENT, &embed)
            .json(&json!({
                "fingerprint": {
                    "token": token,
                    "viewer_id": attestation.viewer_id,
                    "device_id": attestation.device_id,
                    "confidence": attestation.confidence,
                }
            })),
        )
        .await?;
        let playback = envelope
            .playback
            .ok_or_else(|| DecodeError::Rejected("no playback descriptor".into()))?;

        let plaintext = decrypt_playback(&playback)?;
        let list: SourceList = serde_json::from_slice(&plaintext)?;
        let source = best_source(&list.sources).ok_or(DecodeError::NotFound("source variant"))?;

        ResolvedStream::with_referer(source, &player_url)
    }
}

pub fn video_code(url: &str) -> Option<&str> {
    VIDEO_CODE.as_ref().and_then(|re| capture(re, url))
}

/// Reassemble key material and open the sealed payload.
pub fn decrypt_playback(playback: &Playback) -> DecodeResult<Vec<u8>> {
    let [first, second, ..] = playback.key_parts.as_slice() else {
        return Err(DecodeError::Decode("expected two key parts".into()));
    };

    let mut key = BASE64URL_LENIENT.decode(first)?;
    key.extend(BASE64URL_LENIENT.decode(second)?);
    let iv = BASE64URL_LENIENT.decode(&playback.iv)?;
    let blob = BASE64URL_LENIENT.decode(&playback.payload)?;

    decrypt_aes_gcm(&key, &iv, &blob)
}

/// AES-256-GCM open of `ciphertext || tag`. Tag mismatch is an error.
pub fn decrypt_aes_gcm(key: &[u8], iv: &[u8], blob: &[u8]) -> DecodeResult<Vec<u8>> {
    if key.len() != KEY_LEN {
        return Err(DecodeError::Crypto(format!(
            "key must be {KEY_LEN} bytes, got {}",
            key.len()
        )));
    }
    if iv.len() != IV_LEN {
        return Err(DecodeError::Crypto(format!(
            "iv must be {IV_LEN} bytes, got {}",
            iv.len()
        )));
    }
    if blob.len() < TAG_LEN {
        return Err(DecodeError::Crypto("payload shorter than tag".into()));
    }

    let (ciphertext, tag) = blob.split_at(blob.len() - TAG_LEN);
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| DecodeError::Crypto(e.to_string()))?;

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(Nonce::from_slice(iv), b"", &mut buffer, Tag::from_slice(tag))
        .map_err(|_| DecodeError::Crypto("authentication tag mismatch".into()))?;

    Ok(buffer)
}

/// Tallest variant wins; ties keep the earlier one.
fn best_source(variants: &[SourceVariant]) -> Option<String> {
    let best = variants.iter().reduce(|best, candidate| {
        if candidate.height.unwrap_or(0.0) > best.height.unwrap_or(0.0) {
            candidate
        } else {
            best
        }
    })?;
    best.location()
        .filter(|url| url.starts_with("http"))
        .map(str::to_string)
}
