//! Decoder trait and common types.
//!
//! A [`Decoder`] knows how to turn one video host's embed page into a direct
//! playable URL. The set of hosts is closed: [`Host`] has one variant per
//! decoder and adding a host means adding a variant.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DecodeError, DecodeResult};

/// Supported video hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Host {
    Uqload,
    Voe,
    Dood,
    Filmoon,
    Vidzy,
    Premium,
}

impl Host {
    pub const ALL: [Host; 6] = [
        Host::Premium,
        Host::Vidzy,
        Host::Uqload,
        Host::Voe,
        Host::Dood,
        Host::Filmoon,
    ];

    /// Key used in scraped stream lists.
    pub fn key(self) -> &'static str {
        match self {
            Host::Uqload => "uqload",
            Host::Voe => "voe",
            Host::Dood => "dood",
            Host::Filmoon => "filmoon",
            Host::Vidzy => "vidzy",
            Host::Premium => "premium",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.key() == key)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Host::Uqload => "Uqload",
            Host::Voe => "Voe",
            Host::Dood => "Dood",
            Host::Filmoon => "Filmoon",
            Host::Vidzy => "Vidzy",
            Host::Premium => "FSvid",
        }
    }

    /// Hosts whose direct URLs are single-use or expire within minutes.
    /// Their results are never cached.
    pub fn is_single_use(self) -> bool {
        matches!(self, Host::Dood | Host::Filmoon)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Audio/subtitle variant of an embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    Vf,
    Vostfr,
    Vff,
    Vfq,
    Vo,
}

impl Language {
    pub fn label(self) -> &'static str {
        match self {
            Language::Vf => "VF",
            Language::Vostfr => "VOSTFR",
            Language::Vff => "VFF",
            Language::Vfq => "VFQ",
            Language::Vo => "VO",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of a content page's stream list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedReference {
    pub host_key: String,
    pub language: Language,
    pub embed_url: String,
}

impl EmbedReference {
    pub fn new(host_key: impl Into<String>, language: Language, embed_url: impl Into<String>) -> Self {
        Self {
            host_key: host_key.into(),
            language,
            embed_url: embed_url.into(),
        }
    }
}

/// Segmented playlist vs single progressive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackKind {
    Hls,
    Progressive,
}

/// A direct playable URL plus the headers the CDN requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStream {
    direct_url: String,
    headers: BTreeMap<String, String>,
}

impl ResolvedStream {
    /// Validate that `direct_url` is absolute with an http(s) scheme.
    pub fn new(direct_url: impl Into<String>) -> DecodeResult<Self> {
        let direct_url = direct_url.into();
        let parsed = Url::parse(&direct_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DecodeError::InvalidUrl(direct_url));
        }
        Ok(Self {
            direct_url,
            headers: BTreeMap::new(),
        })
    }

    /// Shorthand for the common case of a `Referer`-gated CDN.
    pub fn with_referer(direct_url: impl Into<String>, referer: &str) -> DecodeResult<Self> {
        Ok(Self::new(direct_url)?.header("Referer", referer))
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn direct_url(&self) -> &str {
        &self.direct_url
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn kind(&self) -> PlaybackKind {
        let path_is_playlist = Url::parse(&self.direct_url)
            .map(|u| u.path().ends_with(".m3u8"))
            .unwrap_or(false);
        if path_is_playlist {
            PlaybackKind::Hls
        } else {
            PlaybackKind::Progressive
        }
    }
}

/// Host-specific embed decoder.
///
/// Implementations never panic on upstream input; every failure is an
/// `Err` which the resolver turns into "stream unavailable".
#[async_trait]
pub trait Decoder: Send + Sync {
    fn host(&self) -> Host;

    async fn decode(&self, embed_url: &str) -> DecodeResult<ResolvedStream>;
}
