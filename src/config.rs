//! Configuration loaded from `~/.config/embed-resolver/config.toml`.
//!
//! Every key is optional; a missing file yields [`Config::default`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cache::{default_policies, NamespacePolicy};
use crate::fingerprint::DEFAULT_ACCEPT_LANGUAGE;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub http: HttpConfig,
    pub resolve: ResolveConfig,
    /// Per-namespace overrides merged over the built-in table.
    pub cache: HashMap<String, NamespacePolicy>,
}

/// Where the referring catalog site currently lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub landing_url: String,
    pub fallback_base_url: String,
    pub origin_ttl_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            landing_url: "https://fstream.info/".to_string(),
            fallback_base_url: "https://fs9.lol".to_string(),
            origin_ttl_secs: 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: Option<String>,
    pub accept_language: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_redirects: 10,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Upper bound for one embed reference in a fan-out, all requests included.
    pub timeout_secs: u64,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self { timeout_secs: 45 }
    }
}

impl ResolveConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load from the default location, or return defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load from an explicit path. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }

    /// Built-in namespace table with this config's overrides applied.
    pub fn cache_policies(&self) -> HashMap<String, NamespacePolicy> {
        let mut policies = default_policies();
        policies.extend(self.cache.iter().map(|(k, v)| (k.clone(), *v)));
        policies
    }
}

/// Return the path to the config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("embed-resolver")
        .join("config.toml")
}
