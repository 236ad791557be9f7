//! Browser fingerprint
//!
//! Request headers and the synthetic client fingerprint submitted during
//! attestation. Both describe the same desktop Chrome on Windows so the two
//! never contradict each other.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderValue, InvalidHeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT,
};
use serde::Serialize;

pub const CHROME_MAJOR: &str = "131";
pub const CHROME_FULL: &str = "131.0.0.0";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "fr-FR,fr;q=0.9,en;q=0.5";

/// Headers sent with every request.
#[derive(Debug, Clone)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub sec_ch_ua: String,
    pub sec_ch_ua_mobile: String,
    pub sec_ch_ua_platform: String,
}

/// Desktop Chrome on Windows.
#[must_use]
pub fn chrome_profile() -> BrowserProfile {
    let user_agent = format!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{CHROME_FULL} Safari/537.36"
    );

    BrowserProfile {
        user_agent,
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        sec_ch_ua: format!(
            "\"Google Chrome\";v=\"{CHROME_MAJOR}\", \"Chromium\";v=\"{CHROME_MAJOR}\", \"Not_A Brand\";v=\"24\""
        ),
        sec_ch_ua_mobile: "?0".to_string(),
        sec_ch_ua_platform: "\"Windows\"".to_string(),
    }
}

impl BrowserProfile {
    /// Override the user agent and language, keeping the rest.
    #[must_use]
    pub fn with_overrides(mut self, user_agent: Option<&str>, accept_language: Option<&str>) -> Self {
        if let Some(ua) = user_agent {
            self.user_agent = ua.to_string();
        }
        if let Some(lang) = accept_language {
            self.accept_language = lang.to_string();
        }
        self
    }

    /// Convert profile to reqwest `HeaderMap`
    pub fn to_headers(&self) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_str(&self.accept)?);
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(&self.accept_language)?);

        if self.user_agent.contains("Chrome/") {
            headers.insert("Sec-CH-UA", HeaderValue::from_str(&self.sec_ch_ua)?);
            headers.insert("Sec-CH-UA-Mobile", HeaderValue::from_str(&self.sec_ch_ua_mobile)?);
            headers.insert(
                "Sec-CH-UA-Platform",
                HeaderValue::from_str(&self.sec_ch_ua_platform)?,
            );
        }

        Ok(headers)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BrandVersion {
    pub brand: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientExtra {
    pub vendor: &'static str,
    #[serde(rename = "appVersion")]
    pub app_version: String,
}

/// Synthetic client fingerprint for the attestation handshake.
///
/// Static attributes mirror a mid-range Windows gaming desktop; the canvas
/// and audio hashes are fresh random values on every call.
#[derive(Debug, Clone, Serialize)]
pub struct ClientFingerprint {
    pub user_agent: String,
    pub architecture: &'static str,
    pub bitness: &'static str,
    pub platform: &'static str,
    pub platform_version: &'static str,
    pub model: &'static str,
    pub ua_full_version: &'static str,
    pub brand_full_versions: Vec<BrandVersion>,
    pub pixel_ratio: u8,
    pub screen_width: u32,
    pub screen_height: u32,
    pub color_depth: u8,
    pub languages: Vec<&'static str>,
    pub timezone: &'static str,
    pub hardware_concurrency: u8,
    pub device_memory: u8,
    pub touch_points: u8,
    pub webgl_vendor: &'static str,
    pub webgl_renderer: &'static str,
    pub canvas_hash: String,
    pub audio_hash: String,
    pub pointer_type: &'static str,
    pub extra: ClientExtra,
}

impl ClientFingerprint {
    pub fn synthetic(profile: &BrowserProfile) -> Self {
        let app_version = profile
            .user_agent
            .strip_prefix("Mozilla/")
            .unwrap_or(&profile.user_agent)
            .to_string();

        Self {
            user_agent: profile.user_agent.clone(),
            architecture: "x86",
            bitness: "64",
            platform: "Windows",
            platform_version: "15.0.0",
            model: "",
            ua_full_version: CHROME_FULL,
            brand_full_versions: vec![
                BrandVersion { brand: "Not_A Brand", version: "8.0.0.0" },
                BrandVersion { brand: "Chromium", version: CHROME_FULL },
                BrandVersion { brand: "Google Chrome", version: CHROME_FULL },
            ],
            pixel_ratio: 1,
            screen_width: 1920,
            screen_height: 1080,
            color_depth: 24,
            languages: vec!["en-US", "en"],
            timezone: "Europe/Paris",
            hardware_concurrency: 8,
            device_memory: 8,
            touch_points: 0,
            webgl_vendor: "Google Inc. (NVIDIA)",
            webgl_renderer: "ANGLE (NVIDIA, NVIDIA GeForce GTX 1060 6GB Direct3D11 vs_5_0 ps_5_0, D3D11)",
            canvas_hash: random_hash(),
            audio_hash: random_hash(),
            pointer_type: "fine,hover",
            extra: ClientExtra {
                vendor: "Google Inc.",
                app_version,
            },
        }
    }
}

fn random_hash() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}
