//! Pattern extraction shared by several hosts.

use std::sync::LazyLock;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

/// Standard alphabet, padding optional.
pub const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// URL-safe alphabet, padding optional.
pub const BASE64URL_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

// Ordered: the first absolute match wins.
static SOURCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"file:\s*"([^"]+\.(?:m3u8|mp4)[^"]*)""#,
        r#"source:\s*"([^"]+\.(?:m3u8|mp4)[^"]*)""#,
        r#"src:\s*"([^"]+\.(?:m3u8|mp4)[^"]*)""#,
        r#"sources:\s*\[\s*\{[^}]*src:\s*"([^"]+)""#,
        r#"sources:\s*\["([^"]+)"\]"#,
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static SOURCES_ARRAY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"sources:\s*\[\s*"([^"]+)""#).ok());

/// Find a player source URL in page markup or unpacked script.
pub fn find_source(text: &str) -> Option<String> {
    SOURCE_PATTERNS.iter().find_map(|re| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|url| url.starts_with("http"))
            .map(str::to_string)
    })
}

/// First element of a `sources: ["…", …]` array literal, if absolute.
pub fn first_array_source(text: &str) -> Option<String> {
    let re = SOURCES_ARRAY.as_ref()?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|url| url.starts_with("http"))
        .map(str::to_string)
}

/// First capture group of `re` in `text`.
pub fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

pub fn rot13(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'a'..='z' => (((c as u8 - b'a') + 13) % 26 + b'a') as char,
            'A'..='Z' => (((c as u8 - b'A') + 13) % 26 + b'A') as char,
            _ => c,
        })
        .collect()
}

pub fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_jwplayer_file() {
        let js = r#"jwplayer("v").setup({file:"https://cdn.example/hls/master.m3u8?t=1",image:"x.jpg"})"#;
        assert_eq!(
            find_source(js).as_deref(),
            Some("https://cdn.example/hls/master.m3u8?t=1")
        );
    }

    #[test]
    fn pattern_order_prefers_file_over_sources() {
        let js = r#"sources:["https://a.example/1.mp4"]; file: "https://b.example/2.mp4""#;
        assert_eq!(find_source(js).as_deref(), Some("https://b.example/2.mp4"));
    }

    #[test]
    fn finds_object_sources_src() {
        let js = r#"sources: [{type:"video/mp4", src:"https://c.example/v"}]"#;
        assert_eq!(find_source(js).as_deref(), Some("https://c.example/v"));
    }

    #[test]
    fn relative_sources_are_ignored() {
        assert_eq!(find_source(r#"file:"/videos/a.mp4""#), None);
        assert_eq!(first_array_source(r#"sources: ["/v.mp4"]"#), None);
    }

    #[test]
    fn first_array_element_is_taken() {
        let js = r#"sources: ["https://m.example/v.mp4", "https://n.example/w.mp4"]"#;
        assert_eq!(
            first_array_source(js).as_deref(),
            Some("https://m.example/v.mp4")
        );
    }

    #[test]
    fn rot13_is_an_involution() {
        assert_eq!(rot13("Hello, World!"), "Uryyb, Jbeyq!");
        assert_eq!(rot13(&rot13("aZ09+/=")), "aZ09+/=");
    }

    #[test]
    fn lenient_engines_accept_missing_padding() {
        use base64::Engine as _;
        assert_eq!(BASE64_LENIENT.decode("aGk").unwrap(), b"hi");
        assert_eq!(BASE64_LENIENT.decode("aGk=").unwrap(), b"hi");
        assert_eq!(BASE64URL_LENIENT.decode("_-8").unwrap(), [0xff, 0xef]);
    }

    #[test]
    fn random_suffix_shape() {
        let s = random_alphanumeric(10);
        assert_eq!(s.len(), 10);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
