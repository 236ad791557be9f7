//! Unpacker for the `eval(function(p,a,c,k,e,d){…})` minifier format.
//!
//! The packed payload replaces every keyword with its dictionary index
//! written in base `a`. Unpacking substitutes the keywords back, from the
//! highest index down, matching whole words only.

use std::sync::LazyLock;

use regex::Regex;

const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

static PACKED: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?s)eval\(function\(p,a,c,k,e,d\)\{.*?\}\('(.*?)',\s*(\d+),\s*(\d+),\s*'([^']+)'\.split\('\|'\)",
    )
    .ok()
});

/// Encode `value` in `base` using the packer's digit alphabet. Digits past
/// the alphabet encode as nothing.
fn base_encode(value: usize, base: usize) -> String {
    let digit = |v: usize| DIGITS.get(v).map(|&b| char::from(b));
    if value < base {
        return digit(value).map(String::from).unwrap_or_default();
    }
    let mut out = base_encode(value / base, base);
    if let Some(c) = digit(value % base) {
        out.push(c);
    }
    out
}

/// Locate and unpack the first packed block in `html`.
pub fn unpack(html: &str) -> Option<String> {
    let caps = PACKED.as_ref()?.captures(html)?;
    let payload = caps.get(1)?.as_str();
    let base: usize = caps.get(2)?.as_str().parse().ok()?;
    let count: usize = caps.get(3)?.as_str().parse().ok()?;
    let keywords: Vec<&str> = caps.get(4)?.as_str().split('|').collect();

    if base == 0 {
        return None;
    }

    let mut unpacked = payload.to_string();
    // Only indices with a dictionary entry can be substituted.
    for index in (0..count.min(keywords.len())).rev() {
        let Some(word) = keywords.get(index).filter(|w| !w.is_empty()) else {
            continue;
        };
        let mut token = base_encode(index, base);
        if token.is_empty() {
            token.push('0');
        }
        let Ok(re) = Regex::new(&format!(r"\b{}\b", regex::escape(&token))) else {
            continue;
        };
        unpacked = re.replace_all(&unpacked, regex::NoExpand(word)).into_owned();
    }

    Some(unpacked)
}
